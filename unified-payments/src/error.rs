//! Error types for the unified payment layer.
//!
//! Every failure produced by an adapter or by the registry is normalized into
//! [`PaymentError`] before it crosses the public boundary. Each variant maps to
//! a numeric classification code (see [`PaymentError::code`]) so callers can
//! forward it as an HTTP-like status without inspecting provider details.
//!
//! # Error Categories
//!
//! - **Configuration** (400): [`PaymentError::NotConfigured`],
//!   [`PaymentError::GatewayNotSpecified`], [`PaymentError::UnsupportedGateway`]
//! - **Transport** (500): [`PaymentError::Gateway`] wrapping an [`UpstreamError`]
//! - **Contract violation** (500): [`PaymentError::MissingRedirectUrl`]
//! - **Authentication** (500): [`PaymentError::AuthToken`]
//! - **Business failure** (400): [`PaymentError::ExecutionFailed`]
//! - **Initialization** (500): [`PaymentError::Initialization`]
//!
//! # Examples
//!
//! ```
//! use unified_payments::error::PaymentError;
//!
//! let err = PaymentError::NotConfigured("bkash".to_owned());
//! assert_eq!(err.code(), 400);
//! assert_eq!(err.to_string(), "Payment gateway bkash is not configured");
//! ```

use std::fmt;

use thiserror::Error;

use crate::{gateways::GatewayName, transport::TransportError};

/// Result type alias for payment operations.
pub type Result<T> = std::result::Result<T, PaymentError>;

/// The single error shape surfaced to callers.
///
/// Errors raised deeper in an adapter are never wrapped a second time: an
/// adapter either produces one of these variants directly, or wraps a raw
/// [`UpstreamError`] exactly once into [`PaymentError::Gateway`] or
/// [`PaymentError::AuthToken`].
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum PaymentError {
    /// A gateway was requested by name but is absent from the registry.
    #[error("Payment gateway {0} is not configured")]
    NotConfigured(String),

    /// A dispatched request did not name its target gateway.
    #[error("Payment gateway not specified")]
    GatewayNotSpecified,

    /// A dispatched request named a gateway the registry does not serve.
    #[error("Unsupported payment gateway: {0}")]
    UnsupportedGateway(String),

    /// The provider exchange failed before a usable response was obtained.
    ///
    /// Covers network failures, non-2xx statuses and undecodable bodies. The
    /// original cause is kept as the diagnostic payload.
    #[error("Failed to {action} {} payment: {source}", .gateway.display_name())]
    Gateway {
        /// Provider that failed.
        gateway: GatewayName,
        /// Operation that was being performed.
        action: Action,
        /// Underlying cause.
        #[source]
        source: UpstreamError,
    },

    /// The provider answered successfully but without a redirect URL.
    #[error("{} session was not successful. No payment URL returned.", .gateway.display_name())]
    MissingRedirectUrl {
        /// Provider that omitted the field.
        gateway: GatewayName,
    },

    /// The session token required by the provider could not be obtained.
    #[error("Failed to get {} auth token: {source}", .gateway.display_name())]
    AuthToken {
        /// Provider that refused the grant.
        gateway: GatewayName,
        /// Underlying cause.
        #[source]
        source: UpstreamError,
    },

    /// The provider reported a business-level failure while finalizing.
    #[error("bKash payment execution failed: {status_message}")]
    ExecutionFailed {
        /// Provider status code (anything other than the success sentinel).
        status_code: String,
        /// Provider status message, or `"Unknown error"` when absent.
        status_message: String,
    },

    /// Configuration was rejected or an adapter could not be constructed.
    #[error("Failed to initialize payment gateways: {0}")]
    Initialization(String),
}

impl PaymentError {
    /// Returns the numeric classification code of this error.
    ///
    /// Caller mistakes and provider-declined executions are `400`; every
    /// transport, contract or initialization failure is `500`.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::NotConfigured(_)
            | Self::GatewayNotSpecified
            | Self::UnsupportedGateway(_)
            | Self::ExecutionFailed { .. } => 400,
            Self::Gateway { .. }
            | Self::MissingRedirectUrl { .. }
            | Self::AuthToken { .. }
            | Self::Initialization(_) => 500,
        }
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Returns the wrapped upstream failure, if this error carries one.
    #[must_use]
    pub const fn data(&self) -> Option<&UpstreamError> {
        match self {
            Self::Gateway { source, .. } | Self::AuthToken { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns true if repeating the same call later may succeed.
    ///
    /// Nothing in this crate retries; the flag only tells the caller whether a
    /// retry of its own is meaningful.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::AuthToken { .. } => true,
            Self::Gateway { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    pub(crate) fn gateway(gateway: GatewayName, action: Action, source: UpstreamError) -> Self {
        Self::Gateway { gateway, action, source }
    }
}

/// Operation being performed when a [`PaymentError::Gateway`] was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Creating a hosted checkout session.
    Process,
    /// Finalizing a payment after the payer returned.
    Execute,
    /// Querying the status of a payment.
    Query,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Process => "process",
            Self::Execute => "execute",
            Self::Query => "query",
        })
    }
}

/// Raw failure observed while talking to a provider.
///
/// These never reach callers on their own; they are always carried inside a
/// [`PaymentError`].
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The provider answered with a non-success status.
    #[error("HTTP error! status: {0}")]
    HttpStatus(u16),

    /// The request could not be delivered.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body was not the expected JSON.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request body could not be form-encoded.
    #[error("invalid request body: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),

    /// The token grant succeeded but carried no token.
    #[error("No token received from bKash")]
    MissingToken,
}

impl UpstreamError {
    /// Returns true for failures that depend on network or provider state.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::HttpStatus(status) => *status >= 500 || *status == 408 || *status == 429,
            Self::Transport(_) => true,
            Self::Decode(_) | Self::Encode(_) | Self::MissingToken => false,
        }
    }
}
