//! Gateway capability contract and provider adapters.
//!
//! Every provider adapter implements [`PaymentGateway`]: it turns a
//! [`PaymentRequest`] into the URL of the provider's hosted checkout page.
//! The set of providers is closed; [`Gateway`] is the variant type the
//! registry stores.
//!
//! | Provider | Adapter | Redirect field |
//! |----------|---------|----------------|
//! | aamarPay | [`AamarPayGateway`] | `payment_url` |
//! | SSLCommerz | [`SslCommerzGateway`] | `GatewayPageURL` |
//! | bKash | [`BkashGateway`] | `bkashURL` |

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;
use std::{fmt, str::FromStr};

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::{
    error::{PaymentError, Result, UpstreamError},
    model::PaymentRequest,
    transport::{RequestBody, RequestContext, Transport},
};

pub mod aamarpay;
pub mod bkash;
pub mod sslcommerz;

#[cfg(test)]
#[path = "tests/proptest_mapping.rs"]
mod proptest_mapping;

pub use aamarpay::AamarPayGateway;
pub use bkash::BkashGateway;
pub use sslcommerz::SslCommerzGateway;

/// Provider identifier.
///
/// The string form (`"aamarpay"`, `"sslcommerz"`, `"bkash"`) is what callers
/// put in [`PaymentRequest::gateway`] and what configuration sections are
/// named after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GatewayName {
    /// aamarPay JSON checkout.
    AamarPay,
    /// SSLCommerz hosted checkout.
    SslCommerz,
    /// bKash tokenized checkout.
    Bkash,
}

impl GatewayName {
    /// All providers, in a stable order.
    pub const ALL: [Self; 3] = [Self::AamarPay, Self::SslCommerz, Self::Bkash];

    /// Returns the identifier used in configuration and requests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AamarPay => "aamarpay",
            Self::SslCommerz => "sslcommerz",
            Self::Bkash => "bkash",
        }
    }

    /// Returns the provider name used in error messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::AamarPay => "Aamarpay",
            Self::SslCommerz => "SSL Commerz",
            Self::Bkash => "bKash",
        }
    }
}

impl fmt::Display for GatewayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayName {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| PaymentError::UnsupportedGateway(s.to_owned()))
    }
}

/// Capability every provider adapter satisfies.
///
/// Implementations perform all provider I/O inside
/// [`process_payment`](Self::process_payment) and normalize every failure into
/// a [`PaymentError`].
pub trait PaymentGateway: Send + Sync {
    /// Returns the provider this adapter talks to.
    fn name(&self) -> GatewayName;

    /// Creates a hosted checkout session and returns its redirect URL.
    ///
    /// The URL is returned exactly as the provider sent it.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Gateway`] if the exchange fails,
    /// [`PaymentError::MissingRedirectUrl`] if the provider omits the URL, and
    /// [`PaymentError::AuthToken`] if a required session token cannot be
    /// obtained.
    fn process_payment(&self, request: &PaymentRequest) -> impl Future<Output = Result<String>> + Send;
}

/// A configured provider adapter.
#[derive(Debug)]
pub enum Gateway<T> {
    /// aamarPay adapter.
    AamarPay(AamarPayGateway<T>),
    /// SSLCommerz adapter.
    SslCommerz(SslCommerzGateway<T>),
    /// bKash adapter.
    Bkash(BkashGateway<T>),
}

impl<T> Gateway<T> {
    /// Returns the bKash adapter, which also exposes execute and query.
    #[must_use]
    pub const fn as_bkash(&self) -> Option<&BkashGateway<T>> {
        match self {
            Self::Bkash(gateway) => Some(gateway),
            _ => None,
        }
    }
}

impl<T: Transport> PaymentGateway for Gateway<T> {
    fn name(&self) -> GatewayName {
        match self {
            Self::AamarPay(gateway) => gateway.name(),
            Self::SslCommerz(gateway) => gateway.name(),
            Self::Bkash(gateway) => gateway.name(),
        }
    }

    async fn process_payment(&self, request: &PaymentRequest) -> Result<String> {
        match self {
            Self::AamarPay(gateway) => gateway.process_payment(request).await,
            Self::SslCommerz(gateway) => gateway.process_payment(request).await,
            Self::Bkash(gateway) => gateway.process_payment(request).await,
        }
    }
}

/// Posts `body` and decodes a successful JSON response.
///
/// A non-2xx status is reported before the body is looked at.
pub(crate) async fn post_json<T, R>(
    transport: &T,
    ctx: RequestContext<'_>,
    body: RequestBody,
) -> std::result::Result<R, UpstreamError>
where
    T: Transport,
    R: DeserializeOwned,
{
    let url = ctx.url;
    let response = transport.post(ctx, body).await?;

    if !response.is_success() {
        warn!(status = response.status, url, "provider returned non-success status");
        return Err(UpstreamError::HttpStatus(response.status));
    }

    Ok(response.json()?)
}

/// Returns the redirect URL if the provider sent a non-empty one.
pub(crate) fn redirect_url(gateway: GatewayName, field: Option<String>) -> Result<String> {
    field
        .filter(|url| !url.is_empty())
        .ok_or(PaymentError::MissingRedirectUrl { gateway })
}
