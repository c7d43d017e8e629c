//! Transport abstraction for provider HTTP exchanges.
//!
//! Adapters never talk to the network directly. They describe a POST as a
//! [`RequestContext`] plus a [`RequestBody`] and hand it to a [`Transport`],
//! which returns the raw [`TransportResponse`]. Status interpretation stays in
//! the adapters, so a transport reports a `500` as a normal response rather
//! than as an error.
//!
//! [`HttpTransport`] is the reqwest-backed implementation used in production.
//! Any other type implementing [`Transport`] can be injected instead, which is
//! how the integration tests script provider behavior.
//!
//! # Examples
//!
//! ```rust,no_run
//! use unified_payments::transport::{HttpTransport, RequestBody, RequestContext, Transport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new()?;
//!
//! let ctx = RequestContext {
//!     url: "https://sandbox.aamarpay.com/jsonpost.php",
//!     headers: vec![("Accept", "application/json")],
//! };
//! let body = RequestBody::json(&serde_json::json!({ "tran_id": "TXN1" }))?;
//!
//! let response = transport.post(ctx, body).await?;
//! println!("Status: {}", response.status);
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

pub mod config;
pub mod http;

pub use config::HttpConfig;
pub use http::HttpTransport;

/// Request context for a provider call.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    /// Absolute endpoint URL.
    pub url: &'a str,
    /// Additional HTTP headers. `Content-Type` is derived from the body.
    pub headers: Vec<(&'a str, &'a str)>,
}

/// Encoded request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// `application/json` payload.
    Json(Vec<u8>),
    /// `application/x-www-form-urlencoded` payload.
    FormUrlEncoded(String),
}

impl RequestBody {
    /// Serializes `value` as a JSON body.
    ///
    /// # Errors
    ///
    /// Returns error if `value` cannot be represented as JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_vec(value).map(Self::Json)
    }

    /// Returns the `Content-Type` header value for this body.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Json(_) => "application/json",
            Self::FormUrlEncoded(_) => "application/x-www-form-urlencoded",
        }
    }

    /// Returns the encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Json(bytes) => bytes,
            Self::FormUrlEncoded(form) => form.as_bytes(),
        }
    }
}

/// Raw response from a transport.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body bytes.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Failure to deliver a request or to read its response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The exchange did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established or was interrupted.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request was rejected before being sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Any other HTTP client failure.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}

/// Injected HTTP exchange.
///
/// Implementations must be cheap to share; adapters hold them behind an
/// `Arc` and may call [`post`](Self::post) from many tasks at once.
pub trait Transport: Send + Sync {
    /// Executes a POST request and returns the response whatever its status.
    ///
    /// # Errors
    ///
    /// Returns error only if no response could be obtained.
    fn post(
        &self,
        ctx: RequestContext<'_>,
        body: RequestBody,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}
