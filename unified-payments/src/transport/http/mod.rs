//! HTTP transport implementation.
//!
//! This module provides the production [`Transport`] backed by a pooled
//! reqwest client with bounded request and connect timeouts.

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::config::HttpConfig;
use crate::transport::{RequestBody, RequestContext, Transport, TransportError, TransportResponse};

/// Validates that the endpoint is an absolute HTTP(S) URL.
fn validate_url(raw: &str) -> Result<Url, TransportError> {
    let url = Url::parse(raw)
        .map_err(|e| TransportError::InvalidRequest(format!("invalid URL '{raw}': {e}")))?;

    match url.scheme() {
        "https" | "http" => Ok(url),
        other => Err(TransportError::InvalidRequest(format!("unsupported URL scheme: {other}"))),
    }
}

/// Validates header name and value for CRLF injection prevention.
fn validate_header(name: &str, value: &str) -> Result<(), TransportError> {
    if name.contains('\r') || name.contains('\n') || name.contains('\0') {
        return Err(TransportError::InvalidRequest(
            "Invalid header name: control characters not allowed".to_owned(),
        ));
    }
    if value.contains('\r') || value.contains('\n') || value.contains('\0') {
        return Err(TransportError::InvalidRequest(
            "Invalid header value: control characters not allowed".to_owned(),
        ));
    }
    Ok(())
}

/// Reqwest-backed transport.
///
/// Supports connection pooling and keep-alive. Every request is bounded by the
/// configured timeout; dropping the returned future cancels the exchange.
///
/// # Examples
///
/// ```
/// use unified_payments::transport::{HttpConfig, HttpTransport};
///
/// let config = HttpConfig { timeout_secs: 15, ..HttpConfig::default() };
/// let transport = HttpTransport::with_config(&config).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a new HTTP transport with default settings.
    ///
    /// Default configuration:
    /// - Pool max idle per host: 10
    /// - Timeout: 30 seconds
    /// - Connect timeout: 10 seconds
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(&HttpConfig::default())
    }

    /// Creates HTTP transport with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails.
    pub fn with_config(config: &HttpConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(TransportError::Http)?;

        Ok(Self { client })
    }

    /// Wraps an existing client, keeping its settings.
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    #[instrument(skip(self, ctx, body), fields(url = ctx.url, content_type = body.content_type()))]
    async fn post(
        &self,
        ctx: RequestContext<'_>,
        body: RequestBody,
    ) -> Result<TransportResponse, TransportError> {
        let url = validate_url(ctx.url)?;

        for (key, value) in &ctx.headers {
            validate_header(key, value)?;
        }

        let mut request = self.client.post(url).header("Content-Type", body.content_type());

        for (key, value) in ctx.headers {
            request = request.header(key, value);
        }

        let request = match body {
            RequestBody::Json(bytes) => request.body(bytes),
            RequestBody::FormUrlEncoded(form) => request.body(form),
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        debug!(status, bytes = body.len(), "provider responded");

        Ok(TransportResponse { status, body })
    }
}
