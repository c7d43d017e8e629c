//! Gateway configuration.
//!
//! One optional section per provider; a provider whose section is absent is
//! simply not constructed by the registry. Configuration can be built in code
//! or loaded from TOML:
//!
//! ```toml
//! [aamarpay]
//! store_id = "aamarpaytest"
//! signature_key = "dbb74894e82415a2f7ff0ec3a97e4183"
//! server_url = "https://sandbox.aamarpay.com/jsonpost.php"
//!
//! [sslcommerz]
//! store_id = "testbox"
//! store_password = "qwerty"
//! test_mode = true
//!
//! [bkash]
//! username = "sandboxTokenizedUser02"
//! password = "sandboxTokenizedUser02@12345"
//! app_key = "4f6o0cjiki2rfm34kfdadl1eqq"
//! app_secret = "2is7hdktrekvrbljjh44ll3d9l1dtjo4pasmjvs5vl5qr3fug4b"
//! sandbox = true
//!
//! [http]
//! timeout_secs = 20
//! ```
//!
//! Secrets never appear in `Debug` output.

use std::{fmt, path::Path};

use serde::Deserialize;
use url::Url;

use crate::{
    error::{PaymentError, Result},
    gateways::bkash::token::REFRESH_MARGIN,
    transport::HttpConfig,
};

const REDACTED: &str = "[REDACTED]";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// aamarPay credentials.
    #[serde(default)]
    pub aamarpay: Option<AamarPayConfig>,
    /// SSLCommerz credentials.
    #[serde(default)]
    pub sslcommerz: Option<SslCommerzConfig>,
    /// bKash credentials.
    #[serde(default)]
    pub bkash: Option<BkashConfig>,
    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

impl GatewayConfig {
    /// Parses and validates TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Initialization`] if parsing or validation
    /// fails.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| PaymentError::Initialization(format!("invalid TOML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Initialization`] if the file cannot be read or
    /// its contents are invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| PaymentError::Initialization(format!("cannot read config file: {e}")))?;
        Self::from_toml(&content)
    }

    /// Checks every present section.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Initialization`] naming the first invalid
    /// field.
    pub fn validate(&self) -> Result<()> {
        if let Some(aamarpay) = &self.aamarpay {
            aamarpay.validate()?;
        }
        if let Some(sslcommerz) = &self.sslcommerz {
            sslcommerz.validate()?;
        }
        if let Some(bkash) = &self.bkash {
            bkash.validate()?;
        }
        self.http.validate()
    }
}

/// aamarPay merchant settings.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AamarPayConfig {
    /// Store id.
    pub store_id: String,
    /// Signature key.
    pub signature_key: String,
    /// Full JSON checkout endpoint, e.g. `https://sandbox.aamarpay.com/jsonpost.php`.
    pub server_url: String,
}

impl AamarPayConfig {
    /// Validates the section.
    ///
    /// # Errors
    ///
    /// Returns error if a credential is empty or `server_url` is not an
    /// absolute HTTP(S) URL.
    pub fn validate(&self) -> Result<()> {
        require("aamarpay.store_id", &self.store_id)?;
        require("aamarpay.signature_key", &self.signature_key)?;
        validate_url("aamarpay.server_url", &self.server_url)
    }
}

impl fmt::Debug for AamarPayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AamarPayConfig")
            .field("store_id", &self.store_id)
            .field("signature_key", &REDACTED)
            .field("server_url", &self.server_url)
            .finish()
    }
}

/// SSLCommerz store settings.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SslCommerzConfig {
    /// Store id.
    pub store_id: String,
    /// Store password.
    pub store_password: String,
    /// Use the sandbox host.
    #[serde(default)]
    pub test_mode: bool,
    /// Overrides the API host.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl SslCommerzConfig {
    /// Validates the section.
    ///
    /// # Errors
    ///
    /// Returns error if a credential is empty or `base_url` is invalid.
    pub fn validate(&self) -> Result<()> {
        require("sslcommerz.store_id", &self.store_id)?;
        require("sslcommerz.store_password", &self.store_password)?;
        if let Some(base_url) = &self.base_url {
            validate_url("sslcommerz.base_url", base_url)?;
        }
        Ok(())
    }
}

impl fmt::Debug for SslCommerzConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SslCommerzConfig")
            .field("store_id", &self.store_id)
            .field("store_password", &REDACTED)
            .field("test_mode", &self.test_mode)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// bKash merchant settings.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BkashConfig {
    /// Grant username.
    pub username: String,
    /// Grant password.
    pub password: String,
    /// Application key, also sent as `X-APP-Key`.
    pub app_key: String,
    /// Application secret.
    pub app_secret: String,
    /// Use the sandbox API.
    #[serde(default)]
    pub sandbox: bool,
    /// Overrides the API root.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Token lifetime assumed when the grant omits `expires_in`.
    #[serde(default)]
    pub token_ttl_secs: Option<u64>,
}

impl BkashConfig {
    /// Validates the section.
    ///
    /// # Errors
    ///
    /// Returns error if a credential is empty, `base_url` is invalid, or
    /// `token_ttl_secs` does not exceed the refresh margin.
    pub fn validate(&self) -> Result<()> {
        require("bkash.username", &self.username)?;
        require("bkash.password", &self.password)?;
        require("bkash.app_key", &self.app_key)?;
        require("bkash.app_secret", &self.app_secret)?;
        if let Some(base_url) = &self.base_url {
            validate_url("bkash.base_url", base_url)?;
        }
        if let Some(ttl) = self.token_ttl_secs
            && ttl <= REFRESH_MARGIN.as_secs()
        {
            return Err(PaymentError::Initialization(format!(
                "bkash.token_ttl_secs must be greater than {}",
                REFRESH_MARGIN.as_secs()
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for BkashConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BkashConfig")
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("app_key", &self.app_key)
            .field("app_secret", &REDACTED)
            .field("sandbox", &self.sandbox)
            .field("base_url", &self.base_url)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PaymentError::Initialization(format!("{field} must not be empty")));
    }
    Ok(())
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| PaymentError::Initialization(format!("invalid {field} '{value}': {e}")))?;

    match url.scheme() {
        "https" | "http" => Ok(()),
        other => Err(PaymentError::Initialization(format!(
            "{field} must use http or https, got: {other}"
        ))),
    }
}
