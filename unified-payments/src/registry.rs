//! Gateway registry and dispatcher.
//!
//! [`GatewayRegistry::build`] constructs exactly the adapters whose section is
//! present in the [`GatewayConfig`] and returns once all of them exist, so a
//! registry is never observed half-initialized. After construction the
//! registry is read-only and can be shared freely between tasks.
//!
//! # Examples
//!
//! ```
//! use unified_payments::{GatewayConfig, GatewayRegistry};
//!
//! let config = GatewayConfig::from_toml(
//!     r#"
//!     [aamarpay]
//!     store_id = "aamarpaytest"
//!     signature_key = "dbb74894e82415a2f7ff0ec3a97e4183"
//!     server_url = "https://sandbox.aamarpay.com/jsonpost.php"
//!     "#,
//! )
//! .unwrap();
//!
//! let registry = GatewayRegistry::from_config(config).unwrap();
//! assert!(registry.is_configured("aamarpay"));
//! assert!(registry.gateway("bkash").is_err());
//! ```

use std::{collections::HashMap, sync::Arc};

use tracing::{debug, info, instrument};

use crate::{
    config::GatewayConfig,
    error::{PaymentError, Result},
    gateways::{
        AamarPayGateway, BkashGateway, Gateway, GatewayName, PaymentGateway, SslCommerzGateway,
    },
    model::PaymentRequest,
    transport::{HttpTransport, Transport},
};

/// Configured adapters, keyed by provider.
#[derive(Debug)]
pub struct GatewayRegistry<T> {
    gateways: HashMap<GatewayName, Gateway<T>>,
}

impl<T> GatewayRegistry<T> {
    /// Builds every configured adapter over a shared transport.
    ///
    /// No network I/O happens here; bKash grants its token on first use.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Initialization`] if the configuration is
    /// invalid.
    pub fn build(config: GatewayConfig, transport: Arc<T>) -> Result<Self> {
        config.validate()?;

        let mut gateways = HashMap::new();

        if let Some(aamarpay) = config.aamarpay {
            gateways.insert(
                GatewayName::AamarPay,
                Gateway::AamarPay(AamarPayGateway::new(aamarpay, Arc::clone(&transport))),
            );
        }
        if let Some(sslcommerz) = config.sslcommerz {
            gateways.insert(
                GatewayName::SslCommerz,
                Gateway::SslCommerz(SslCommerzGateway::new(&sslcommerz, Arc::clone(&transport))),
            );
        }
        if let Some(bkash) = config.bkash {
            gateways.insert(GatewayName::Bkash, Gateway::Bkash(BkashGateway::new(bkash, transport)));
        }

        let registry = Self { gateways };
        info!(gateways = ?registry.configured(), "payment gateways initialized");
        Ok(registry)
    }

    /// Returns the adapter registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::NotConfigured`] (400) if `name` is unknown or
    /// its section was absent.
    pub fn gateway(&self, name: &str) -> Result<&Gateway<T>> {
        name.parse::<GatewayName>()
            .ok()
            .and_then(|parsed| self.gateways.get(&parsed))
            .ok_or_else(|| PaymentError::NotConfigured(name.to_owned()))
    }

    /// Returns the bKash adapter for execute and query calls.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::NotConfigured`] if bKash was not configured.
    pub fn bkash(&self) -> Result<&BkashGateway<T>> {
        self.gateways
            .get(&GatewayName::Bkash)
            .and_then(Gateway::as_bkash)
            .ok_or_else(|| PaymentError::NotConfigured(GatewayName::Bkash.as_str().to_owned()))
    }

    /// Returns the configured providers, in a stable order.
    #[must_use]
    pub fn configured(&self) -> Vec<GatewayName> {
        GatewayName::ALL.into_iter().filter(|name| self.gateways.contains_key(name)).collect()
    }

    /// Returns true if `name` is a configured provider.
    #[must_use]
    pub fn is_configured(&self, name: &str) -> bool {
        self.gateway(name).is_ok()
    }
}

impl<T: Transport> GatewayRegistry<T> {
    /// Routes `request` to the adapter named in its `gateway` field.
    ///
    /// Errors raised by the adapter are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::GatewayNotSpecified`] if the field is absent or
    /// empty, [`PaymentError::UnsupportedGateway`] if it names an unknown or
    /// unconfigured provider, and otherwise whatever the adapter returns.
    #[instrument(skip(self, request), fields(gateway = request.gateway.as_deref()))]
    pub async fn process_payment(&self, request: &PaymentRequest) -> Result<String> {
        let name = request
            .gateway
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or(PaymentError::GatewayNotSpecified)?;

        let gateway = name
            .parse::<GatewayName>()
            .ok()
            .and_then(|parsed| self.gateways.get(&parsed))
            .ok_or_else(|| PaymentError::UnsupportedGateway(name.to_owned()))?;

        debug!(transaction_id = %request.transaction_id, "dispatching payment");
        gateway.process_payment(request).await
    }
}

impl GatewayRegistry<HttpTransport> {
    /// Builds the registry over a reqwest transport configured from
    /// `config.http`.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Initialization`] if the configuration is
    /// invalid or the HTTP client cannot be created.
    pub fn from_config(config: GatewayConfig) -> Result<Self> {
        config.http.validate()?;
        let transport = HttpTransport::with_config(&config.http)
            .map_err(|e| PaymentError::Initialization(format!("cannot create HTTP client: {e}")))?;
        Self::build(config, Arc::new(transport))
    }
}
