//! SSLCommerz adapter.
//!
//! Session initiation goes through [`SslCommerzClient`], a thin client for the
//! hosted-checkout API: it adds the store credentials, form-encodes the
//! session data and posts it to `gwprocess/v4/api.php`.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    config::SslCommerzConfig,
    error::{Action, PaymentError, Result, UpstreamError},
    gateways::{GatewayName, PaymentGateway, post_json, redirect_url},
    model::PaymentRequest,
    transport::{RequestBody, RequestContext, Transport},
};

/// Live API host.
pub const LIVE_BASE_URL: &str = "https://securepay.sslcommerz.com";

/// Sandbox API host.
pub const SANDBOX_BASE_URL: &str = "https://sandbox.sslcommerz.com";

const INIT_PATH: &str = "/gwprocess/v4/api.php";

const DEFAULT_PRODUCT_CATEGORY: &str = "default";
const PRODUCT_PROFILE: &str = "default";
const SHIPPING_METHOD: &str = "NO";

/// SSLCommerz session data, without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SslCommerzSessionRequest<'a> {
    /// Amount.
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    /// Currency code.
    pub currency: &'a str,
    /// Transaction id.
    pub tran_id: &'a str,
    /// Success redirect.
    pub success_url: &'a str,
    /// Failure redirect.
    pub fail_url: &'a str,
    /// Cancel redirect.
    pub cancel_url: &'a str,
    /// IPN endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipn_url: Option<&'a str>,
    /// Product name.
    pub product_name: &'a str,
    /// Product category, `"default"` if the request has none.
    pub product_category: &'a str,
    /// Always `"default"`.
    pub product_profile: &'static str,
    /// Customer name.
    pub cus_name: &'a str,
    /// Customer email.
    pub cus_email: &'a str,
    /// Customer phone.
    pub cus_phone: &'a str,
    /// Address line 1.
    pub cus_add1: &'a str,
    /// Address line 2.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cus_add2: Option<&'a str>,
    /// City.
    pub cus_city: &'a str,
    /// State.
    pub cus_state: &'a str,
    /// Postal code.
    pub cus_postcode: &'a str,
    /// Country.
    pub cus_country: &'a str,
    /// Always `"NO"`.
    pub shipping_method: &'static str,
}

impl<'a> SslCommerzSessionRequest<'a> {
    /// Maps a unified request onto the SSLCommerz field set.
    #[must_use]
    pub fn from_request(request: &'a PaymentRequest) -> Self {
        let customer = &request.customer;
        let address = &customer.address;

        Self {
            total_amount: request.amount,
            currency: &request.currency,
            tran_id: &request.transaction_id,
            success_url: &request.urls.success,
            fail_url: &request.urls.fail,
            cancel_url: &request.urls.cancel,
            ipn_url: request.urls.ipn.as_deref(),
            product_name: &request.product.name,
            product_category: request
                .product
                .category
                .as_deref()
                .filter(|category| !category.is_empty())
                .unwrap_or(DEFAULT_PRODUCT_CATEGORY),
            product_profile: PRODUCT_PROFILE,
            cus_name: &customer.name,
            cus_email: &customer.email,
            cus_phone: &customer.phone,
            cus_add1: &address.line1,
            cus_add2: address.line2.as_deref(),
            cus_city: &address.city,
            cus_state: &address.state,
            cus_postcode: &address.postcode,
            cus_country: &address.country,
            shipping_method: SHIPPING_METHOD,
        }
    }
}

/// Session initiation response.
///
/// Only the fields this crate reads are typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SslCommerzInitResponse {
    /// `SUCCESS` or `FAILED`.
    #[serde(default)]
    pub status: Option<String>,
    /// Reason given when `status` is `FAILED`.
    #[serde(default, rename = "failedreason")]
    pub failed_reason: Option<String>,
    /// Hosted checkout page.
    #[serde(default, rename = "GatewayPageURL")]
    pub gateway_page_url: Option<String>,
}

#[derive(Serialize)]
struct StoreCredentials<'a> {
    store_id: &'a str,
    store_passwd: &'a str,
}

/// Client for the SSLCommerz session API.
#[derive(Debug)]
pub struct SslCommerzClient<T> {
    store_id: String,
    store_password: String,
    init_url: String,
    transport: Arc<T>,
}

impl<T> SslCommerzClient<T> {
    /// Creates a client for the store in `config`.
    ///
    /// `test_mode` selects the sandbox host unless `base_url` overrides it.
    #[must_use]
    pub fn new(config: &SslCommerzConfig, transport: Arc<T>) -> Self {
        let base = config.base_url.as_deref().unwrap_or(if config.test_mode {
            SANDBOX_BASE_URL
        } else {
            LIVE_BASE_URL
        });

        Self {
            store_id: config.store_id.clone(),
            store_password: config.store_password.clone(),
            init_url: format!("{}{INIT_PATH}", base.trim_end_matches('/')),
            transport,
        }
    }

    /// Returns the session endpoint.
    #[must_use]
    pub fn init_url(&self) -> &str {
        &self.init_url
    }

    /// Encodes credentials and session data as one form body.
    ///
    /// # Errors
    ///
    /// Returns error if a field cannot be form-encoded.
    pub fn encode(&self, data: &SslCommerzSessionRequest<'_>) -> std::result::Result<String, UpstreamError> {
        let credentials = serde_urlencoded::to_string(StoreCredentials {
            store_id: &self.store_id,
            store_passwd: &self.store_password,
        })?;
        let session = serde_urlencoded::to_string(data)?;

        Ok(format!("{credentials}&{session}"))
    }
}

impl<T: Transport> SslCommerzClient<T> {
    /// Initiates a hosted checkout session.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, non-2xx status or an undecodable
    /// body.
    pub async fn init(
        &self,
        data: &SslCommerzSessionRequest<'_>,
    ) -> std::result::Result<SslCommerzInitResponse, UpstreamError> {
        let body = RequestBody::FormUrlEncoded(self.encode(data)?);
        let ctx = RequestContext { url: &self.init_url, headers: vec![] };

        let response: SslCommerzInitResponse = post_json(self.transport.as_ref(), ctx, body).await?;

        if let Some(reason) = response.failed_reason.as_deref()
            && !reason.is_empty()
        {
            warn!(status = response.status.as_deref(), reason, "sslcommerz declined session");
        }

        Ok(response)
    }
}

/// SSLCommerz adapter.
#[derive(Debug)]
pub struct SslCommerzGateway<T> {
    client: SslCommerzClient<T>,
}

impl<T> SslCommerzGateway<T> {
    /// Creates the adapter. Performs no I/O.
    #[must_use]
    pub fn new(config: &SslCommerzConfig, transport: Arc<T>) -> Self {
        Self { client: SslCommerzClient::new(config, transport) }
    }
}

impl<T: Transport> PaymentGateway for SslCommerzGateway<T> {
    fn name(&self) -> GatewayName {
        GatewayName::SslCommerz
    }

    #[instrument(
        skip(self, request),
        fields(gateway = "sslcommerz", transaction_id = %request.transaction_id)
    )]
    async fn process_payment(&self, request: &PaymentRequest) -> Result<String> {
        let data = SslCommerzSessionRequest::from_request(request);

        let response = self
            .client
            .init(&data)
            .await
            .map_err(|source| PaymentError::gateway(GatewayName::SslCommerz, Action::Process, source))?;

        let url = redirect_url(GatewayName::SslCommerz, response.gateway_page_url)?;
        info!("sslcommerz session created");
        Ok(url)
    }
}
