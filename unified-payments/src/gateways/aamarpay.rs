//! aamarPay adapter.
//!
//! One JSON POST to the configured `server_url` (e.g. `…/jsonpost.php`); the
//! response carries the hosted page in `payment_url`.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    config::AamarPayConfig,
    error::{Action, PaymentError, Result, UpstreamError},
    gateways::{GatewayName, PaymentGateway, post_json, redirect_url},
    model::PaymentRequest,
    transport::{RequestBody, RequestContext, Transport},
};

/// Value of the fixed `type` field.
const RESPONSE_TYPE: &str = "json";

/// aamarPay session request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AamarPaySessionRequest<'a> {
    /// Merchant store id.
    pub store_id: &'a str,
    /// Merchant signature key.
    pub signature_key: &'a str,
    /// Transaction id.
    pub tran_id: &'a str,
    /// Amount.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Currency code.
    pub currency: &'a str,
    /// Success redirect.
    pub success_url: &'a str,
    /// Failure redirect.
    pub fail_url: &'a str,
    /// Cancel redirect.
    pub cancel_url: &'a str,
    /// Product description.
    pub desc: &'a str,
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
    /// Always `"json"`.
    #[serde(rename = "type")]
    pub response_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct AamarPaySessionResponse {
    #[serde(default)]
    payment_url: Option<String>,
}

/// aamarPay adapter.
#[derive(Debug)]
pub struct AamarPayGateway<T> {
    config: AamarPayConfig,
    transport: Arc<T>,
}

impl<T> AamarPayGateway<T> {
    /// Creates the adapter. Performs no I/O.
    #[must_use]
    pub const fn new(config: AamarPayConfig, transport: Arc<T>) -> Self {
        Self { config, transport }
    }

    /// Maps a unified request onto the aamarPay wire schema.
    #[must_use]
    pub fn session_request<'a>(&'a self, request: &'a PaymentRequest) -> AamarPaySessionRequest<'a> {
        let customer = &request.customer;
        let address = &customer.address;

        AamarPaySessionRequest {
            store_id: &self.config.store_id,
            signature_key: &self.config.signature_key,
            tran_id: &request.transaction_id,
            amount: request.amount,
            currency: &request.currency,
            success_url: &request.urls.success,
            fail_url: &request.urls.fail,
            cancel_url: &request.urls.cancel,
            desc: &request.product.description,
            cus_name: &customer.name,
            cus_email: &customer.email,
            cus_phone: &customer.phone,
            cus_add1: &address.line1,
            cus_add2: address.line2.as_deref(),
            cus_city: &address.city,
            cus_state: &address.state,
            cus_postcode: &address.postcode,
            cus_country: &address.country,
            response_type: RESPONSE_TYPE,
        }
    }
}

impl<T: Transport> AamarPayGateway<T> {
    async fn create_session(&self, request: &PaymentRequest) -> std::result::Result<AamarPaySessionResponse, UpstreamError> {
        let body = RequestBody::json(&self.session_request(request))?;
        let ctx = RequestContext { url: &self.config.server_url, headers: vec![] };
        post_json(self.transport.as_ref(), ctx, body).await
    }
}

impl<T: Transport> PaymentGateway for AamarPayGateway<T> {
    fn name(&self) -> GatewayName {
        GatewayName::AamarPay
    }

    #[instrument(
        skip(self, request),
        fields(gateway = "aamarpay", transaction_id = %request.transaction_id)
    )]
    async fn process_payment(&self, request: &PaymentRequest) -> Result<String> {
        let response = self
            .create_session(request)
            .await
            .map_err(|source| PaymentError::gateway(GatewayName::AamarPay, Action::Process, source))?;

        let url = redirect_url(GatewayName::AamarPay, response.payment_url)?;
        info!("aamarpay session created");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        model::{Address, Customer, Product, RedirectUrls},
        transport::HttpTransport,
    };

    fn gateway() -> AamarPayGateway<HttpTransport> {
        let config = AamarPayConfig {
            store_id: "aamarpaytest".to_owned(),
            signature_key: "dbb74894e82415a2f7ff0ec3a97e4183".to_owned(),
            server_url: "https://sandbox.aamarpay.com/jsonpost.php".to_owned(),
        };
        AamarPayGateway::new(config, Arc::new(HttpTransport::new().unwrap()))
    }

    fn request() -> PaymentRequest {
        PaymentRequest {
            amount: Decimal::new(500, 0),
            currency: "BDT".to_owned(),
            transaction_id: "TXN1".to_owned(),
            urls: RedirectUrls {
                success: "https://shop.example/ok".to_owned(),
                fail: "https://shop.example/fail".to_owned(),
                cancel: "https://shop.example/cancel".to_owned(),
                callback: None,
                ipn: None,
            },
            product: Product { name: "Item".to_owned(), category: None, description: "d".to_owned() },
            customer: Customer {
                name: "A".to_owned(),
                email: "a@b.com".to_owned(),
                phone: "01700000000".to_owned(),
                address: Address {
                    line1: "Road 1".to_owned(),
                    line2: Some("Flat 2".to_owned()),
                    city: "Dhaka".to_owned(),
                    state: "Dhaka".to_owned(),
                    postcode: "1207".to_owned(),
                    country: "Bangladesh".to_owned(),
                },
            },
            gateway: None,
        }
    }

    #[test]
    fn test_session_request_field_table() {
        let gateway = gateway();
        let request = request();
        let value = serde_json::to_value(gateway.session_request(&request)).unwrap();

        assert_eq!(value["store_id"], "aamarpaytest");
        assert_eq!(value["signature_key"], "dbb74894e82415a2f7ff0ec3a97e4183");
        assert_eq!(value["tran_id"], "TXN1");
        assert_eq!(value["amount"], 500.0);
        assert_eq!(value["currency"], "BDT");
        assert_eq!(value["success_url"], "https://shop.example/ok");
        assert_eq!(value["fail_url"], "https://shop.example/fail");
        assert_eq!(value["cancel_url"], "https://shop.example/cancel");
        assert_eq!(value["desc"], "d");
        assert_eq!(value["cus_name"], "A");
        assert_eq!(value["cus_email"], "a@b.com");
        assert_eq!(value["cus_phone"], "01700000000");
        assert_eq!(value["cus_add1"], "Road 1");
        assert_eq!(value["cus_add2"], "Flat 2");
        assert_eq!(value["cus_city"], "Dhaka");
        assert_eq!(value["cus_state"], "Dhaka");
        assert_eq!(value["cus_postcode"], "1207");
        assert_eq!(value["cus_country"], "Bangladesh");
        assert_eq!(value["type"], "json");
    }

    #[test]
    fn test_session_request_omits_absent_line2() {
        let gateway = gateway();
        let mut request = request();
        request.customer.address.line2 = None;

        let value = serde_json::to_value(gateway.session_request(&request)).unwrap();
        assert!(value.get("cus_add2").is_none());
    }

    #[test]
    fn test_name() {
        assert_eq!(gateway().name(), GatewayName::AamarPay);
    }
}
