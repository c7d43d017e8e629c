//! Shared fixtures for integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use rust_decimal::Decimal;
use serde_json::Value;
use unified_payments::{
    PaymentRequest,
    config::{AamarPayConfig, BkashConfig, SslCommerzConfig},
    model::{Address, Customer, Product, RedirectUrls},
    transport::{RequestBody, RequestContext, Transport, TransportError, TransportResponse},
};

pub const AAMARPAY_URL: &str = "https://sandbox.aamarpay.com/jsonpost.php";
pub const BKASH_BASE: &str = "https://tokenized.sandbox.bka.sh/v1.2.0-beta";

pub const GRANT: &str = "/tokenized/checkout/token/grant";
pub const CREATE: &str = "/tokenized/checkout/create";
pub const EXECUTE: &str = "/tokenized/checkout/execute";
pub const STATUS: &str = "/tokenized/checkout/payment/status";
pub const SSLCOMMERZ_INIT: &str = "/gwprocess/v4/api.php";

/// Scripted provider reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(u16, Value),
    Raw(u16, &'static str),
    Fail,
}

/// A request the mock received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl RecordedCall {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn form(&self) -> Vec<(String, String)> {
        serde_urlencoded::from_bytes(&self.body).unwrap()
    }

    pub fn form_field(&self, name: &str) -> Option<String> {
        self.form().into_iter().find(|(key, _)| key == name).map(|(_, value)| value)
    }
}

/// Transport that answers from a script and records every call.
///
/// Replies are matched by URL suffix. Each route holds a queue: replies are
/// consumed in order and the last one repeats.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<Vec<(String, VecDeque<Reply>)>>,
    calls: Mutex<Vec<RecordedCall>>,
    grant_delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every token grant, to let concurrent callers pile up.
    pub fn with_grant_delay(delay: Duration) -> Self {
        Self { grant_delay: Some(delay), ..Self::default() }
    }

    pub fn on(&self, suffix: &str, reply: Reply) -> &Self {
        let mut routes = self.routes.lock().unwrap();
        match routes.iter_mut().find(|(route, _)| route == suffix) {
            Some((_, queue)) => queue.push_back(reply),
            None => routes.push((suffix.to_owned(), VecDeque::from([reply]))),
        }
        drop(routes);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, suffix: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|call| call.url.ends_with(suffix)).collect()
    }

    fn next_reply(&self, url: &str) -> Option<Reply> {
        let mut routes = self.routes.lock().unwrap();
        let (_, queue) = routes.iter_mut().find(|(suffix, _)| url.ends_with(suffix.as_str()))?;
        if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() }
    }
}

impl Transport for MockTransport {
    async fn post(
        &self,
        ctx: RequestContext<'_>,
        body: RequestBody,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            url: ctx.url.to_owned(),
            headers: ctx
                .headers
                .iter()
                .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
                .collect(),
            content_type: body.content_type(),
            body: body.as_bytes().to_vec(),
        });

        let reply = self.next_reply(ctx.url);

        if let Some(delay) = self.grant_delay
            && ctx.url.ends_with(GRANT)
        {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Some(Reply::Json(status, value)) => {
                Ok(TransportResponse { status, body: serde_json::to_vec(&value).unwrap() })
            }
            Some(Reply::Raw(status, text)) => {
                Ok(TransportResponse { status, body: text.as_bytes().to_vec() })
            }
            Some(Reply::Fail) => Err(TransportError::Connection("connection refused".to_owned())),
            None => Ok(TransportResponse { status: 404, body: b"{}".to_vec() }),
        }
    }
}

pub fn mock() -> Arc<MockTransport> {
    Arc::new(MockTransport::new())
}

pub fn grant_ok(token: &str) -> Reply {
    Reply::Json(200, serde_json::json!({ "id_token": token, "token_type": "Bearer", "expires_in": 3600 }))
}

pub fn aamarpay_config(server_url: &str) -> AamarPayConfig {
    AamarPayConfig {
        store_id: "aamarpaytest".to_owned(),
        signature_key: "dbb74894e82415a2f7ff0ec3a97e4183".to_owned(),
        server_url: server_url.to_owned(),
    }
}

pub fn sslcommerz_config() -> SslCommerzConfig {
    SslCommerzConfig {
        store_id: "testbox".to_owned(),
        store_password: "qwerty".to_owned(),
        test_mode: true,
        base_url: None,
    }
}

pub fn bkash_config() -> BkashConfig {
    BkashConfig {
        username: "sandboxTokenizedUser02".to_owned(),
        password: "sandboxTokenizedUser02@12345".to_owned(),
        app_key: "4f6o0cjiki2rfm34kfdadl1eqq".to_owned(),
        app_secret: "2is7hdktrekvrbljjh44ll3d9l1dtjo4pasmjvs5vl5qr3fug4b".to_owned(),
        sandbox: true,
        base_url: None,
        token_ttl_secs: None,
    }
}

/// 500 BDT, transaction `TXN1`.
pub fn sample_request() -> PaymentRequest {
    PaymentRequest {
        amount: Decimal::new(500, 0),
        currency: "BDT".to_owned(),
        transaction_id: "TXN1".to_owned(),
        urls: RedirectUrls {
            success: "https://shop.example/success".to_owned(),
            fail: "https://shop.example/fail".to_owned(),
            cancel: "https://shop.example/cancel".to_owned(),
            callback: Some("https://shop.example/bkash/callback".to_owned()),
            ipn: Some("https://shop.example/ipn".to_owned()),
        },
        product: Product {
            name: "T-shirt".to_owned(),
            category: Some("Clothing".to_owned()),
            description: "Cotton T-shirt".to_owned(),
        },
        customer: Customer {
            name: "Test Customer".to_owned(),
            email: "customer@example.com".to_owned(),
            phone: "01770618575".to_owned(),
            address: Address {
                line1: "House 12, Road 5".to_owned(),
                line2: None,
                city: "Dhaka".to_owned(),
                state: "Dhaka".to_owned(),
                postcode: "1207".to_owned(),
                country: "Bangladesh".to_owned(),
            },
        },
        gateway: None,
    }
}
