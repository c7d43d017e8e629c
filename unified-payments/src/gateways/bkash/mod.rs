//! bKash tokenized checkout adapter.
//!
//! Unlike the single-step providers, bKash needs a session token before any
//! payment call, and a payment goes through three stages:
//!
//! 1. **Create** ([`PaymentGateway::process_payment`]): returns `bkashURL`,
//!    where the payer approves the payment.
//! 2. **Execute** ([`BkashGateway::execute_payment`]): finalizes the payment
//!    once the payer is sent back to the callback URL.
//! 3. **Query** ([`BkashGateway::query_payment`]): reports the current state.
//!
//! Every call carries `Authorization: <id_token>` and `X-APP-Key`. The token
//! is granted lazily and cached (see [`token`]); a `401` on any call drops it
//! so the next call asks for a new one.

use std::{borrow::Cow, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::{
    config::BkashConfig,
    error::{Action, PaymentError, Result, UpstreamError},
    gateways::{GatewayName, PaymentGateway, post_json, redirect_url},
    model::PaymentRequest,
    transport::{RequestBody, RequestContext, Transport},
};

pub mod token;

use token::{CachedToken, DEFAULT_TOKEN_TTL, TokenCache};

/// Production API root.
pub const LIVE_BASE_URL: &str = "https://tokenized.pay.bka.sh/v1.2.0-beta";

/// Sandbox API root.
pub const SANDBOX_BASE_URL: &str = "https://tokenized.sandbox.bka.sh/v1.2.0-beta";

const GRANT_PATH: &str = "/tokenized/checkout/token/grant";
const CREATE_PATH: &str = "/tokenized/checkout/create";
const EXECUTE_PATH: &str = "/tokenized/checkout/execute";
const STATUS_PATH: &str = "/tokenized/checkout/payment/status";

const CHECKOUT_MODE: &str = "0011";
const INTENT_SALE: &str = "sale";

/// `statusCode` of a successful execution.
pub const SUCCESS_STATUS_CODE: &str = "0000";

const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Serialize)]
struct GrantRequest<'a> {
    app_key: &'a str,
    app_secret: &'a str,
}

#[derive(Deserialize)]
struct GrantResponse {
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Create-payment request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BkashCreateRequest<'a> {
    /// Always `"0011"` (checkout without agreement).
    pub mode: &'static str,
    /// Payer reference, the customer's phone number.
    pub payer_reference: &'a str,
    /// Where bKash sends the payer after approval.
    #[serde(rename = "callbackURL", skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<&'a str>,
    /// Amount as a decimal string.
    pub amount: String,
    /// Currency code.
    pub currency: &'a str,
    /// Always `"sale"`.
    pub intent: &'static str,
    /// Merchant invoice number, the transaction id.
    pub merchant_invoice_number: &'a str,
}

impl<'a> BkashCreateRequest<'a> {
    /// Maps a unified request onto the bKash create body.
    #[must_use]
    pub fn from_request(request: &'a PaymentRequest) -> Self {
        Self {
            mode: CHECKOUT_MODE,
            payer_reference: &request.customer.phone,
            callback_url: request.urls.callback.as_deref(),
            amount: request.amount.normalize().to_string(),
            currency: &request.currency,
            intent: INTENT_SALE,
            merchant_invoice_number: &request.transaction_id,
        }
    }
}

#[derive(Deserialize)]
struct CreateResponse {
    #[serde(default, rename = "paymentID")]
    payment_id: Option<String>,
    #[serde(default, rename = "bkashURL")]
    bkash_url: Option<String>,
}

#[derive(Serialize)]
struct PaymentIdRequest<'a> {
    #[serde(rename = "paymentID")]
    payment_id: &'a str,
}

/// A payment object as bKash returns it from execute or query.
///
/// The body is kept exactly as received. bKash is loose about field types
/// (`amount` and `statusCode` arrive as strings or numbers), so the accessors
/// read fields as text rather than decoding into fixed types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BkashPaymentResponse(Map<String, Value>);

/// Result of a successful execute call.
pub type BkashExecuteResponse = BkashPaymentResponse;

/// Status-query response, returned as received.
pub type BkashQueryResponse = BkashPaymentResponse;

impl BkashPaymentResponse {
    /// Returns a raw field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a string, number or boolean field as text.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<Cow<'_, str>> {
        match self.0.get(key)? {
            Value::String(text) => Some(Cow::Borrowed(text.as_str())),
            Value::Number(number) => Some(Cow::Owned(number.to_string())),
            Value::Bool(flag) => Some(Cow::Owned(flag.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// bKash payment id.
    #[must_use]
    pub fn payment_id(&self) -> Option<Cow<'_, str>> {
        self.text("paymentID")
    }

    /// bKash transaction id, once executed.
    #[must_use]
    pub fn trx_id(&self) -> Option<Cow<'_, str>> {
        self.text("trxID")
    }

    /// e.g. `Initiated`, `Completed`.
    #[must_use]
    pub fn transaction_status(&self) -> Option<Cow<'_, str>> {
        self.text("transactionStatus")
    }

    /// Amount as sent by bKash.
    #[must_use]
    pub fn amount(&self) -> Option<Cow<'_, str>> {
        self.text("amount")
    }

    /// Provider status code, [`SUCCESS_STATUS_CODE`] on success.
    #[must_use]
    pub fn status_code(&self) -> Option<Cow<'_, str>> {
        self.text("statusCode")
    }

    /// Provider status message.
    #[must_use]
    pub fn status_message(&self) -> Option<Cow<'_, str>> {
        self.text("statusMessage")
    }

    /// Returns the body as a JSON object.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the response and returns the JSON object.
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

/// bKash adapter.
///
/// The adapter is shared between tasks; the cached token is the only mutable
/// state and is guarded internally.
#[derive(Debug)]
pub struct BkashGateway<T> {
    config: BkashConfig,
    base_url: String,
    default_ttl: Duration,
    tokens: TokenCache,
    transport: Arc<T>,
}

impl<T> BkashGateway<T> {
    /// Creates the adapter. Performs no I/O; the first call grants a token.
    #[must_use]
    pub fn new(config: BkashConfig, transport: Arc<T>) -> Self {
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(if config.sandbox { SANDBOX_BASE_URL } else { LIVE_BASE_URL })
            .trim_end_matches('/')
            .to_owned();
        let default_ttl = config.token_ttl_secs.map_or(DEFAULT_TOKEN_TTL, Duration::from_secs);

        Self { config, base_url, default_ttl, tokens: TokenCache::default(), transport }
    }

    /// Returns the API root in use.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Drops the cached token; the next call grants a new one.
    pub async fn invalidate_token(&self) {
        self.tokens.invalidate().await;
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl<T: Transport> BkashGateway<T> {
    async fn grant_token(&self) -> std::result::Result<CachedToken, UpstreamError> {
        let url = self.endpoint(GRANT_PATH);
        let body = RequestBody::json(&GrantRequest {
            app_key: &self.config.app_key,
            app_secret: &self.config.app_secret,
        })?;
        let ctx = RequestContext {
            url: &url,
            headers: vec![
                ("Accept", "application/json"),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ],
        };

        let grant: GrantResponse = post_json(self.transport.as_ref(), ctx, body).await?;
        let token = grant.id_token.filter(|token| !token.is_empty()).ok_or(UpstreamError::MissingToken)?;
        let ttl = grant.expires_in.map_or(self.default_ttl, Duration::from_secs);

        Ok(CachedToken::new(token, ttl))
    }

    /// Returns a valid session token, granting one if needed.
    async fn token(&self) -> Result<String> {
        self.tokens
            .get_or_fetch(|| self.grant_token())
            .await
            .map_err(|source| {
                warn!(error = %source, "bkash token grant failed");
                PaymentError::AuthToken { gateway: GatewayName::Bkash, source }
            })
    }

    /// Posts `payload` with session headers and decodes the JSON response.
    async fn call<B, R>(&self, path: &str, payload: &B, action: Action) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let token = self.token().await?;
        let url = self.endpoint(path);

        let result: std::result::Result<R, UpstreamError> = async {
            let body = RequestBody::json(payload)?;
            let ctx = RequestContext {
                url: &url,
                headers: vec![
                    ("Authorization", token.as_str()),
                    ("X-APP-Key", self.config.app_key.as_str()),
                ],
            };
            post_json(self.transport.as_ref(), ctx, body).await
        }
        .await;

        if let Err(UpstreamError::HttpStatus(401)) = &result {
            self.tokens.invalidate_if(&token).await;
        }

        result.map_err(|source| PaymentError::gateway(GatewayName::Bkash, action, source))
    }

    /// Finalizes a payment the payer has approved.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::ExecutionFailed`] (400) if bKash reports a
    /// `statusCode` other than `"0000"`, [`PaymentError::AuthToken`] if no
    /// token can be obtained, and [`PaymentError::Gateway`] for transport or
    /// decoding failures.
    #[instrument(skip(self), fields(gateway = "bkash"))]
    pub async fn execute_payment(&self, payment_id: &str) -> Result<BkashExecuteResponse> {
        let response: BkashExecuteResponse =
            self.call(EXECUTE_PATH, &PaymentIdRequest { payment_id }, Action::Execute).await?;

        if let Some(status_code) = response.status_code()
            && !status_code.is_empty()
            && status_code != SUCCESS_STATUS_CODE
        {
            let status_message = response
                .status_message()
                .filter(|message| !message.is_empty())
                .map_or_else(|| UNKNOWN_ERROR.to_owned(), Cow::into_owned);
            warn!(status_code = %status_code, status_message = %status_message, "bkash execution declined");
            return Err(PaymentError::ExecutionFailed {
                status_code: status_code.into_owned(),
                status_message,
            });
        }

        let trx_id = response.trx_id();
        info!(trx_id = trx_id.as_deref(), "bkash payment executed");
        drop(trx_id);
        Ok(response)
    }

    /// Returns the current state of a payment without interpreting it.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::AuthToken`] if no token can be obtained and
    /// [`PaymentError::Gateway`] for transport or decoding failures.
    #[instrument(skip(self), fields(gateway = "bkash"))]
    pub async fn query_payment(&self, payment_id: &str) -> Result<BkashQueryResponse> {
        self.call(STATUS_PATH, &PaymentIdRequest { payment_id }, Action::Query).await
    }
}

impl<T: Transport> PaymentGateway for BkashGateway<T> {
    fn name(&self) -> GatewayName {
        GatewayName::Bkash
    }

    #[instrument(
        skip(self, request),
        fields(gateway = "bkash", transaction_id = %request.transaction_id)
    )]
    async fn process_payment(&self, request: &PaymentRequest) -> Result<String> {
        let payload = BkashCreateRequest::from_request(request);
        let response: CreateResponse = self.call(CREATE_PATH, &payload, Action::Process).await?;

        let url = redirect_url(GatewayName::Bkash, response.bkash_url)?;
        info!(payment_id = response.payment_id.as_deref(), "bkash payment created");
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

    fn config() -> BkashConfig {
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

    fn request() -> PaymentRequest {
        PaymentRequest {
            amount: Decimal::new(50000, 2),
            currency: "BDT".to_owned(),
            transaction_id: "INV-7".to_owned(),
            urls: RedirectUrls {
                success: "https://shop.example/ok".to_owned(),
                fail: "https://shop.example/fail".to_owned(),
                cancel: "https://shop.example/cancel".to_owned(),
                callback: Some("https://shop.example/bkash/callback".to_owned()),
                ipn: None,
            },
            product: Product { name: "Item".to_owned(), category: None, description: "d".to_owned() },
            customer: Customer {
                name: "Karim".to_owned(),
                email: "karim@example.com".to_owned(),
                phone: "01770618575".to_owned(),
                address: Address {
                    line1: "Road 1".to_owned(),
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

    #[test]
    fn test_base_url_selection() {
        let transport = Arc::new(HttpTransport::new().unwrap());

        let sandbox = BkashGateway::new(config(), Arc::clone(&transport));
        assert_eq!(sandbox.base_url(), SANDBOX_BASE_URL);

        let live = BkashGateway::new(BkashConfig { sandbox: false, ..config() }, Arc::clone(&transport));
        assert_eq!(live.base_url(), LIVE_BASE_URL);

        let custom = BkashGateway::new(
            BkashConfig { base_url: Some("http://127.0.0.1:8080/".to_owned()), ..config() },
            transport,
        );
        assert_eq!(custom.endpoint(GRANT_PATH), "http://127.0.0.1:8080/tokenized/checkout/token/grant");
    }

    #[test]
    fn test_create_request_mapping() {
        let request = request();
        let value = serde_json::to_value(BkashCreateRequest::from_request(&request)).unwrap();

        assert_eq!(value["mode"], "0011");
        assert_eq!(value["payerReference"], "01770618575");
        assert_eq!(value["callbackURL"], "https://shop.example/bkash/callback");
        assert_eq!(value["amount"], "500");
        assert_eq!(value["currency"], "BDT");
        assert_eq!(value["intent"], "sale");
        assert_eq!(value["merchantInvoiceNumber"], "INV-7");
    }

    #[test]
    fn test_create_request_keeps_fraction() {
        let mut request = request();
        request.amount = Decimal::new(9950, 2);
        assert_eq!(BkashCreateRequest::from_request(&request).amount, "99.5");
    }

    #[test]
    fn test_create_request_without_callback() {
        let mut request = request();
        request.urls.callback = None;
        let value = serde_json::to_value(BkashCreateRequest::from_request(&request)).unwrap();
        assert!(value.get("callbackURL").is_none());
    }

    #[test]
    fn test_payment_response_kept_as_received() {
        let response: BkashExecuteResponse = serde_json::from_str(
            r#"{
                "paymentID": "TR0011",
                "trxID": "BFD90JRLST",
                "transactionStatus": "Completed",
                "amount": 500,
                "statusCode": "0000",
                "statusMessage": "Successful",
                "payerReference": "01770618575"
            }"#,
        )
        .unwrap();

        assert_eq!(response.trx_id().as_deref(), Some("BFD90JRLST"));
        assert_eq!(response.transaction_status().as_deref(), Some("Completed"));
        assert_eq!(response.amount().as_deref(), Some("500"));
        assert_eq!(response.text("payerReference").as_deref(), Some("01770618575"));

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["paymentID"], "TR0011");
        assert_eq!(value["amount"], 500);
        assert_eq!(value["payerReference"], "01770618575");
    }

    #[test]
    fn test_payment_response_text_skips_structures() {
        let response: BkashQueryResponse =
            serde_json::from_str(r#"{"statusCode": 2056, "refund": {"amount": "1"}, "note": null}"#).unwrap();

        assert_eq!(response.status_code().as_deref(), Some("2056"));
        assert!(response.text("refund").is_none());
        assert!(response.text("note").is_none());
        assert!(response.get("refund").is_some());
    }
}
