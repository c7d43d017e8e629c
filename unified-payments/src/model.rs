//! Provider-agnostic payment request.
//!
//! A [`PaymentRequest`] is the one shape callers build; adapters translate it
//! into their provider's wire schema. Field names on the wire are camelCase so
//! a request can be accepted verbatim from a JSON API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unified description of a payment.
///
/// The request is never mutated by this crate. `transaction_id` is forwarded
/// to every provider as its correlation key; uniqueness is the caller's
/// responsibility.
///
/// # Examples
///
/// ```
/// let json = r#"{
///     "amount": 500,
///     "currency": "BDT",
///     "transactionId": "TXN1",
///     "urls": { "success": "https://shop/ok", "fail": "https://shop/fail", "cancel": "https://shop/cancel" },
///     "product": { "name": "Item", "description": "d" },
///     "customer": {
///         "name": "A", "email": "a@b.com", "phone": "01700000000",
///         "address": { "line1": "Road 1", "city": "Dhaka", "state": "Dhaka", "postcode": "1207", "country": "Bangladesh" }
///     },
///     "gateway": "aamarpay"
/// }"#;
///
/// let request: unified_payments::PaymentRequest = serde_json::from_str(json).unwrap();
/// assert_eq!(request.transaction_id, "TXN1");
/// assert_eq!(request.gateway.as_deref(), Some("aamarpay"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Amount in provider currency units (e.g. taka, not paisa).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Caller-unique transaction identifier.
    pub transaction_id: String,
    /// Where the provider sends the payer afterwards.
    pub urls: RedirectUrls,
    /// What is being paid for.
    pub product: Product,
    /// Who is paying.
    pub customer: Customer,
    /// Target gateway for registry dispatch (e.g. `"bkash"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
}

impl PaymentRequest {
    /// Returns a copy of this request targeted at `gateway`.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = Some(gateway.into());
        self
    }
}

/// Redirect and notification URLs.
///
/// Which optional URLs are required depends on the provider: bKash needs
/// `callback`, SSLCommerz uses `ipn` when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectUrls {
    /// Payer lands here after a successful payment.
    pub success: String,
    /// Payer lands here after a failed payment.
    pub fail: String,
    /// Payer lands here after cancelling.
    pub cancel: String,
    /// Provider callback after the hosted page (bKash).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
    /// Instant payment notification endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipn: Option<String>,
}

/// Product details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product name.
    pub name: String,
    /// Product category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Free-text description.
    pub description: String,
}

/// Customer details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Phone number; also the bKash payer reference.
    pub phone: String,
    /// Postal address.
    pub address: Address,
}

/// Postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// First address line.
    pub line1: String,
    /// Second address line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    /// City.
    pub city: String,
    /// State or division.
    pub state: String,
    /// Postal code.
    pub postcode: String,
    /// Country.
    pub country: String,
}
