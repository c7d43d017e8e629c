//! Unified Payments: one API over Bangladeshi payment gateways
//!
//! A library that puts aamarPay, SSLCommerz and bKash behind a single
//! request shape and a single error type. A caller describes a payment once
//! as a [`PaymentRequest`]; the crate translates it into the selected
//! provider's wire format, creates a hosted checkout session and hands back
//! the URL the payer should be redirected to.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   Application    │  builds PaymentRequest, redirects the payer
//! └────────┬─────────┘
//!          │ process_payment(request)
//! ┌────────▼──────────────────────────────────────────┐
//! │          GatewayRegistry (this crate)             │
//! │  ┌────────────┐  ┌──────────────┐  ┌───────────┐  │
//! │  │  aamarPay  │  │  SSLCommerz  │  │   bKash   │  │
//! │  │  (JSON)    │  │  (form)      │  │  (token)  │  │
//! │  └─────┬──────┘  └──────┬───────┘  └─────┬─────┘  │
//! │        └────────────────┼────────────────┘        │
//! │                   Transport (reqwest)             │
//! └────────────────────────┬──────────────────────────┘
//!                          │ HTTPS
//!                   ┌──────▼──────┐
//!                   │  Provider   │
//!                   └─────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use unified_payments::{GatewayConfig, GatewayRegistry, PaymentRequest};
//!
//! # async fn example(request: PaymentRequest) -> unified_payments::Result<()> {
//! let config = GatewayConfig::from_file("gateways.toml")?;
//! let registry = GatewayRegistry::from_config(config)?;
//!
//! let redirect = registry.process_payment(&request.with_gateway("sslcommerz")).await?;
//! println!("Send the payer to {redirect}");
//! # Ok(())
//! # }
//! ```
//!
//! ## bKash execute and query
//!
//! bKash sends the payer back to the callback URL with a `paymentID`; the
//! payment is only complete once it has been executed:
//!
//! ```rust,no_run
//! # async fn example(registry: unified_payments::GatewayRegistry<unified_payments::transport::HttpTransport>) -> unified_payments::Result<()> {
//! let bkash = registry.bkash()?;
//! let executed = bkash.execute_payment("TR0011ON1565154754797").await?;
//! println!("trxID: {:?}", executed.trx_id());
//!
//! let status = bkash.query_payment("TR0011ON1565154754797").await?;
//! println!("status: {:?}", status.transaction_status());
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Every operation returns [`PaymentError`], whose [`code`](PaymentError::code)
//! is `400` for caller mistakes and provider-declined executions and `500` for
//! everything else:
//!
//! ```rust,no_run
//! use unified_payments::{GatewayRegistry, PaymentError, PaymentRequest};
//! # async fn example(registry: GatewayRegistry<unified_payments::transport::HttpTransport>, request: PaymentRequest) {
//! match registry.process_payment(&request).await {
//!     Ok(url) => println!("redirect to {url}"),
//!     Err(e) if e.is_transient() => eprintln!("temporary failure, try again: {e}"),
//!     Err(PaymentError::MissingRedirectUrl { gateway }) => eprintln!("{gateway} declined the session"),
//!     Err(e) => eprintln!("{} {}", e.code(), e),
//! }
//! # }
//! ```
//!
//! # Logging
//!
//! The crate emits `tracing` spans and events; install any subscriber to see
//! them. Credentials and session tokens are never logged.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and wiremock"
)]

pub mod config;
pub mod error;
pub mod gateways;
pub mod model;
pub mod registry;
pub mod transport;

pub use config::GatewayConfig;
pub use error::{PaymentError, Result};
pub use gateways::{Gateway, GatewayName, PaymentGateway};
pub use model::PaymentRequest;
pub use registry::GatewayRegistry;
