//! The payment provider capability.
//!
//! The engine never talks to a payment gateway directly. [`crate::PaymentApi`] is generic over a [`PaymentProvider`],
//! which turns an amount and an idempotency reference into a hosted checkout session. Conversion to the provider's
//! minor currency unit happens inside the implementation, never in the engine.
use coffee_common::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a provider hands back when a hosted checkout session is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCharge {
    pub access_code: String,
    pub reference: String,
    pub authorization_url: String,
}

#[derive(Debug, Clone, Error)]
pub enum PaymentProviderError {
    #[error("{0} is not configured")]
    NotConfigured(String),
    #[error("The payment provider rejected the request: {0}")]
    Rejected(String),
    #[error("Could not reach the payment provider: {0}")]
    Network(String),
    #[error("The payment provider sent an invalid response: {0}")]
    InvalidResponse(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    /// A short, human-readable name for logs.
    fn name(&self) -> &str;

    /// Opens a hosted checkout session for `amount`, identified by the caller-chosen `reference`.
    async fn initiate_transaction(
        &self,
        email: &str,
        amount: Money,
        reference: &str,
    ) -> Result<ProviderCharge, PaymentProviderError>;
}
