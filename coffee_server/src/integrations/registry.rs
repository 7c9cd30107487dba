use coffee_common::Money;
use coffee_engine::provider::{PaymentProvider, PaymentProviderError, ProviderCharge};
use log::info;

use super::PaystackProvider;
use crate::{config::ServerConfig, errors::ServerError};

/// The payment provider selected by `COFFEE_PAYMENT_PROVIDER`.
#[derive(Debug, Clone)]
pub enum ConfiguredProvider {
    Paystack(PaystackProvider),
}

impl ConfiguredProvider {
    /// Resolves the configured provider name (case-insensitive). Unknown names are a configuration error.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let name = config.payment_provider.trim();
        let provider = match name.to_ascii_lowercase().as_str() {
            "paystack" => Self::Paystack(PaystackProvider::new(config.paystack.api.clone())),
            _ => return Err(ServerError::ConfigurationError(format!("invalid payment provider: {name}"))),
        };
        info!("🪛️ Payments are handled by {}", provider.name());
        Ok(provider)
    }
}

impl PaymentProvider for ConfiguredProvider {
    fn name(&self) -> &str {
        match self {
            Self::Paystack(p) => p.name(),
        }
    }

    async fn initiate_transaction(
        &self,
        email: &str,
        amount: Money,
        reference: &str,
    ) -> Result<ProviderCharge, PaymentProviderError> {
        match self {
            Self::Paystack(p) => p.initiate_transaction(email, amount, reference).await,
        }
    }
}
