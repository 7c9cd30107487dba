use coffee_common::Money;
use coffee_engine::provider::{PaymentProvider, PaymentProviderError, ProviderCharge};
use log::*;
use paystack_tools::{PaystackApi, PaystackApiError, PaystackConfig};

/// Opens hosted checkout sessions with Paystack.
///
/// If the Paystack credentials are missing, the provider is still created so that the server can start, but every
/// initiation fails with "paystack is not configured".
#[derive(Debug, Clone)]
pub struct PaystackProvider {
    api: Option<PaystackApi>,
}

impl PaystackProvider {
    pub fn new(config: PaystackConfig) -> Self {
        let api = match PaystackApi::new(config) {
            Ok(api) => Some(api),
            Err(e) => {
                warn!("💳️ Paystack client is unavailable. {e}");
                None
            },
        };
        Self { api }
    }

    pub fn is_available(&self) -> bool {
        self.api.is_some()
    }
}

impl PaymentProvider for PaystackProvider {
    fn name(&self) -> &str {
        "Paystack"
    }

    async fn initiate_transaction(
        &self,
        email: &str,
        amount: Money,
        reference: &str,
    ) -> Result<ProviderCharge, PaymentProviderError> {
        let api = self.api.as_ref().ok_or_else(|| provider_error(PaystackApiError::NotConfigured))?;
        let tx = api.initialize_transaction(email, amount, reference).await.map_err(provider_error)?;
        Ok(ProviderCharge {
            access_code: tx.access_code,
            reference: tx.reference,
            authorization_url: tx.authorization_url,
        })
    }
}

fn provider_error(e: PaystackApiError) -> PaymentProviderError {
    match e {
        PaystackApiError::NotConfigured => PaymentProviderError::NotConfigured("paystack".into()),
        PaystackApiError::Initialization(s) => PaymentProviderError::NotConfigured(format!("paystack ({s})")),
        PaystackApiError::RestResponseError(s) => PaymentProviderError::Network(s),
        PaystackApiError::JsonError(s) => PaymentProviderError::InvalidResponse(s),
        PaystackApiError::QueryError { status, message } => {
            PaymentProviderError::Rejected(format!("HTTP {status}. {message}"))
        },
        PaystackApiError::Rejected(s) => PaymentProviderError::Rejected(s),
        PaystackApiError::InvalidCurrencyAmount(s) => PaymentProviderError::InvalidAmount(s),
    }
}
