use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use coffee_common::Money;

use crate::provider::{PaymentProvider, PaymentProviderError, ProviderCharge};

/// A payment provider that answers every initiation locally, counting the calls it receives.
///
/// Clones share their counters, so a test can keep one handle and give another to the API under test.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// While set, every initiation fails with a network error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl PaymentProvider for StaticProvider {
    fn name(&self) -> &str {
        "Static"
    }

    async fn initiate_transaction(
        &self,
        _email: &str,
        amount: Money,
        reference: &str,
    ) -> Result<ProviderCharge, PaymentProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(PaymentProviderError::Network("connection timed out".into()));
        }
        if !amount.is_positive() {
            return Err(PaymentProviderError::InvalidAmount(amount.to_string()));
        }
        Ok(ProviderCharge {
            access_code: format!("access_{reference}"),
            reference: reference.to_string(),
            authorization_url: format!("https://checkout.example.com/{reference}"),
        })
    }
}
