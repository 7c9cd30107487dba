use std::time::Duration;

use coffee_common::Secret;
use log::*;

pub const DEFAULT_PAYSTACK_BASEURL: &str = "https://api.paystack.co";
pub const DEFAULT_PAYSTACK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub base_url: String,
    pub secret: Secret<String>,
    pub timeout: Duration,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PAYSTACK_BASEURL.to_string(),
            secret: Secret::default(),
            timeout: DEFAULT_PAYSTACK_TIMEOUT,
        }
    }
}

impl PaystackConfig {
    pub fn new_from_env_or_default() -> Self {
        let secret = Secret::new(std::env::var("COFFEE_PAYSTACK_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ COFFEE_PAYSTACK_SECRET is not set. Payments cannot be initiated until it is.");
            String::default()
        }));
        let base_url = std::env::var("COFFEE_PAYSTACK_BASEURL").unwrap_or_else(|_| {
            info!("🪛️ COFFEE_PAYSTACK_BASEURL not set, using {DEFAULT_PAYSTACK_BASEURL}");
            DEFAULT_PAYSTACK_BASEURL.to_string()
        });
        let timeout = std::env::var("COFFEE_PAYSTACK_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid COFFEE_PAYSTACK_TIMEOUT '{s}': {e}. Using the default."))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_PAYSTACK_TIMEOUT);
        Self { base_url: base_url.trim_end_matches('/').to_string(), secret, timeout }
    }

    /// Both the secret key and the base URL are required before any call can be made.
    pub fn is_configured(&self) -> bool {
        !self.secret.is_empty() && !self.base_url.trim().is_empty()
    }
}
