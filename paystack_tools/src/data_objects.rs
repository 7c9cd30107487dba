use serde::{Deserialize, Serialize};

/// The body of `POST /transaction/initialize`. Paystack wants the amount in kobo, as a string.
#[derive(Debug, Clone, Serialize)]
pub struct InitializeTransactionRequest {
    pub amount: String,
    pub email: String,
    pub reference: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InitializeTransactionResponse {
    pub status: bool,
    pub message: String,
    #[serde(default)]
    pub data: Option<PaystackTransaction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaystackTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// A webhook notification. Only the fields needed to settle a payment are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookData {
    pub reference: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl WebhookEvent {
    pub const CHARGE_FAILED: &'static str = "charge.failed";
    pub const CHARGE_SUCCESS: &'static str = "charge.success";
}
