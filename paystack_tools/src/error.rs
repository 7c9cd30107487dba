use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PaystackApiError {
    #[error("paystack is not configured")]
    NotConfigured,
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Paystack rejected the request: {0}")]
    Rejected(String),
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
}
