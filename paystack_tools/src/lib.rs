//! A thin, typed client for the parts of the Paystack REST API that the coffee service uses.
//!
//! [`PaystackApi::initialize_transaction`] opens a checkout session for an amount in major currency units, and
//! [`helpers::calculate_signature`] produces the `x-paystack-signature` value Paystack attaches to its webhooks.
mod api;
mod config;
mod data_objects;
mod error;

pub mod helpers;

pub use api::PaystackApi;
pub use config::PaystackConfig;
pub use data_objects::{
    InitializeTransactionRequest,
    InitializeTransactionResponse,
    PaystackTransaction,
    WebhookData,
    WebhookEvent,
};
pub use error::PaystackApiError;
