//! Payment gateway integrations, and the registry that picks one at startup.
mod paystack;
mod registry;

pub use paystack::PaystackProvider;
pub use registry::ConfiguredProvider;
