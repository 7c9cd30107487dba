//! #  Database management and control.
//!
//! This module defines the interface contracts of the coffee engine database *backends*. The public APIs in
//! [`crate::api`] are generic over these traits, so any backend that implements them can drive the engine.
//!
//! * [`CatalogManagement`] manages coffee products and the stock reservation ledger.
//! * [`OrderManagement`] stores orders and moves them through their lifecycle.
//! * [`TransactionManagement`] records payment initiation attempts and their settlement.
//! * [`UserManagement`] stores customers and administrators.
mod catalog_management;
mod order_management;
mod transaction_management;
mod user_management;

mod data_objects;

pub use catalog_management::CatalogManagement;
pub use data_objects::{InsertTransactionResult, SettlementOutcome};
pub use order_management::OrderManagement;
pub use transaction_management::TransactionManagement;
pub use user_management::UserManagement;
