//! Coffee Engine
//!
//! The coffee engine is the provider-agnostic core of the coffee ordering service. It manages the catalog, orders with
//! their stock reservations, users, and the coordination of payments with an external payment provider.
//!
//! The library is divided into these sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should never need to access
//!    the database directly. Instead, use the public API provided by the engine. The exception is the data types used
//!    in the database. These are defined in the [`db_types`] module and are public.
//! 2. The engine public API ([`mod@api`]). This provides the catalog, order flow, payment and user APIs. Each is generic
//!    over the backend traits it needs.
//! 3. The [`provider::PaymentProvider`] capability, which payment gateway integrations implement.
//!
//! The engine also emits events when orders are created, paid and cancelled. A simple hook system lets you subscribe
//! to these events and perform custom actions.
mod api;
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod provider;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{
    catalog_api::CatalogApi,
    errors::{CatalogApiError, OrderFlowError, PaymentApiError, UserApiError},
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_api::PaymentApi,
    user_api::{NewUserRequest, UserApi},
};
#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{
    CatalogManagement,
    InsertTransactionResult,
    OrderManagement,
    SettlementOutcome,
    TransactionManagement,
    UserManagement,
};
