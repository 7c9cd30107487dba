//! # Coffee engine public API
//!
//! The APIs are modular, so that clients can pick the functionality they need. Each API is created by supplying a
//! database backend that implements the backend traits it requires.
//!
//! * [`catalog_api`] manages the coffee catalog and stock.
//! * [`order_flow_api`] places orders and moves them through their lifecycle.
//! * [`payment_api`] initiates payments with a payment provider and settles them.
//! * [`user_api`] manages users and checks credentials.
//!
//! ```rust,ignore
//! use coffee_engine::{CatalogApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/coffee_store.db", 25).await?;
//! let api = CatalogApi::new(db);
//! let coffees = api.fetch_products().await?;
//! ```
pub mod catalog_api;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_api;
pub mod user_api;
