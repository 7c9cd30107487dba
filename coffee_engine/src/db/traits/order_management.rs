use chrono::{DateTime, Utc};

use crate::{
    api::{
        errors::OrderFlowError,
        order_objects::{OrderQueryFilter, OrderSummary},
    },
    db_types::{NewOrder, Order, OrderItem},
};

/// The `OrderManagement` trait defines the behaviour for storing orders and moving them through their lifecycle.
///
/// Every status change here is conditional on the order still being `PENDING`, so two concurrent requests can never
/// both move the same order.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new `PENDING` order together with its line items and a stock reservation per line, atomically.
    ///
    /// Each reservation only succeeds if the product's available stock (stock minus existing reservations) covers it.
    /// Otherwise the whole order is rolled back and [`OrderFlowError::InsufficientStock`] is returned.
    async fn insert_order(&self, order: NewOrder) -> Result<OrderSummary, OrderFlowError>;

    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, OrderFlowError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderFlowError>;

    /// Orders matching the filter, oldest first.
    async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError>;

    /// Moves a `PENDING` order to `CANCELED` and releases its reservations. Returns `None` if the order was not pending
    /// (or does not exist).
    async fn cancel_order(&self, id: i64) -> Result<Option<Order>, OrderFlowError>;

    /// Moves a `PENDING` order to `COMPLETED`, subtracts its reservations from stock and deletes them. Returns `None` if
    /// the order was not pending (or does not exist).
    async fn complete_order(&self, id: i64) -> Result<Option<Order>, OrderFlowError>;

    /// Cancels every `PENDING` order last updated before `older_than` and releases their reservations.
    async fn expire_orders(&self, older_than: DateTime<Utc>) -> Result<Vec<Order>, OrderFlowError>;
}
