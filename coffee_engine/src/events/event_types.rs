use serde::{Deserialize, Serialize};

use crate::{
    api::order_objects::OrderSummary,
    db_types::{Order, Transaction},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: OrderSummary,
}

impl OrderCreatedEvent {
    pub fn new(order: OrderSummary) -> Self {
        Self { order }
    }
}

/// Emitted once a payment settles and the order it pays for is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub transaction: Transaction,
}

impl OrderPaidEvent {
    pub fn new(order: Order, transaction: Transaction) -> Self {
        Self { order, transaction }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelReason {
    /// Cancelled by the customer or an admin.
    Cancelled,
    /// Went unpaid for too long.
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub order: Order,
    pub reason: CancelReason,
}

impl OrderCancelledEvent {
    pub fn new(order: Order, reason: CancelReason) -> Self {
        Self { order, reason }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    OrderPaid(OrderPaidEvent),
    OrderCancelled(OrderCancelledEvent),
}
