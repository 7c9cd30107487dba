use std::{collections::HashMap, fmt::Debug};

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    api::{
        errors::{OrderFlowError, UserApiError},
        order_objects::{OrderQueryFilter, OrderSummary},
    },
    db::traits::{CatalogManagement, OrderManagement, UserManagement},
    db_types::{CartItem, NewOrder, NewOrderItem, Order, OrderStatusType, Principal},
    events::{CancelReason, EventProducers, OrderCancelledEvent, OrderCreatedEvent},
};

/// `OrderFlowApi` is the primary API for placing orders and moving them through their lifecycle.
///
/// Placing an order reserves stock for it. The reservation is released if the order is cancelled or expires, and
/// consumed (taken out of the catalog) when the order completes.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

/// Sums the quantities of repeated products, keeping the order in which products first appear.
fn merge_cart(cart: Vec<CartItem>) -> Result<Vec<CartItem>, OrderFlowError> {
    if cart.is_empty() {
        return Err(OrderFlowError::InvalidRequest("the order must contain at least one coffee".into()));
    }
    let mut merged: Vec<CartItem> = Vec::with_capacity(cart.len());
    let mut index = HashMap::new();
    for item in cart {
        if item.quantity < 1 {
            return Err(OrderFlowError::InvalidRequest(format!(
                "the quantity for coffee #{} must be at least 1, not {}",
                item.product_id, item.quantity
            )));
        }
        match index.get(&item.product_id) {
            Some(&i) => {
                let line: &mut CartItem = &mut merged[i];
                line.quantity = line.quantity.checked_add(item.quantity).ok_or_else(|| {
                    OrderFlowError::InvalidRequest(format!("the quantity for coffee #{} is too large", item.product_id))
                })?;
            },
            None => {
                index.insert(item.product_id, merged.len());
                merged.push(item);
            },
        }
    }
    Ok(merged)
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + UserManagement + CatalogManagement
{
    /// Places a new order for `user_id`.
    ///
    /// Products in the cart that do not exist are skipped with a warning, as long as at least one does. Every line must
    /// be covered by the product's available stock, otherwise no order is created at all. The reservations are made in
    /// the same database transaction that stores the order, so concurrent orders cannot oversell.
    pub async fn place_order(&self, user_id: i64, cart: Vec<CartItem>) -> Result<OrderSummary, OrderFlowError> {
        let cart = merge_cart(cart)?;
        self.db.fetch_user(user_id).await?.ok_or(UserApiError::UserNotFound(user_id))?;
        let ids = cart.iter().map(|c| c.product_id).collect::<Vec<i64>>();
        let products = self.db.fetch_products_by_ids(&ids).await?;
        if products.is_empty() {
            debug!("🔄️📦️ None of the products {ids:?} ordered by user #{user_id} exist");
            return Err(OrderFlowError::NoProductsFound);
        }
        let mut items = Vec::with_capacity(products.len());
        for line in &cart {
            let Some(product) = products.iter().find(|p| p.id == line.product_id) else {
                warn!("🔄️📦️ User #{user_id} ordered coffee #{}, which does not exist. Skipping it.", line.product_id);
                continue;
            };
            let available = product.quantity - self.db.reserved_quantity(product.id).await?;
            if line.quantity > available {
                return Err(OrderFlowError::InsufficientStock {
                    product_id: product.id,
                    name: product.name.clone(),
                    requested: line.quantity,
                    available: available.max(0),
                });
            }
            items.push(NewOrderItem {
                product_id: product.id,
                name: product.name.clone(),
                quantity: line.quantity,
                unit_price: product.price,
            });
        }
        let order = NewOrder::from_items(user_id, items)
            .ok_or_else(|| OrderFlowError::InvalidRequest("the order total is too large".into()))?;
        let summary = self.db.insert_order(order).await?;
        info!(
            "🔄️📦️ Order #{} placed by user #{user_id}. {} lines, total {}",
            summary.order.id,
            summary.items.len(),
            summary.order.total_amount
        );
        self.call_order_created_hook(&summary).await;
        Ok(summary)
    }

    pub async fn fetch_order(&self, id: i64) -> Result<OrderSummary, OrderFlowError> {
        let order = self.db.fetch_order(id).await?.ok_or(OrderFlowError::OrderNotFound(id))?;
        self.with_items(order).await
    }

    /// Fetches an order on behalf of `principal`. Another user's order looks exactly like a missing one.
    pub async fn fetch_order_for_user(&self, principal: &Principal, id: i64) -> Result<OrderSummary, OrderFlowError> {
        let order = self.owned_order(principal, id).await?;
        self.with_items(order).await
    }

    pub async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<OrderSummary>, OrderFlowError> {
        let orders = self.db.search_orders(OrderQueryFilter::default().with_user_id(user_id)).await?;
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            result.push(self.with_items(order).await?);
        }
        Ok(result)
    }

    pub async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        trace!("🔄️📦️ Searching orders: {filter}");
        self.db.search_orders(filter).await
    }

    /// Sets the status of an order (admin only).
    ///
    /// Only `PENDING` orders can change status. Completing an order consumes its reserved stock and cancelling it
    /// releases the stock. Setting an order to the status it already has changes nothing.
    pub async fn update_order_status(&self, id: i64, status: &str) -> Result<Order, OrderFlowError> {
        let new_status =
            status.trim().parse::<OrderStatusType>().map_err(|_| OrderFlowError::InvalidStatus(status.to_string()))?;
        let order = self.db.fetch_order(id).await?.ok_or(OrderFlowError::OrderNotFound(id))?;
        if order.status == new_status {
            debug!("🔄️📦️ Order #{id} is already {new_status}");
            return Ok(order);
        }
        let forbidden = || OrderFlowError::ForbiddenTransition {
            id,
            from: order.status.to_string(),
            to: new_status.to_string(),
        };
        if order.status.is_terminal() {
            return Err(forbidden());
        }
        let updated = match new_status {
            OrderStatusType::Completed => self.db.complete_order(id).await?,
            OrderStatusType::Canceled => self.db.cancel_order(id).await?,
            OrderStatusType::Pending => None,
        }
        .ok_or_else(forbidden)?;
        info!("🔄️📦️ Order #{id} moved from {} to {new_status}", order.status);
        if new_status == OrderStatusType::Canceled {
            self.call_order_cancelled_hook(&updated, CancelReason::Cancelled).await;
        }
        Ok(updated)
    }

    /// Cancels a pending order and releases its stock. Users may only cancel their own orders.
    pub async fn cancel_order(&self, principal: &Principal, id: i64) -> Result<Order, OrderFlowError> {
        let order = self.owned_order(principal, id).await?;
        if order.status != OrderStatusType::Pending {
            return Err(OrderFlowError::OrderAlreadyProcessed(id));
        }
        let order = self.db.cancel_order(id).await?.ok_or(OrderFlowError::OrderAlreadyProcessed(id))?;
        info!("🔄️❌️ Order #{id} cancelled by user #{}", principal.user_id);
        self.call_order_cancelled_hook(&order, CancelReason::Cancelled).await;
        Ok(order)
    }

    /// Cancels all pending orders that have not been touched since `older_than`.
    pub async fn expire_old_orders(&self, older_than: DateTime<Utc>) -> Result<Vec<Order>, OrderFlowError> {
        let expired = self.db.expire_orders(older_than).await?;
        for order in &expired {
            info!("🔄️⏰️ Order #{} expired without payment", order.id);
            self.call_order_cancelled_hook(order, CancelReason::Expired).await;
        }
        Ok(expired)
    }

    async fn owned_order(&self, principal: &Principal, id: i64) -> Result<Order, OrderFlowError> {
        self.db
            .fetch_order(id)
            .await?
            .filter(|o| principal.can_access(o.user_id))
            .ok_or(OrderFlowError::OrderNotFound(id))
    }

    async fn with_items(&self, order: Order) -> Result<OrderSummary, OrderFlowError> {
        let items = self.db.fetch_order_items(order.id).await?;
        Ok(OrderSummary::new(order, items))
    }

    async fn call_order_created_hook(&self, summary: &OrderSummary) {
        for emitter in &self.producers.order_created_producer {
            debug!("🔄️📦️ Notifying order created hook subscribers");
            emitter.publish_event(OrderCreatedEvent::new(summary.clone())).await;
        }
    }

    async fn call_order_cancelled_hook(&self, order: &Order, reason: CancelReason) {
        for emitter in &self.producers.order_cancelled_producer {
            debug!("🔄️❌️ Notifying order cancelled hook subscribers");
            emitter.publish_event(OrderCancelledEvent::new(order.clone(), reason)).await;
        }
    }
}
