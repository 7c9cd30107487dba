use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use super::{products, reservations};
use crate::{
    api::{
        errors::{CatalogApiError, OrderFlowError},
        order_objects::{OrderQueryFilter, OrderSummary},
    },
    db_types::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatusType},
};

/// Inserts a new order, its line items and one stock reservation per line.
///
/// This is not atomic. Call it inside a transaction (passing `&mut *tx`) so that a failed reservation rolls the order
/// back as well.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<OrderSummary, OrderFlowError> {
    let NewOrder { user_id, total_amount, items } = order;
    let order: Order = sqlx::query_as("INSERT INTO orders (user_id, total_amount) VALUES ($1, $2) RETURNING *;")
        .bind(user_id)
        .bind(total_amount)
        .fetch_one(&mut *conn)
        .await?;
    debug!("🗃️ Order #{} for user #{user_id} inserted. Total: {total_amount}", order.id);
    let mut saved_items = Vec::with_capacity(items.len());
    for item in items {
        let saved = insert_order_item(order.id, &item, conn).await?;
        if !reservations::reserve_stock(item.product_id, order.id, item.quantity, conn).await? {
            return Err(insufficient_stock(&item, conn).await);
        }
        saved_items.push(saved);
    }
    Ok(OrderSummary::new(order, saved_items))
}

async fn insert_order_item(
    order_id: i64,
    item: &NewOrderItem,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_id, name, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(item.name.as_str())
    .bind(item.quantity)
    .bind(item.unit_price)
    .fetch_one(conn)
    .await
}

/// Builds the error for a reservation that could not be made, with current stock figures.
async fn insufficient_stock(item: &NewOrderItem, conn: &mut SqliteConnection) -> OrderFlowError {
    let product = match products::fetch_product(item.product_id, conn).await {
        Ok(Some(p)) => p,
        Ok(None) => return CatalogApiError::ProductNotFound(item.product_id).into(),
        Err(e) => return e.into(),
    };
    let reserved = match reservations::reserved_quantity(item.product_id, conn).await {
        Ok(r) => r,
        Err(e) => return e.into(),
    };
    OrderFlowError::InsufficientStock {
        product_id: product.id,
        name: product.name,
        requested: item.quantity,
        available: (product.quantity - reserved).max(0),
    }
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` (then `id`) in ascending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        for (i, status) in statuses.into_iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status.to_string());
        }
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("datetime(created_at) >= datetime(");
        where_clause.push_bind_unseparated(since);
        where_clause.push_unseparated(")");
    }
    if let Some(until) = query.until {
        where_clause.push("datetime(created_at) <= datetime(");
        where_clause.push_bind_unseparated(until);
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY created_at ASC, id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {}", orders.len());
    Ok(orders)
}

/// Moves an order out of `PENDING` into `status`. The update only happens if the order is still pending, so `None`
/// means another request got there first (or the order does not exist).
pub async fn update_pending_order_status(
    id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = 'PENDING' RETURNING *",
    )
    .bind(status.to_string())
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn cancel_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = update_pending_order_status(id, OrderStatusType::Canceled, conn).await?;
    if order.is_some() {
        reservations::release_reservations(id, conn).await?;
    }
    Ok(order)
}

pub async fn complete_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, OrderFlowError> {
    let order = update_pending_order_status(id, OrderStatusType::Completed, conn).await?;
    if order.is_some() {
        reservations::consume_reservations(id, conn).await?;
    }
    Ok(order)
}

/// Cancels every pending order that has not been touched since `older_than`, and releases its stock.
pub async fn expire_orders(older_than: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let expired: Vec<Order> = sqlx::query_as(
        r#"
        UPDATE orders SET status = 'CANCELED', updated_at = CURRENT_TIMESTAMP
        WHERE status = 'PENDING' AND datetime(updated_at) < datetime($1)
        RETURNING *
        "#,
    )
    .bind(older_than)
    .fetch_all(&mut *conn)
    .await?;
    for order in &expired {
        reservations::release_reservations(order.id, conn).await?;
    }
    Ok(expired)
}
