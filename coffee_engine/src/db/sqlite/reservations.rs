//! The stock reservation ledger.
//!
//! A reservation holds a quantity of a product against an unpaid order. The available stock of a product is its
//! quantity minus the sum of all its reservations.
use log::{debug, trace};
use sqlx::SqliteConnection;

use super::products;
use crate::{api::errors::CatalogApiError, db_types::StockReservation};

/// Reserves `quantity` units of a product for an order, provided that many units are still available.
///
/// Returns `false` and writes nothing if the product does not exist or does not have enough unreserved stock. The check
/// and the insert are a single statement.
pub async fn reserve_stock(
    product_id: i64,
    order_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO stock_reservations (product_id, order_id, quantity)
        SELECT p.id, $2, $3 FROM products p
        WHERE p.id = $1
          AND p.quantity - COALESCE((SELECT SUM(r.quantity) FROM stock_reservations r WHERE r.product_id = p.id), 0) >= $3
        "#,
    )
    .bind(product_id)
    .bind(order_id)
    .bind(quantity)
    .execute(conn)
    .await?;
    let reserved = result.rows_affected() > 0;
    trace!("🗃️ Reserve {quantity} of product #{product_id} for order #{order_id}: {reserved}");
    Ok(reserved)
}

pub async fn reserved_quantity(product_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let total: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(quantity), 0) FROM stock_reservations WHERE product_id = $1")
            .bind(product_id)
            .fetch_one(conn)
            .await?;
    Ok(total)
}

pub async fn fetch_reservations_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<StockReservation>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM stock_reservations WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await
}

/// Deletes all the reservations held by an order, returning the unreserved stock to the pool.
pub async fn release_reservations(order_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM stock_reservations WHERE order_id = $1").bind(order_id).execute(conn).await?;
    let n = result.rows_affected();
    debug!("🗃️ Released {n} stock reservations held by order #{order_id}");
    Ok(n)
}

/// Takes every reserved quantity of an order out of stock and then deletes the reservations.
///
/// Not atomic by itself. Callers embed this in the transaction that completes the order.
pub async fn consume_reservations(order_id: i64, conn: &mut SqliteConnection) -> Result<(), CatalogApiError> {
    let reservations = fetch_reservations_for_order(order_id, conn).await?;
    for reservation in &reservations {
        products::subtract_stock(reservation.product_id, reservation.quantity, conn).await?;
    }
    release_reservations(order_id, conn).await?;
    debug!("🗃️ {} reservations of order #{order_id} consumed from stock", reservations.len());
    Ok(())
}
