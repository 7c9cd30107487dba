use log::{debug, warn};
use sqlx::SqliteConnection;

use super::{errors::is_unique_violation, orders};
use crate::{
    api::errors::{OrderFlowError, PaymentApiError},
    db::traits::{InsertTransactionResult, SettlementOutcome},
    db_types::{NewTransaction, PaymentStatus, Transaction},
};

pub async fn fetch_pending_transaction(
    order_id: i64,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM transactions WHERE order_id = $1 AND user_id = $2 AND payment_status = 'PENDING' LIMIT 1",
    )
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

/// Inserts a new pending transaction.
///
/// The partial unique index on pending transactions rejects a second pending row for the same (order, user). When that
/// happens the row that won is returned as [`InsertTransactionResult::AlreadyPending`].
pub async fn insert_transaction(
    tx: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<InsertTransactionResult, PaymentApiError> {
    let (order_id, user_id) = (tx.order_id, tx.user_id);
    let result: Result<Transaction, sqlx::Error> = sqlx::query_as(
        r#"
            INSERT INTO transactions (order_id, user_id, reference, payment_id, payment_reference, total_amount)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(tx.order_id)
    .bind(tx.user_id)
    .bind(tx.reference)
    .bind(tx.payment_id)
    .bind(tx.payment_reference)
    .bind(tx.total_amount)
    .fetch_one(&mut *conn)
    .await;
    match result {
        Ok(transaction) => {
            debug!("🗃️ Transaction {} for order #{order_id} inserted", transaction.reference);
            Ok(InsertTransactionResult::Inserted(transaction))
        },
        Err(e) if is_unique_violation(&e) => {
            warn!("🗃️ A pending transaction for order #{order_id} already exists. Returning it instead.");
            fetch_pending_transaction(order_id, user_id, conn)
                .await?
                .map(InsertTransactionResult::AlreadyPending)
                .ok_or_else(|| PaymentApiError::from(e))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_transaction_by_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM transactions WHERE reference = $1").bind(reference).fetch_optional(conn).await
}

pub async fn fetch_transactions_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM transactions WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await
}

async fn update_status_unless(
    reference: &str,
    status: PaymentStatus,
    unless: &[PaymentStatus],
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let excluded = unless.iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
    let sql = format!(
        "UPDATE transactions SET payment_status = $1, updated_at = CURRENT_TIMESTAMP WHERE reference = $2 AND \
         payment_status NOT IN ({excluded}) RETURNING *"
    );
    sqlx::query_as(&sql).bind(status.to_string()).bind(reference).fetch_optional(conn).await
}

/// Settles a transaction, and completes its order if that is still pending.
///
/// Not atomic by itself. Call it inside a database transaction.
pub async fn settle_transaction(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<SettlementOutcome>, PaymentApiError> {
    let updated = update_status_unless(reference, PaymentStatus::Completed, &[PaymentStatus::Completed], conn).await?;
    let transaction = match updated {
        Some(t) => t,
        None => {
            let existing = fetch_transaction_by_reference(reference, conn).await?;
            return Ok(existing.map(SettlementOutcome::AlreadySettled));
        },
    };
    let order_id = transaction.order_id;
    match orders::complete_order(order_id, conn).await? {
        Some(order) => Ok(Some(SettlementOutcome::Settled { transaction, order })),
        None => {
            let order = orders::fetch_order(order_id, conn)
                .await?
                .ok_or_else(|| PaymentApiError::from(OrderFlowError::OrderNotFound(order_id)))?;
            Ok(Some(SettlementOutcome::OrderNotPending { transaction, order }))
        },
    }
}

/// Marks an open transaction as failed. Completed or already failed transactions are returned unchanged.
pub async fn fail_transaction(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let unless = [PaymentStatus::Completed, PaymentStatus::Failed];
    match update_status_unless(reference, PaymentStatus::Failed, &unless, conn).await? {
        Some(t) => {
            debug!("🗃️ Transaction {reference} marked as failed");
            Ok(Some(t))
        },
        None => fetch_transaction_by_reference(reference, conn).await,
    }
}
