use crate::{
    api::errors::PaymentApiError,
    db::traits::{InsertTransactionResult, SettlementOutcome},
    db_types::{NewTransaction, Transaction},
};

/// Storage for payment initiation attempts.
///
/// At most one `PENDING` transaction may exist per (order, user). Backends must enforce this at the storage layer
/// rather than relying on a lookup before the insert.
#[allow(async_fn_in_trait)]
pub trait TransactionManagement {
    async fn fetch_pending_transaction(
        &self,
        order_id: i64,
        user_id: i64,
    ) -> Result<Option<Transaction>, PaymentApiError>;

    /// Stores a new pending transaction. If a pending transaction for the same (order, user) pair won a race and
    /// already exists, that one is returned as [`InsertTransactionResult::AlreadyPending`].
    async fn insert_transaction(&self, tx: NewTransaction) -> Result<InsertTransactionResult, PaymentApiError>;

    async fn fetch_transaction_by_reference(&self, reference: &str) -> Result<Option<Transaction>, PaymentApiError>;

    async fn fetch_transactions_for_order(&self, order_id: i64) -> Result<Vec<Transaction>, PaymentApiError>;

    /// Marks the transaction `COMPLETED` and, if its order is still `PENDING`, completes the order and consumes its
    /// reservations, all in one database transaction. Returns `None` for an unknown reference.
    async fn settle_transaction(&self, reference: &str) -> Result<Option<SettlementOutcome>, PaymentApiError>;

    /// Marks a `PENDING` transaction `FAILED`. Transactions in any other state are returned unchanged. Returns `None`
    /// for an unknown reference.
    async fn fail_transaction(&self, reference: &str) -> Result<Option<Transaction>, PaymentApiError>;
}
