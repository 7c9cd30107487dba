use crate::db_types::{Order, Transaction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertTransactionResult {
    /// A new pending transaction was stored.
    Inserted(Transaction),
    /// Another pending transaction for the same order and user already exists. It is returned instead.
    AlreadyPending(Transaction),
}

impl InsertTransactionResult {
    pub fn transaction(&self) -> &Transaction {
        match self {
            InsertTransactionResult::Inserted(t) | InsertTransactionResult::AlreadyPending(t) => t,
        }
    }

    pub fn into_transaction(self) -> Transaction {
        match self {
            InsertTransactionResult::Inserted(t) | InsertTransactionResult::AlreadyPending(t) => t,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// The transaction and its order are now both COMPLETED, and the reserved stock has been consumed.
    Settled { transaction: Transaction, order: Order },
    /// The transaction had already been settled. Nothing changed.
    AlreadySettled(Transaction),
    /// The transaction is now COMPLETED, but its order was no longer pending, so it was left untouched.
    OrderNotPending { transaction: Transaction, order: Order },
}

impl SettlementOutcome {
    pub fn transaction(&self) -> &Transaction {
        match self {
            SettlementOutcome::Settled { transaction, .. } => transaction,
            SettlementOutcome::AlreadySettled(transaction) => transaction,
            SettlementOutcome::OrderNotPending { transaction, .. } => transaction,
        }
    }
}
