use std::fmt::Debug;

use log::*;
use uuid::Uuid;

use crate::{
    api::errors::{OrderFlowError, PaymentApiError, UserApiError},
    db::traits::{InsertTransactionResult, OrderManagement, SettlementOutcome, TransactionManagement, UserManagement},
    db_types::{NewTransaction, OrderStatusType, Transaction},
    events::{EventProducers, OrderPaidEvent},
    provider::PaymentProvider,
};

/// `PaymentApi` coordinates payment initiation with the configured [`PaymentProvider`], and settles payments when the
/// provider reports back.
///
/// Initiation is idempotent: while a transaction for an order is pending, asking to pay for the order again returns the
/// same transaction and does not call the provider.
pub struct PaymentApi<B, P> {
    db: B,
    provider: P,
    producers: EventProducers,
}

impl<B, P> Debug for PaymentApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi")
    }
}

impl<B, P> PaymentApi<B, P> {
    pub fn new(db: B, provider: P, producers: EventProducers) -> Self {
        Self { db, provider, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<B, P> PaymentApi<B, P>
where
    B: TransactionManagement + OrderManagement + UserManagement,
    P: PaymentProvider,
{
    /// Opens a payment for one of the user's pending orders.
    ///
    /// The provider is called before anything is stored, so a failed call leaves no transaction behind. A fresh
    /// transaction carries the provider's authorization URL. A transaction returned by the idempotency check does not.
    pub async fn initiate_payment(&self, user_id: i64, order_id: i64) -> Result<Transaction, PaymentApiError> {
        let user = self.db.fetch_user(user_id).await?.ok_or(UserApiError::UserNotFound(user_id))?;
        let order = self
            .db
            .fetch_order(order_id)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if order.status != OrderStatusType::Pending {
            return Err(PaymentApiError::OrderNotPayable(order_id));
        }
        if let Some(existing) = self.db.fetch_pending_transaction(order_id, user_id).await? {
            debug!("💳️ Order #{order_id} already has pending transaction {}. Returning it.", existing.reference);
            return Ok(existing);
        }
        let reference = Uuid::new_v4().to_string();
        let amount = order.total_amount;
        trace!("💳️ Initiating {} payment {reference} of {amount} for order #{order_id}", self.provider.name());
        let charge = self.provider.initiate_transaction(&user.email, amount, &reference).await?;
        let new_tx = NewTransaction {
            order_id,
            user_id,
            reference: reference.clone(),
            payment_id: charge.access_code,
            payment_reference: charge.reference,
            total_amount: amount,
        };
        match self.db.insert_transaction(new_tx).await {
            Ok(InsertTransactionResult::Inserted(tx)) => {
                info!("💳️ Payment {reference} for order #{order_id} initiated with {}", self.provider.name());
                Ok(tx.with_authorization_url(charge.authorization_url))
            },
            Ok(InsertTransactionResult::AlreadyPending(tx)) => {
                warn!(
                    "💳️ A concurrent request opened payment {} for order #{order_id} first. The {} session for \
                     {reference} is orphaned and will never be paid.",
                    tx.reference,
                    self.provider.name()
                );
                Ok(tx)
            },
            Err(e) => {
                error!(
                    "💳️ {} accepted payment {reference} for order #{order_id}, but it could not be saved: {e}. The \
                     provider session must be reconciled manually.",
                    self.provider.name()
                );
                Err(e)
            },
        }
    }

    /// Settles a payment reported as successful by the provider.
    ///
    /// Settling the same reference twice is harmless. If the order was cancelled or expired while the customer was
    /// paying, the payment is recorded but the order is left alone, and the payment needs a manual refund.
    pub async fn settle_payment(&self, reference: &str) -> Result<Transaction, PaymentApiError> {
        let outcome = self
            .db
            .settle_transaction(reference)
            .await?
            .ok_or_else(|| PaymentApiError::TransactionNotFound(reference.to_string()))?;
        match outcome {
            SettlementOutcome::Settled { transaction, order } => {
                info!("💳️ Payment {reference} settled. Order #{} is complete.", order.id);
                self.call_order_paid_hook(OrderPaidEvent::new(order, transaction.clone())).await;
                Ok(transaction)
            },
            SettlementOutcome::AlreadySettled(transaction) => {
                debug!("💳️ Payment {reference} was already settled");
                Ok(transaction)
            },
            SettlementOutcome::OrderNotPending { transaction, order } => {
                warn!(
                    "💳️ Payment {reference} of {} settled, but order #{} is {}. This payment must be refunded.",
                    transaction.total_amount, order.id, order.status
                );
                Ok(transaction)
            },
        }
    }

    /// Records that the provider reported a payment as failed. The order can then be paid with a fresh transaction.
    pub async fn fail_payment(&self, reference: &str) -> Result<Transaction, PaymentApiError> {
        let tx = self
            .db
            .fail_transaction(reference)
            .await?
            .ok_or_else(|| PaymentApiError::TransactionNotFound(reference.to_string()))?;
        info!("💳️ Payment {reference} for order #{} is now {}", tx.order_id, tx.payment_status);
        Ok(tx)
    }

    /// Lists every payment attempt for one of the user's orders.
    pub async fn fetch_transactions_for_order(
        &self,
        user_id: i64,
        order_id: i64,
    ) -> Result<Vec<Transaction>, PaymentApiError> {
        self.db
            .fetch_order(order_id)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or(OrderFlowError::OrderNotFound(order_id))?;
        self.db.fetch_transactions_for_order(order_id).await
    }

    async fn call_order_paid_hook(&self, event: OrderPaidEvent) {
        for emitter in &self.producers.order_paid_producer {
            debug!("💳️ Notifying order paid hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}
