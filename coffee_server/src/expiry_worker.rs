use chrono::{Duration, Utc};
use coffee_engine::{db_types::Order, events::EventProducers, OrderFlowApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Once a minute, every pending order that has not been touched for `unpaid_expiry` is cancelled and its stock
/// reservations are released.
pub fn start_expiry_worker(db: SqliteDatabase, producers: EventProducers, unpaid_expiry: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(60));
        let api = OrderFlowApi::new(db, producers);
        info!("🕰️ Unpaid order expiry worker started. Orders expire after {} hrs", unpaid_expiry.num_hours());
        loop {
            timer.tick().await;
            trace!("🕰️ Running unpaid order expiry job");
            match api.expire_old_orders(Utc::now() - unpaid_expiry).await {
                Ok(expired) if expired.is_empty() => trace!("🕰️ No orders expired"),
                Ok(expired) => {
                    info!("🕰️ {} orders expired", expired.len());
                    debug!("🕰️ Expired unpaid orders: {}", order_list(&expired));
                },
                Err(e) => {
                    error!("🕰️ Error running unpaid order expiry job: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] user_id: {} total: {}", o.id, o.user_id, o.total_amount))
        .collect::<Vec<String>>()
        .join(", ")
}
