//! `SqliteDatabase` is the concrete SQLite backend of the coffee engine.
//!
//! It implements all the traits defined in [`crate::db::traits`]. Operations that touch more than one row run inside a
//! single database transaction.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::{db_url, new_pool, orders, products, reservations, transactions, users, SqliteDatabaseError};
use crate::{
    api::{
        errors::{CatalogApiError, OrderFlowError, PaymentApiError, UserApiError},
        order_objects::{OrderQueryFilter, OrderSummary},
    },
    db::traits::{
        CatalogManagement,
        InsertTransactionResult,
        OrderManagement,
        SettlementOutcome,
        TransactionManagement,
        UserManagement,
    },
    db_types::{
        NewOrder,
        NewProduct,
        NewTransaction,
        NewUser,
        Order,
        OrderItem,
        Product,
        ProductUpdate,
        StockReservation,
        Transaction,
        User,
        UserUpdate,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        products::insert_product(product, &mut conn).await
    }

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::fetch_product(id, &mut conn).await?)
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::fetch_products(&mut conn).await?)
    }

    async fn fetch_products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::fetch_products_by_ids(ids, &mut conn).await?)
    }

    async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Option<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        products::update_product(id, update, &mut conn).await
    }

    async fn delete_product(&self, id: i64) -> Result<bool, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        products::delete_product(id, &mut conn).await
    }

    async fn reserved_quantity(&self, product_id: i64) -> Result<i64, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(reservations::reserved_quantity(product_id, &mut conn).await?)
    }

    async fn fetch_reservations_for_order(&self, order_id: i64) -> Result<Vec<StockReservation>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(reservations::fetch_reservations_for_order(order_id, &mut conn).await?)
    }

    async fn subtract_stock(&self, items: &[(i64, i64)]) -> Result<(), CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        for (product_id, quantity) in items {
            products::subtract_stock(*product_id, *quantity, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Stock subtracted for {} products", items.len());
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<OrderSummary, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let summary = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Order #{} with {} line items and reservations committed",
            summary.order.id,
            summary.items.len()
        );
        Ok(summary)
    }

    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(id, &mut conn).await?)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_items(order_id, &mut conn).await?)
    }

    async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::search_orders(filter, &mut conn).await?)
    }

    async fn cancel_order(&self, id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::cancel_order(id, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn complete_order(&self, id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::complete_order(id, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn expire_orders(&self, older_than: DateTime<Utc>) -> Result<Vec<Order>, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let expired = orders::expire_orders(older_than, &mut tx).await?;
        tx.commit().await?;
        if !expired.is_empty() {
            debug!("🗃️ {} unpaid orders expired", expired.len());
        }
        Ok(expired)
    }
}

impl TransactionManagement for SqliteDatabase {
    async fn fetch_pending_transaction(
        &self,
        order_id: i64,
        user_id: i64,
    ) -> Result<Option<Transaction>, PaymentApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(transactions::fetch_pending_transaction(order_id, user_id, &mut conn).await?)
    }

    async fn insert_transaction(&self, tx: NewTransaction) -> Result<InsertTransactionResult, PaymentApiError> {
        let mut conn = self.pool.acquire().await?;
        transactions::insert_transaction(tx, &mut conn).await
    }

    async fn fetch_transaction_by_reference(&self, reference: &str) -> Result<Option<Transaction>, PaymentApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(transactions::fetch_transaction_by_reference(reference, &mut conn).await?)
    }

    async fn fetch_transactions_for_order(&self, order_id: i64) -> Result<Vec<Transaction>, PaymentApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(transactions::fetch_transactions_for_order(order_id, &mut conn).await?)
    }

    async fn settle_transaction(&self, reference: &str) -> Result<Option<SettlementOutcome>, PaymentApiError> {
        let mut tx = self.pool.begin().await?;
        let outcome = transactions::settle_transaction(reference, &mut tx).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn fail_transaction(&self, reference: &str) -> Result<Option<Transaction>, PaymentApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(transactions::fail_transaction(reference, &mut conn).await?)
    }
}

impl UserManagement for SqliteDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<User, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(user, &mut conn).await
    }

    async fn fetch_user(&self, id: i64) -> Result<Option<User>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_user(id, &mut conn).await?)
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_user_by_email(email, &mut conn).await?)
    }

    async fn fetch_users(&self) -> Result<Vec<User>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_users(&mut conn).await?)
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::update_user(id, update, &mut conn).await?)
    }

    async fn delete_user(&self, id: i64) -> Result<bool, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        users::delete_user(id, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `COFFEE_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}
