use crate::{
    api::errors::CatalogApiError,
    db_types::{NewProduct, Product, ProductUpdate, StockReservation},
};

/// The `CatalogManagement` trait defines the behaviour for managing the coffee catalog and the stock reservation
/// ledger.
///
/// Stock is only ever taken out of the catalog by [`Self::subtract_stock`], or when an order's reservations are
/// consumed on settlement. Placing an order merely reserves it.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogApiError>;

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, CatalogApiError>;

    /// All products, ordered by id.
    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogApiError>;

    /// Fetches every product in `ids` that exists, in a single query. Ids that do not exist are silently omitted.
    async fn fetch_products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>, CatalogApiError>;

    /// Applies a partial update. Returns `None` if the product does not exist.
    async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Option<Product>, CatalogApiError>;

    /// Removes a product from the catalog. Returns `false` if it did not exist.
    ///
    /// Fails with [`CatalogApiError::ProductReserved`] while unpaid orders hold reservations against it.
    async fn delete_product(&self, id: i64) -> Result<bool, CatalogApiError>;

    /// The total quantity of a product currently held by reservations.
    async fn reserved_quantity(&self, product_id: i64) -> Result<i64, CatalogApiError>;

    async fn fetch_reservations_for_order(&self, order_id: i64) -> Result<Vec<StockReservation>, CatalogApiError>;

    /// Subtracts each `(product_id, quantity)` pair from stock in one database transaction. If any product is missing,
    /// or would drop below zero, nothing is changed.
    async fn subtract_stock(&self, items: &[(i64, i64)]) -> Result<(), CatalogApiError>;
}
