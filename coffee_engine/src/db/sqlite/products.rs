use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use super::{
    errors::{is_check_violation, is_foreign_key_violation},
    reservations,
};
use crate::{
    api::errors::CatalogApiError,
    db_types::{NewProduct, Product, ProductUpdate},
};

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, CatalogApiError> {
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (brand, name, description, price, quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(product.brand)
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.quantity)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Product '{}' inserted with id {}", product.name, product.id);
    Ok(product)
}

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_products(conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products ORDER BY id").fetch_all(conn).await
}

/// Fetches all products whose ids appear in `ids` in a single query.
pub async fn fetch_products_by_ids(ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM products WHERE id IN (");
    let mut list = builder.separated(", ");
    for id in ids {
        list.push_bind(*id);
    }
    builder.push(") ORDER BY id");
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build_query_as::<Product>().fetch_all(conn).await
}

pub async fn update_product(
    id: i64,
    update: ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, CatalogApiError> {
    if update.is_empty() {
        debug!("🗃️ No fields to update for product #{id}. Update request skipped.");
        return Ok(fetch_product(id, conn).await?);
    }
    let mut builder = QueryBuilder::new("UPDATE products SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(brand) = update.brand {
        set_clause.push("brand = ");
        set_clause.push_bind_unseparated(brand);
    }
    if let Some(name) = update.name {
        set_clause.push("name = ");
        set_clause.push_bind_unseparated(name);
    }
    if let Some(description) = update.description {
        set_clause.push("description = ");
        set_clause.push_bind_unseparated(description);
    }
    if let Some(price) = update.price {
        set_clause.push("price = ");
        set_clause.push_bind_unseparated(price);
    }
    if let Some(quantity) = update.quantity {
        set_clause.push("quantity = ");
        set_clause.push_bind_unseparated(quantity);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    // Stock may never drop below what unpaid orders already hold
    if let Some(quantity) = update.quantity {
        builder.push(" AND ");
        builder.push_bind(quantity);
        builder.push(
            " >= COALESCE((SELECT SUM(r.quantity) FROM stock_reservations r WHERE r.product_id = products.id), 0)",
        );
    }
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let product = builder.build_query_as::<Product>().fetch_optional(&mut *conn).await?;
    if product.is_some() {
        return Ok(product);
    }
    let Some(quantity) = update.quantity else {
        return Ok(None);
    };
    if fetch_product(id, &mut *conn).await?.is_none() {
        return Ok(None);
    }
    let reserved = reservations::reserved_quantity(id, conn).await?;
    debug!("🗃️ Refusing to set the stock of product #{id} to {quantity}. {reserved} units are reserved.");
    Err(CatalogApiError::StockBelowReserved { product_id: id, quantity, reserved })
}

pub async fn delete_product(id: i64, conn: &mut SqliteConnection) -> Result<bool, CatalogApiError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(conn).await.map_err(|e| {
        if is_foreign_key_violation(&e) {
            CatalogApiError::ProductReserved(id)
        } else {
            CatalogApiError::from(e)
        }
    })?;
    Ok(result.rows_affected() > 0)
}

/// Removes `quantity` units of product `id` from stock. This is not atomic on its own; run it inside a transaction when
/// several products must change together.
pub async fn subtract_stock(id: i64, quantity: i64, conn: &mut SqliteConnection) -> Result<(), CatalogApiError> {
    if quantity < 0 {
        return Err(CatalogApiError::InvalidProduct(format!("cannot subtract a negative quantity ({quantity})")));
    }
    let result =
        sqlx::query("UPDATE products SET quantity = quantity - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
            .bind(quantity)
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| {
                if is_check_violation(&e) {
                    CatalogApiError::StockUnderflow { product_id: id, requested: quantity }
                } else {
                    CatalogApiError::from(e)
                }
            })?;
    if result.rows_affected() == 0 {
        return Err(CatalogApiError::ProductNotFound(id));
    }
    trace!("🗃️ Subtracted {quantity} units from stock of product #{id}");
    Ok(())
}
