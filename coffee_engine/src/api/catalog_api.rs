use std::fmt::Debug;

use log::*;

use crate::{
    api::errors::CatalogApiError,
    db::traits::CatalogManagement,
    db_types::{Money, NewProduct, Product, ProductUpdate},
};

/// `CatalogApi` manages the coffee catalog.
pub struct CatalogApi<B> {
    db: B,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl<B> CatalogApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

fn require_text(field: &str, value: &str) -> Result<(), CatalogApiError> {
    if value.trim().is_empty() {
        return Err(CatalogApiError::InvalidProduct(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// The most a single unit of coffee may cost, in Naira.
const MAX_PRICE: i64 = 1_000_000_000;

fn require_price(price: &Money) -> Result<(), CatalogApiError> {
    if !price.is_positive() {
        return Err(CatalogApiError::InvalidProduct(format!("price must be greater than zero, not {price}")));
    }
    if *price > Money::from(MAX_PRICE) {
        return Err(CatalogApiError::InvalidProduct(format!("price cannot be more than {MAX_PRICE}, not {price}")));
    }
    // Charges are made in kobo
    if price.scale() > 2 {
        return Err(CatalogApiError::InvalidProduct(format!("price cannot have more than 2 decimal places ({price})")));
    }
    Ok(())
}

fn require_quantity(quantity: i64) -> Result<(), CatalogApiError> {
    if quantity < 0 {
        return Err(CatalogApiError::InvalidProduct(format!("quantity cannot be negative ({quantity})")));
    }
    Ok(())
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogApiError> {
        require_text("brand", &product.brand)?;
        require_text("name", &product.name)?;
        require_text("description", &product.description)?;
        require_price(&product.price)?;
        require_quantity(product.quantity)?;
        let product = self.db.insert_product(product).await?;
        info!("🔄️☕️ Product #{} '{}' added to the catalog", product.id, product.name);
        Ok(product)
    }

    pub async fn fetch_product(&self, id: i64) -> Result<Product, CatalogApiError> {
        self.db.fetch_product(id).await?.ok_or(CatalogApiError::ProductNotFound(id))
    }

    pub async fn fetch_products(&self) -> Result<Vec<Product>, CatalogApiError> {
        self.db.fetch_products().await
    }

    /// Only the products that exist are returned.
    pub async fn fetch_products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>, CatalogApiError> {
        self.db.fetch_products_by_ids(ids).await
    }

    pub async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Product, CatalogApiError> {
        if let Some(brand) = &update.brand {
            require_text("brand", brand)?;
        }
        if let Some(name) = &update.name {
            require_text("name", name)?;
        }
        if let Some(description) = &update.description {
            require_text("description", description)?;
        }
        if let Some(price) = &update.price {
            require_price(price)?;
        }
        if let Some(quantity) = update.quantity {
            require_quantity(quantity)?;
        }
        let product = self.db.update_product(id, update).await?.ok_or(CatalogApiError::ProductNotFound(id))?;
        debug!("🔄️☕️ Product #{id} updated");
        Ok(product)
    }

    pub async fn delete_product(&self, id: i64) -> Result<(), CatalogApiError> {
        if self.db.delete_product(id).await? {
            info!("🔄️☕️ Product #{id} removed from the catalog");
            Ok(())
        } else {
            Err(CatalogApiError::ProductNotFound(id))
        }
    }

    /// Stock that is neither sold nor reserved by an unpaid order.
    pub async fn available_stock(&self, product_id: i64) -> Result<i64, CatalogApiError> {
        let product = self.fetch_product(product_id).await?;
        let reserved = self.db.reserved_quantity(product_id).await?;
        Ok(product.quantity - reserved)
    }

    pub async fn subtract_stock(&self, items: &[(i64, i64)]) -> Result<(), CatalogApiError> {
        self.db.subtract_stock(items).await
    }
}
