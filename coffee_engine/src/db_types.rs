use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use coffee_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------        Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    /// A regular customer. Can browse the catalog, and place, pay for and cancel their own orders.
    User,
    /// Store administrator. Manages the catalog, users and order statuses.
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------      Principal       ---------------------------------------------------------
/// The authenticated identity behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins hold every role. Users only hold [`Role::User`].
    pub fn has_role(&self, role: Role) -> bool {
        match role {
            Role::User => true,
            Role::Admin => self.is_admin(),
        }
    }

    /// True if this principal may see or act on a resource owned by `owner_id`.
    pub fn can_access(&self, owner_id: i64) -> bool {
        self.is_admin() || self.user_id == owner_id
    }
}

//--------------------------------------        User          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.role)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Must already be hashed. Raw passwords never reach the database layer.
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub first_name: String,
    pub last_name: String,
}

//--------------------------------------       Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub brand: String,
    pub name: String,
    pub description: String,
    pub price: Money,
    /// Units in stock, including units currently reserved by unpaid orders.
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub brand: String,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub quantity: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(brand: S, name: S, description: S, price: Money, quantity: i64) -> Self {
        Self { brand: brand.into(), name: name.into(), description: description.into(), price, quantity }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub brand: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub quantity: Option<i64>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.brand.is_none() &&
            self.name.is_none() &&
            self.description.is_none() &&
            self.price.is_none() &&
            self.quantity.is_none()
    }

    pub fn with_brand<S: Into<String>>(mut self, brand: S) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }
}

//--------------------------------------   StockReservation   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct StockReservation {
    pub id: i64,
    pub product_id: i64,
    pub order_id: i64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------   OrderStatusType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been placed, and stock is reserved for it. No payment has settled yet.
    Pending,
    /// Payment for the order has settled and the reserved stock has been taken out of the catalog.
    Completed,
    /// The order was cancelled by the user, an admin, or because it went unpaid for too long.
    Canceled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatusType::Pending)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "PENDING"),
            OrderStatusType::Completed => write!(f, "COMPLETED"),
            OrderStatusType::Canceled => write!(f, "CANCELED"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELED" => Ok(Self::Canceled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatusType,
    /// Snapshot of the order value at the time it was placed. It is never recomputed.
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    #[serde(rename = "coffee_id")]
    pub product_id: i64,
    /// Product name at the time of ordering
    pub name: String,
    pub quantity: i64,
    /// Unit price at the time of ordering
    pub unit_price: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl NewOrderItem {
    /// `None` if the subtotal cannot be represented.
    pub fn subtotal(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: i64,
    pub total_amount: Money,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    /// Builds a new order from priced line items. The total is the exact sum of the line subtotals.
    ///
    /// Returns `None` if a subtotal or the total overflows.
    pub fn from_items(user_id: i64, items: Vec<NewOrderItem>) -> Option<Self> {
        let total_amount = items.iter().try_fold(Money::default(), |total, item| total.checked_add(item.subtotal()?))?;
        Some(Self { user_id, total_amount, items })
    }
}

/// One line of a shopping cart, as submitted by a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "coffee_id")]
    pub product_id: i64,
    pub quantity: i64,
}

impl CartItem {
    pub fn new(product_id: i64, quantity: i64) -> Self {
        Self { product_id, quantity }
    }
}

//--------------------------------------    PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::Processing => write!(f, "PROCESSING"),
            PaymentStatus::Completed => write!(f, "COMPLETED"),
            PaymentStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------     Transaction      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub order_id: i64,
    pub user_id: i64,
    /// Locally generated idempotency reference, sent to the provider
    pub reference: String,
    /// The provider's access code for the hosted checkout. Internal only.
    #[serde(skip_serializing, default)]
    pub payment_id: String,
    pub payment_reference: String,
    pub payment_status: PaymentStatus,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Supplied by the provider on a fresh initiation only. It is never persisted.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub authorization_url: Option<String>,
}

impl Transaction {
    pub fn with_authorization_url(mut self, url: String) -> Self {
        self.authorization_url = Some(url);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub order_id: i64,
    pub user_id: i64,
    pub reference: String,
    pub payment_id: String,
    pub payment_reference: String,
    pub total_amount: Money,
}
