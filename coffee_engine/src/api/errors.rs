use thiserror::Error;

use crate::provider::PaymentProviderError;

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Coffee product #{0} does not exist")]
    ProductNotFound(i64),
    #[error("Invalid product: {0}")]
    InvalidProduct(String),
    #[error("Coffee product #{0} is reserved by unpaid orders and cannot be removed")]
    ProductReserved(i64),
    #[error("Not enough stock of coffee product #{product_id} to subtract {requested} units")]
    StockUnderflow { product_id: i64, requested: i64 },
    #[error(
        "The stock of coffee product #{product_id} cannot be set to {quantity}, since {reserved} units are reserved by \
         unpaid orders"
    )]
    StockBelowReserved { product_id: i64, quantity: i64, reserved: i64 },
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum UserApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User #{0} does not exist")]
    UserNotFound(i64),
    #[error("A user with the email {0} already exists")]
    EmailAlreadyExists(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid role entered")]
    InvalidRole,
    #[error("Invalid user: {0}")]
    InvalidUser(String),
    #[error("User #{0} has orders on record and cannot be deleted")]
    UserHasOrders(i64),
    #[error("Could not hash password: {0}")]
    PasswordHashError(String),
}

impl From<sqlx::Error> for UserApiError {
    fn from(e: sqlx::Error) -> Self {
        UserApiError::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    CatalogError(#[from] CatalogApiError),
    #[error("{0}")]
    UserError(#[from] UserApiError),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("none of the coffee products specified was found")]
    NoProductsFound,
    #[error(
        "The quantity specified for '{name}' is more than the quantity in stock: {requested} (specified) for \
         {available} (in stock)"
    )]
    InsufficientStock { product_id: i64, name: String, requested: i64, available: i64 },
    #[error("Order #{0} does not exist")]
    OrderNotFound(i64),
    #[error("Invalid order status: {0}")]
    InvalidStatus(String),
    #[error("You cannot cancel this order again since it has already been processed. Please contact admin")]
    OrderAlreadyProcessed(i64),
    #[error("Order #{id} cannot move from {from} to {to}")]
    ForbiddenTransition { id: i64, from: String, to: String },
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    OrderError(#[from] OrderFlowError),
    #[error("{0}")]
    UserError(#[from] UserApiError),
    #[error("Order #{0} has already been processed and cannot be paid for")]
    OrderNotPayable(i64),
    #[error("Payment provider error: {0}")]
    ProviderError(#[from] PaymentProviderError),
    #[error("No transaction exists with reference {0}")]
    TransactionNotFound(String),
}

impl From<sqlx::Error> for PaymentApiError {
    fn from(e: sqlx::Error) -> Self {
        PaymentApiError::DatabaseError(e.to_string())
    }
}
