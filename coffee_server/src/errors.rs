use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use coffee_engine::{CatalogApiError, OrderFlowError, PaymentApiError, UserApiError};
use log::error;
use thiserror::Error;

use crate::data_objects::JsonResponse;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    InsufficientStock(String),
    #[error("{0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("{0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Could not issue access token. {0}")]
    CouldNotSerializeAccessToken(String),
    #[error("Insufficient permissions")]
    InsufficientPermissions(String),
    #[error("{0}")]
    ProviderError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientStock(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::ForbiddenPeer => StatusCode::FORBIDDEN,
                AuthError::InvalidSignature => StatusCode::FORBIDDEN,
            },
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotSerializeAccessToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ProviderError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(JsonResponse::failure(self))
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Authorization token not provided")]
    MissingToken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("Invalid token. {0}")]
    ValidationError(String),
    #[error("Invalid token. The token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Requests from this address are not allowed")]
    ForbiddenPeer,
    #[error("Invalid webhook signature")]
    InvalidSignature,
}

impl From<CatalogApiError> for ServerError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            CatalogApiError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogApiError::InvalidProduct(_) => Self::ValidationError(e.to_string()),
            CatalogApiError::ProductReserved(_) => Self::Conflict(e.to_string()),
            CatalogApiError::StockUnderflow { .. } => Self::InsufficientStock(e.to_string()),
            CatalogApiError::StockBelowReserved { .. } => Self::Conflict(e.to_string()),
        }
    }
}

impl From<UserApiError> for ServerError {
    fn from(e: UserApiError) -> Self {
        match e {
            UserApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            UserApiError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            UserApiError::EmailAlreadyExists(_) => Self::Conflict(e.to_string()),
            UserApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            UserApiError::InvalidRole => Self::ValidationError(e.to_string()),
            UserApiError::InvalidUser(_) => Self::ValidationError(e.to_string()),
            UserApiError::UserHasOrders(_) => Self::Conflict(e.to_string()),
            UserApiError::PasswordHashError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            OrderFlowError::CatalogError(e) => e.into(),
            OrderFlowError::UserError(e) => e.into(),
            OrderFlowError::InvalidRequest(_) => Self::ValidationError(e.to_string()),
            OrderFlowError::InvalidStatus(_) => Self::ValidationError(e.to_string()),
            OrderFlowError::NoProductsFound => Self::ValidationError(e.to_string()),
            OrderFlowError::InsufficientStock { .. } => Self::InsufficientStock(e.to_string()),
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::OrderAlreadyProcessed(_) => Self::Conflict(e.to_string()),
            OrderFlowError::ForbiddenTransition { .. } => Self::Conflict(e.to_string()),
        }
    }
}

impl From<PaymentApiError> for ServerError {
    fn from(e: PaymentApiError) -> Self {
        match e {
            PaymentApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            PaymentApiError::OrderError(e) => e.into(),
            PaymentApiError::UserError(e) => e.into(),
            PaymentApiError::OrderNotPayable(_) => Self::Conflict(e.to_string()),
            PaymentApiError::ProviderError(e) => {
                error!("💳️ Payment provider call failed. {e}");
                Self::ProviderError(e.to_string())
            },
            PaymentApiError::TransactionNotFound(_) => Self::NoRecordFound(e.to_string()),
        }
    }
}
