use std::fmt::Display;

use coffee_engine::db_types::CartItem;
use serde::{Deserialize, Serialize};

/// The envelope every endpoint answers with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse<T> {
    pub status: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> JsonResponse<T> {
    pub fn success<S: Display>(message: S, data: T) -> Self {
        Self { status: true, message: message.to_string(), data: Some(data) }
    }
}

impl JsonResponse<()> {
    pub fn failure<S: Display>(message: S) -> Self {
        Self { status: false, message: message.to_string(), data: None }
    }

    pub fn message<S: Display>(message: S) -> Self {
        Self { status: true, message: message.to_string(), data: None }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest").field("email", &self.email).field("password", &"****").finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub coffees: Vec<CartItem>,
}

/// Body of `PATCH /orders/cancel` and `POST /orders/pay`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderIdRequest {
    pub order_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    #[serde(default)]
    pub status: String,
}
