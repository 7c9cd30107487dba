use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{DateTime, Duration, TimeZone, Utc};
use coffee_engine::{
    db_types::{Money, Order, OrderItem, OrderStatusType, PaymentStatus, Product, Role, Transaction, User},
    helpers::hash_password,
};
use log::debug;
use serde_json::Value;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::AuthConfig,
    middleware::JwtMiddlewareFactory,
    server::{json_config, path_config},
};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new("endpoint-tests-only-secret-3c1f0e2d9a8b7c6d5e4f", Duration::hours(1))
}

pub fn issue_token(user_id: i64, role: Role) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(JwtClaims::new(user_id, role), None).expect("Failed to sign token")
}

/// Sends `req` to an app holding the routes in `configure`, without any token checks.
pub async fn public_request<F>(req: TestRequest, configure: F) -> (StatusCode, Value)
where F: FnOnce(&mut ServiceConfig) {
    let _ = env_logger::try_init();
    let app = App::new()
        .app_data(json_config())
        .app_data(path_config())
        .app_data(web::Data::new(TokenIssuer::new(&get_auth_config())))
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    (status, body_json(res.into_body().try_into_bytes().unwrap_or_default().as_ref()))
}

/// Sends `req` with the given bearer token to an app where the routes in `configure` sit behind the JWT middleware.
/// An empty token sends no `Authorization` header.
pub async fn authed_request<F>(token: &str, req: TestRequest, configure: F) -> (StatusCode, Value)
where F: FnOnce(&mut ServiceConfig) {
    let _ = env_logger::try_init();
    let req = if token.is_empty() { req } else { req.insert_header(("Authorization", format!("Bearer {token}"))) };
    let issuer = TokenIssuer::new(&get_auth_config());
    let app = App::new()
        .app_data(json_config())
        .app_data(path_config())
        .service(web::scope("").wrap(JwtMiddlewareFactory::new(issuer)).configure(configure));
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    (status, body_json(res.into_body().try_into_bytes().unwrap_or_default().as_ref()))
}

pub fn body_json(bytes: &[u8]) -> Value {
    serde_json::from_slice::<Value>(bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

pub fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 14, 9, 0, 0).unwrap()
}

pub fn money(s: &str) -> Money {
    s.parse().unwrap()
}

pub fn user(id: i64, email: &str, password: &str, role: Role) -> User {
    User {
        id,
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: email.into(),
        password_hash: hash_password(password).unwrap(),
        role,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub fn product(id: i64, name: &str, price: &str, quantity: i64) -> Product {
    Product {
        id,
        brand: "Kaldi".into(),
        name: name.into(),
        description: "Freshly roasted".into(),
        price: money(price),
        quantity,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub fn order(id: i64, user_id: i64, status: OrderStatusType, total: &str) -> Order {
    Order { id, user_id, status, total_amount: money(total), created_at: timestamp(), updated_at: timestamp() }
}

pub fn order_item(order_id: i64, product: &Product, quantity: i64) -> OrderItem {
    OrderItem {
        id: 1,
        order_id,
        product_id: product.id,
        name: product.name.clone(),
        quantity,
        unit_price: product.price,
        created_at: timestamp(),
    }
}

pub fn transaction(order: &Order, reference: &str, status: PaymentStatus) -> Transaction {
    Transaction {
        id: 1,
        order_id: order.id,
        user_id: order.user_id,
        reference: reference.into(),
        payment_id: format!("access_{reference}"),
        payment_reference: reference.into(),
        payment_status: status,
        total_amount: order.total_amount,
        created_at: timestamp(),
        updated_at: timestamp(),
        authorization_url: None,
    }
}
