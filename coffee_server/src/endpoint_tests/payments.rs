use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use coffee_engine::{
    db_types::{OrderStatusType, PaymentStatus, Role, Transaction},
    events::EventProducers,
    test_utils::StaticProvider,
    InsertTransactionResult,
    PaymentApi,
};
use serde_json::json;

use super::{
    helpers::{authed_request, issue_token, order, timestamp, transaction, user},
    mocks::MockBackend,
};
use crate::routes::PayForOrderRoute;

fn configure(backend: MockBackend, provider: StaticProvider) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(PaymentApi::new(backend, provider, EventProducers::default())))
            .service(PayForOrderRoute::<MockBackend, StaticProvider>::new());
    }
}

fn backend_with_order(status: OrderStatusType) -> MockBackend {
    let mut backend = MockBackend::new();
    backend.expect_fetch_user().returning(|id| Ok(Some(user(id, "ada@example.com", "pw", Role::User))));
    backend.expect_fetch_order().returning(move |id| Ok(Some(order(id, 3, status, "30.00"))));
    backend
}

#[actix_web::test]
async fn pay_for_pending_order() {
    let provider = StaticProvider::new();
    let mut backend = backend_with_order(OrderStatusType::Pending);
    backend.expect_fetch_pending_transaction().returning(|_, _| Ok(None));
    backend.expect_insert_transaction().times(1).returning(|tx| {
        assert_eq!(tx.payment_id, format!("access_{}", tx.reference));
        Ok(InsertTransactionResult::Inserted(Transaction {
            id: 5,
            order_id: tx.order_id,
            user_id: tx.user_id,
            reference: tx.reference,
            payment_id: tx.payment_id,
            payment_reference: tx.payment_reference,
            payment_status: PaymentStatus::Pending,
            total_amount: tx.total_amount,
            created_at: timestamp(),
            updated_at: timestamp(),
            authorization_url: None,
        }))
    });
    let token = issue_token(3, Role::User);
    let req = TestRequest::post().uri("/orders/pay").set_json(json!({"order_id": 21}));
    let (status, body) = authed_request(&token, req, configure(backend, provider.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Transaction created successfully");
    let data = &body["data"];
    let reference = data["reference"].as_str().unwrap();
    assert_eq!(data["order_id"], 21);
    assert_eq!(data["payment_status"], "PENDING");
    assert_eq!(data["total_amount"], "30.00");
    assert_eq!(data["authorization_url"], format!("https://checkout.example.com/{reference}"));
    assert!(data.get("payment_id").is_none(), "the access code must stay internal");
    assert_eq!(provider.calls(), 1);
}

#[actix_web::test]
async fn paying_twice_returns_the_pending_transaction() {
    let provider = StaticProvider::new();
    let mut backend = backend_with_order(OrderStatusType::Pending);
    backend.expect_fetch_pending_transaction().returning(|order_id, _| {
        Ok(Some(transaction(&order(order_id, 3, OrderStatusType::Pending, "30.00"), "ref-1", PaymentStatus::Pending)))
    });
    backend.expect_insert_transaction().never();
    let token = issue_token(3, Role::User);
    let req = TestRequest::post().uri("/orders/pay").set_json(json!({"order_id": 21}));
    let (status, body) = authed_request(&token, req, configure(backend, provider.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reference"], "ref-1");
    assert!(body["data"].get("authorization_url").is_none());
    assert_eq!(provider.calls(), 0);
}

#[actix_web::test]
async fn pay_for_completed_order() {
    let provider = StaticProvider::new();
    let mut backend = backend_with_order(OrderStatusType::Completed);
    backend.expect_fetch_pending_transaction().never();
    backend.expect_insert_transaction().never();
    let token = issue_token(3, Role::User);
    let req = TestRequest::post().uri("/orders/pay").set_json(json!({"order_id": 21}));
    let (status, body) = authed_request(&token, req, configure(backend, provider.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Order #21 has already been processed and cannot be paid for");
    assert_eq!(provider.calls(), 0);
}

#[actix_web::test]
async fn pay_for_another_users_order() {
    let provider = StaticProvider::new();
    let backend = backend_with_order(OrderStatusType::Pending);
    let token = issue_token(4, Role::User);
    let req = TestRequest::post().uri("/orders/pay").set_json(json!({"order_id": 21}));
    let (status, body) = authed_request(&token, req, configure(backend, provider.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order #21 does not exist");
    assert_eq!(provider.calls(), 0);
}

#[actix_web::test]
async fn provider_failure_stores_nothing() {
    let provider = StaticProvider::new();
    provider.set_failing(true);
    let mut backend = backend_with_order(OrderStatusType::Pending);
    backend.expect_fetch_pending_transaction().returning(|_, _| Ok(None));
    backend.expect_insert_transaction().never();
    let token = issue_token(3, Role::User);
    let req = TestRequest::post().uri("/orders/pay").set_json(json!({"order_id": 21}));
    let (status, body) = authed_request(&token, req, configure(backend, provider.clone())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], false);
    assert_eq!(provider.calls(), 1);
}
