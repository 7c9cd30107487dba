use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use coffee_common::Secret;
use coffee_engine::{
    db_types::{OrderStatusType, PaymentStatus},
    events::EventProducers,
    test_utils::StaticProvider,
    PaymentApi,
    PaymentApiError,
    SettlementOutcome,
};
use paystack_tools::helpers::calculate_signature;
use serde_json::json;

use super::{
    helpers::{order, public_request, transaction},
    mocks::MockBackend,
};
use crate::{
    config::ServerOptions,
    middleware::{HmacMiddlewareFactory, IpWhitelistMiddlewareFactory},
    routes::PaystackWebhookRoute,
    server::PAYSTACK_SIGNATURE_HEADER,
};

const SECRET: &str = "sk_test_endpoint_tests_only";
const PAYSTACK_IP: &str = "52.31.139.75";

fn configure(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let whitelist = Some(vec![PAYSTACK_IP.parse().unwrap()]);
        let scope = web::scope("/webhook")
            .wrap(HmacMiddlewareFactory::new(PAYSTACK_SIGNATURE_HEADER, Secret::new(SECRET.to_string()), true))
            .wrap(IpWhitelistMiddlewareFactory::new(whitelist, ServerOptions::default()))
            .service(PaystackWebhookRoute::<MockBackend, StaticProvider>::new());
        cfg.app_data(web::Data::new(PaymentApi::new(backend, StaticProvider::new(), EventProducers::default())))
            .service(scope);
    }
}

fn webhook_request(body: &str, signature: Option<String>, peer: &str) -> TestRequest {
    let peer = format!("{peer}:443").parse::<SocketAddr>().unwrap();
    let req = TestRequest::post()
        .uri("/webhook/paystack")
        .peer_addr(peer)
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.to_string());
    match signature {
        Some(sig) => req.insert_header((PAYSTACK_SIGNATURE_HEADER, sig)),
        None => req,
    }
}

fn charge_event(event: &str, reference: &str) -> String {
    json!({"event": event, "data": {"reference": reference, "status": "success", "amount": 3000}}).to_string()
}

/// Counts settle calls and answers them as a freshly settled payment.
fn settling_backend(settles: Arc<AtomicUsize>) -> MockBackend {
    let mut backend = MockBackend::new();
    backend.expect_settle_transaction().returning(move |reference| {
        settles.fetch_add(1, Ordering::SeqCst);
        let order = order(21, 3, OrderStatusType::Completed, "30.00");
        let tx = transaction(&order, reference, PaymentStatus::Completed);
        Ok(Some(SettlementOutcome::Settled { transaction: tx, order }))
    });
    backend
}

#[actix_web::test]
async fn signed_charge_success_settles_payment() {
    let settles = Arc::new(AtomicUsize::new(0));
    let body = charge_event("charge.success", "ref-1");
    let signature = calculate_signature(SECRET, body.as_bytes());
    let req = webhook_request(&body, Some(signature), PAYSTACK_IP);
    let (status, body) = public_request(req, configure(settling_backend(settles.clone()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": true, "message": "Webhook received", "data": null}));
    assert_eq!(settles.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn signature_header_is_case_insensitive() {
    let settles = Arc::new(AtomicUsize::new(0));
    let body = charge_event("charge.success", "ref-1");
    let signature = calculate_signature(SECRET, body.as_bytes()).to_uppercase();
    let req = webhook_request(&body, Some(signature), PAYSTACK_IP);
    let (status, _) = public_request(req, configure(settling_backend(settles.clone()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settles.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn bad_signature_is_rejected() {
    let settles = Arc::new(AtomicUsize::new(0));
    let body = charge_event("charge.success", "ref-1");
    let signature = calculate_signature("not-the-secret", body.as_bytes());
    let req = webhook_request(&body, Some(signature), PAYSTACK_IP);
    let (status, body) = public_request(req, configure(settling_backend(settles.clone()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Invalid webhook signature");
    assert_eq!(settles.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn missing_signature_is_rejected() {
    let settles = Arc::new(AtomicUsize::new(0));
    let req = webhook_request(&charge_event("charge.success", "ref-1"), None, PAYSTACK_IP);
    let (status, _) = public_request(req, configure(settling_backend(settles.clone()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(settles.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn unknown_peer_is_rejected() {
    let settles = Arc::new(AtomicUsize::new(0));
    let body = charge_event("charge.success", "ref-1");
    let signature = calculate_signature(SECRET, body.as_bytes());
    let req = webhook_request(&body, Some(signature), "203.0.113.9");
    let (status, body) = public_request(req, configure(settling_backend(settles.clone()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Requests from this address are not allowed");
    assert_eq!(settles.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn charge_failed_marks_payment_failed() {
    let mut backend = MockBackend::new();
    backend.expect_settle_transaction().never();
    backend.expect_fail_transaction().times(1).returning(|reference| {
        let order = order(21, 3, OrderStatusType::Pending, "30.00");
        Ok(Some(transaction(&order, reference, PaymentStatus::Failed)))
    });
    let body = charge_event("charge.failed", "ref-2");
    let signature = calculate_signature(SECRET, body.as_bytes());
    let (status, _) = public_request(webhook_request(&body, Some(signature), PAYSTACK_IP), configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn other_events_are_acknowledged_and_ignored() {
    let mut backend = MockBackend::new();
    backend.expect_settle_transaction().never();
    backend.expect_fail_transaction().never();
    let body = charge_event("transfer.success", "ref-3");
    let signature = calculate_signature(SECRET, body.as_bytes());
    let (status, body) =
        public_request(webhook_request(&body, Some(signature), PAYSTACK_IP), configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Webhook received");
}

#[actix_web::test]
async fn unknown_reference_is_still_acknowledged() {
    let mut backend = MockBackend::new();
    backend.expect_settle_transaction().times(1).returning(|_| Ok(None));
    let body = charge_event("charge.success", "ref-unknown");
    let signature = calculate_signature(SECRET, body.as_bytes());
    let (status, _) = public_request(webhook_request(&body, Some(signature), PAYSTACK_IP), configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn unparseable_body_is_still_acknowledged() {
    let mut backend = MockBackend::new();
    backend.expect_settle_transaction().never();
    let body = "{\"event\": \"charge.success\"";
    let signature = calculate_signature(SECRET, body.as_bytes());
    let (status, _) = public_request(webhook_request(body, Some(signature), PAYSTACK_IP), configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn database_failure_asks_for_redelivery() {
    let mut backend = MockBackend::new();
    backend
        .expect_settle_transaction()
        .times(1)
        .returning(|_| Err(PaymentApiError::DatabaseError("database is locked".into())));
    let body = charge_event("charge.success", "ref-4");
    let signature = calculate_signature(SECRET, body.as_bytes());
    let (status, body) =
        public_request(webhook_request(&body, Some(signature), PAYSTACK_IP), configure(backend)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], false);
    assert_eq!(body["message"], "An error occurred on the backend of the server. Database error: database is locked");
}

#[actix_web::test]
async fn rejected_notification_is_not_redelivered() {
    let mut backend = MockBackend::new();
    backend.expect_settle_transaction().times(1).returning(|_| Err(PaymentApiError::OrderNotPayable(21)));
    let body = charge_event("charge.success", "ref-5");
    let signature = calculate_signature(SECRET, body.as_bytes());
    let (status, _) = public_request(webhook_request(&body, Some(signature), PAYSTACK_IP), configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
}
