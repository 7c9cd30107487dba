use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use coffee_engine::{
    db_types::{OrderItem, OrderStatusType, Role},
    events::EventProducers,
    order_objects::OrderSummary,
    OrderFlowApi,
};
use serde_json::json;

use super::{
    helpers::{authed_request, issue_token, money, order, order_item, product, timestamp, user},
    mocks::MockBackend,
};
use crate::routes::{CancelOrderRoute, CreateOrderRoute, MyOrdersRoute, OrderByIdRoute, UpdateOrderStatusRoute};

fn configure(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(OrderFlowApi::new(backend, EventProducers::default())))
            .service(CreateOrderRoute::<MockBackend>::new())
            .service(MyOrdersRoute::<MockBackend>::new())
            .service(CancelOrderRoute::<MockBackend>::new())
            .service(OrderByIdRoute::<MockBackend>::new())
            .service(UpdateOrderStatusRoute::<MockBackend>::new());
    }
}

/// A backend holding user #3, an Espresso (#1, 10.00, 5 in stock) and a Flat White (#2, 12.50, 8 in stock, 2 reserved).
fn stocked_backend() -> MockBackend {
    let mut backend = MockBackend::new();
    backend.expect_fetch_user().returning(|id| Ok((id == 3).then(|| user(3, "ada@example.com", "pw", Role::User))));
    backend.expect_fetch_products_by_ids().returning(|ids| {
        let catalog = [product(1, "Espresso", "10.00", 5), product(2, "Flat White", "12.50", 8)];
        Ok(catalog.into_iter().filter(|p| ids.contains(&p.id)).collect())
    });
    backend.expect_reserved_quantity().returning(|id| Ok(if id == 2 { 2 } else { 0 }));
    backend
}

#[actix_web::test]
async fn place_order() {
    let mut backend = stocked_backend();
    backend.expect_insert_order().times(1).returning(|new_order| {
        assert_eq!(new_order.user_id, 3);
        assert_eq!(new_order.total_amount, money("55.00"));
        let order = order(21, new_order.user_id, OrderStatusType::Pending, "55.00");
        let items = new_order
            .items
            .into_iter()
            .enumerate()
            .map(|(i, line)| OrderItem {
                id: i as i64 + 1,
                order_id: 21,
                product_id: line.product_id,
                name: line.name,
                quantity: line.quantity,
                unit_price: line.unit_price,
                created_at: timestamp(),
            })
            .collect();
        Ok(OrderSummary::new(order, items))
    });
    let token = issue_token(3, Role::User);
    let req = TestRequest::post().uri("/orders").set_json(json!({"coffees": [
        {"coffee_id": 1, "quantity": 1},
        {"coffee_id": 2, "quantity": 2},
        {"coffee_id": 1, "quantity": 2}
    ]}));
    let (status, body) = authed_request(&token, req, configure(backend)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Order created successfully");
    assert_eq!(body["data"]["id"], 21);
    assert_eq!(body["data"]["status"], "PENDING");
    assert_eq!(body["data"]["total_amount"], "55.00");
    assert_eq!(body["data"]["items"][0]["coffee_id"], 1);
    assert_eq!(body["data"]["items"][0]["quantity"], 3);
    assert_eq!(body["data"]["items"][1]["unit_price"], "12.50");
}

#[actix_web::test]
async fn place_order_with_insufficient_stock() {
    let mut backend = stocked_backend();
    backend.expect_insert_order().never();
    let token = issue_token(3, Role::User);
    // Only 6 Flat Whites are available once the reserved ones are taken out
    let req = TestRequest::post().uri("/orders").set_json(json!({"coffees": [{"coffee_id": 2, "quantity": 7}]}));
    let (status, body) = authed_request(&token, req, configure(backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "The quantity specified for 'Flat White' is more than the quantity in stock: 7 (specified) for 6 (in stock)"
    );
}

#[actix_web::test]
async fn place_order_for_unknown_coffees() {
    let mut backend = stocked_backend();
    backend.expect_insert_order().never();
    let token = issue_token(3, Role::User);
    let req = TestRequest::post().uri("/orders").set_json(json!({"coffees": [{"coffee_id": 99, "quantity": 1}]}));
    let (status, body) = authed_request(&token, req, configure(backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "none of the coffee products specified was found");
}

#[actix_web::test]
async fn place_empty_order() {
    let mut backend = stocked_backend();
    backend.expect_insert_order().never();
    let token = issue_token(3, Role::User);
    let req = TestRequest::post().uri("/orders").set_json(json!({"coffees": []}));
    let (status, body) = authed_request(&token, req, configure(backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid request: the order must contain at least one coffee");
}

#[actix_web::test]
async fn fetch_my_orders() {
    let mut backend = MockBackend::new();
    backend.expect_search_orders().times(1).returning(|filter| {
        assert_eq!(filter.user_id, Some(3));
        Ok(vec![order(21, 3, OrderStatusType::Pending, "10.00")])
    });
    backend
        .expect_fetch_order_items()
        .returning(|order_id| Ok(vec![order_item(order_id, &product(1, "Espresso", "10.00", 5), 1)]));
    let token = issue_token(3, Role::User);
    let (status, body) = authed_request(&token, TestRequest::get().uri("/orders"), configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order fetched successfully");
    assert_eq!(body["data"][0]["id"], 21);
    assert_eq!(body["data"][0]["items"][0]["name"], "Espresso");
}

#[actix_web::test]
async fn another_users_order_is_not_found() {
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|id| Ok(Some(order(id, 8, OrderStatusType::Pending, "10.00"))));
    backend.expect_fetch_order_items().never();
    let token = issue_token(3, Role::User);
    let (status, body) = authed_request(&token, TestRequest::get().uri("/orders/21"), configure(backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order #21 does not exist");
}

#[actix_web::test]
async fn admin_can_see_any_order() {
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|id| Ok(Some(order(id, 8, OrderStatusType::Completed, "10.00"))));
    backend.expect_fetch_order_items().returning(|_| Ok(vec![]));
    let token = issue_token(1, Role::Admin);
    let (status, body) = authed_request(&token, TestRequest::get().uri("/orders/21"), configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], 8);
    assert_eq!(body["data"]["status"], "COMPLETED");
}

#[actix_web::test]
async fn cancel_route_is_not_shadowed_by_order_id_route() {
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|id| Ok(Some(order(id, 3, OrderStatusType::Pending, "10.00"))));
    backend.expect_cancel_order().times(1).returning(|id| Ok(Some(order(id, 3, OrderStatusType::Canceled, "10.00"))));
    backend.expect_complete_order().never();
    let token = issue_token(3, Role::User);
    let req = TestRequest::patch().uri("/orders/cancel").set_json(json!({"order_id": 21}));
    let (status, body) = authed_request(&token, req, configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order canceled successfully");
    assert_eq!(body["data"]["status"], "CANCELED");
}

#[actix_web::test]
async fn cancel_processed_order() {
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|id| Ok(Some(order(id, 3, OrderStatusType::Completed, "10.00"))));
    backend.expect_cancel_order().never();
    let token = issue_token(3, Role::User);
    let req = TestRequest::patch().uri("/orders/cancel").set_json(json!({"order_id": 21}));
    let (status, body) = authed_request(&token, req, configure(backend)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "You cannot cancel this order again since it has already been processed. Please contact admin"
    );
}

#[actix_web::test]
async fn update_order_status_as_admin() {
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|id| Ok(Some(order(id, 3, OrderStatusType::Pending, "10.00"))));
    backend
        .expect_complete_order()
        .times(1)
        .returning(|id| Ok(Some(order(id, 3, OrderStatusType::Completed, "10.00"))));
    let token = issue_token(1, Role::Admin);
    let req = TestRequest::patch().uri("/orders/21").set_json(json!({"status": "COMPLETED"}));
    let (status, body) = authed_request(&token, req, configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order updated successfully");
    assert_eq!(body["data"]["status"], "COMPLETED");
}

#[actix_web::test]
async fn update_order_status_without_status() {
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().never();
    let token = issue_token(1, Role::Admin);
    let req = TestRequest::patch().uri("/orders/21").set_json(json!({}));
    let (status, body) = authed_request(&token, req, configure(backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No status was specified");
}

#[actix_web::test]
async fn update_order_status_as_user() {
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().never();
    let token = issue_token(3, Role::User);
    let req = TestRequest::patch().uri("/orders/21").set_json(json!({"status": "COMPLETED"}));
    let (status, _) = authed_request(&token, req, configure(backend)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn order_id_must_be_numeric() {
    let token = issue_token(3, Role::User);
    let (status, body) =
        authed_request(&token, TestRequest::get().uri("/orders/abc"), configure(MockBackend::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Could not read request path"));
}
