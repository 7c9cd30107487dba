use coffee_engine::{
    db_types::{CartItem, OrderStatusType, PaymentStatus},
    TransactionManagement,
};
use cucumber::{then, when};

use crate::cucumber::CoffeeWorld;

#[when(expr = "{word} orders {int} {word}")]
async fn place_order(world: &mut CoffeeWorld, user: String, quantity: i64, coffee: String) {
    let cart = vec![CartItem::new(world.product(&coffee).id, quantity)];
    order_cart(world, &user, cart).await;
}

#[when(expr = "{word} orders {int} {word} and {int} {word}")]
async fn place_order_of_two(world: &mut CoffeeWorld, user: String, q1: i64, c1: String, q2: i64, c2: String) {
    let cart = vec![CartItem::new(world.product(&c1).id, q1), CartItem::new(world.product(&c2).id, q2)];
    order_cart(world, &user, cart).await;
}

async fn order_cart(world: &mut CoffeeWorld, user: &str, cart: Vec<CartItem>) {
    let user_id = world.user(user).id;
    let result = world.store().orders.place_order(user_id, cart).await;
    match result {
        Ok(summary) => {
            world.last_order = Some(summary);
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when(expr = "{word} cancels the order")]
async fn cancel_order(world: &mut CoffeeWorld, user: String) {
    let principal = world.user(&user).principal();
    let order_id = world.last_order_id();
    let result = world.store().orders.cancel_order(&principal, order_id).await;
    match result {
        Ok(_) => world.last_error = None,
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when(expr = "the admin marks the order as {word}")]
async fn admin_status_update(world: &mut CoffeeWorld, status: String) {
    let order_id = world.last_order_id();
    let result = world.store().orders.update_order_status(order_id, &status).await;
    match result {
        Ok(_) => world.last_error = None,
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when(expr = "{word} pays for the order")]
async fn pay_for_order(world: &mut CoffeeWorld, user: String) {
    let user_id = world.user(&user).id;
    let order_id = world.last_order_id();
    let result = world.store().payments.initiate_payment(user_id, order_id).await;
    match result {
        Ok(tx) => {
            if let Some(previous) = &world.last_transaction {
                if previous.order_id == tx.order_id && previous.payment_status == PaymentStatus::Pending {
                    assert_eq!(previous.reference, tx.reference, "A second pending transaction was created");
                }
            }
            world.last_transaction = Some(tx);
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when("the payment provider confirms the payment")]
async fn payment_succeeds(world: &mut CoffeeWorld) {
    let reference = world.last_transaction.as_ref().expect("No payment was initiated").reference.clone();
    let tx = world.store().payments.settle_payment(&reference).await.expect("Error settling payment");
    world.last_transaction = Some(tx);
}

#[when("the payment provider reports the payment as failed")]
async fn payment_fails(world: &mut CoffeeWorld) {
    let reference = world.last_transaction.as_ref().expect("No payment was initiated").reference.clone();
    let tx = world.store().payments.fail_payment(&reference).await.expect("Error failing payment");
    world.last_transaction = Some(tx);
}

#[then(expr = "the order total is {string}")]
async fn check_total(world: &mut CoffeeWorld, total: String) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
    let order = world.last_order.as_ref().expect("No order has been placed");
    assert_eq!(order.order.total_amount.to_string(), total);
}

#[then(expr = "the order is {word}")]
async fn check_status(world: &mut CoffeeWorld, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Not an order status");
    let order = world.store().orders.fetch_order(world.last_order_id()).await.expect("Error fetching order");
    assert_eq!(order.order.status, expected);
}

#[then(expr = "the request fails with {string}")]
async fn check_error(world: &mut CoffeeWorld, message: String) {
    let error = world.last_error.as_ref().expect("The request did not fail");
    assert!(error.contains(&message), "Expected '{message}' in '{error}'");
}

#[then(expr = "{word} has {int} in stock and {int} available")]
async fn check_stock(world: &mut CoffeeWorld, coffee: String, stock: i64, available: i64) {
    let id = world.product(&coffee).id;
    let product = world.store().catalog.fetch_product(id).await.expect("Error fetching coffee");
    let free = world.store().catalog.available_stock(id).await.expect("Error fetching stock");
    assert_eq!((product.quantity, free), (stock, available));
}

#[then(expr = "the payment is {word} for {string}")]
async fn check_payment(world: &mut CoffeeWorld, status: String, amount: String) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
    let tx = world.last_transaction.as_ref().expect("No payment was initiated");
    let stored = world
        .store()
        .db
        .fetch_transaction_by_reference(&tx.reference)
        .await
        .expect("Error fetching transaction")
        .expect("Transaction was not stored");
    assert_eq!(stored.payment_status.to_string(), status);
    assert_eq!(stored.total_amount.to_string(), amount);
}

#[then(expr = "the payment provider was called {int} time(s)")]
async fn check_provider_calls(world: &mut CoffeeWorld, calls: usize) {
    assert_eq!(world.store().provider.calls(), calls);
}
