use coffee_engine::{
    db_types::{Money, NewProduct, NewUser, Role},
    UserManagement,
};
use cucumber::{gherkin::Step, given};

use crate::cucumber::{coffee_world::CoffeeStore, CoffeeWorld};

#[given("a fresh coffee store")]
async fn fresh_database(world: &mut CoffeeWorld) {
    world.system = Some(CoffeeStore::new().await);
}

#[given(expr = "a customer called {word}")]
async fn add_customer(world: &mut CoffeeWorld, name: String) {
    let user = NewUser {
        first_name: name.clone(),
        last_name: "Tester".into(),
        email: format!("{name}@example.com"),
        password_hash: "unusable".into(),
        role: Role::User,
    };
    let user = world.store().db.insert_user(user).await.expect("Error creating customer");
    world.users.insert(name, user);
}

/// Expects a table with `name | price | quantity` columns, and a header row.
#[given("the following coffees")]
async fn add_coffees(world: &mut CoffeeWorld, step: &Step) {
    let table = step.table.as_ref().expect("Coffees must be given as a table");
    for row in table.rows.iter().skip(1) {
        let price = row[1].parse::<Money>().expect("Invalid price");
        let quantity = row[2].parse::<i64>().expect("Invalid quantity");
        let product = NewProduct::new("House Roast", row[0].as_str(), "Freshly roasted", price, quantity);
        let product = world.store().catalog.create_product(product).await.expect("Error creating coffee");
        world.products.insert(row[0].clone(), product);
    }
}
