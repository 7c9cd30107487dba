#![allow(dead_code)]
use coffee_engine::{
    db_types::{Money, NewProduct, NewUser, Product, Role, User},
    events::EventProducers,
    test_utils::{
        prepare_env::{drop_database, prepare_test_env, random_db_path},
        StaticProvider,
    },
    CatalogApi,
    OrderFlowApi,
    PaymentApi,
    SqliteDatabase,
    UserApi,
    UserManagement,
};

pub struct TestSystem {
    pub db: SqliteDatabase,
    pub provider: StaticProvider,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub payments: PaymentApi<SqliteDatabase, StaticProvider>,
    pub catalog: CatalogApi<SqliteDatabase>,
    pub users: UserApi<SqliteDatabase>,
}

impl TestSystem {
    pub async fn new() -> Self {
        Self::with_producers(EventProducers::default()).await
    }

    pub async fn with_producers(producers: EventProducers) -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let provider = StaticProvider::new();
        Self {
            orders: OrderFlowApi::new(db.clone(), producers.clone()),
            payments: PaymentApi::new(db.clone(), provider.clone(), producers),
            catalog: CatalogApi::new(db.clone()),
            users: UserApi::new(db.clone()),
            provider,
            db,
        }
    }

    pub async fn add_user(&self, email: &str, role: Role) -> User {
        // Skips password hashing. Use `UserApi::create_user` when the password matters.
        let user = NewUser {
            first_name: "Test".into(),
            last_name: email.split('@').next().unwrap_or("user").into(),
            email: email.into(),
            password_hash: "unusable".into(),
            role,
        };
        self.db.insert_user(user).await.expect("Error creating user")
    }

    pub async fn add_product(&self, name: &str, price: &str, quantity: i64) -> Product {
        let price = price.parse::<Money>().expect("Invalid price");
        let product = NewProduct::new("Acme Roasters", name, "A fine coffee", price, quantity);
        self.catalog.create_product(product).await.expect("Error creating product")
    }

    pub async fn stock_of(&self, product_id: i64) -> (i64, i64) {
        let product = self.catalog.fetch_product(product_id).await.expect("Product missing");
        let available = self.catalog.available_stock(product_id).await.expect("Error reading stock");
        (product.quantity, available)
    }

    pub async fn tear_down(self) {
        let url = self.db.url().to_string();
        self.db.pool().close().await;
        drop_database(&url).await;
    }
}
