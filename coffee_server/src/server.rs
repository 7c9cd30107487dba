use std::time::Duration;

use actix_web::{
    dev::Server,
    error::{JsonPayloadError, PathError},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpRequest,
    HttpServer,
};
use coffee_engine::{
    events::{CancelReason, EventHandlers, EventHooks, EventProducers},
    CatalogApi,
    OrderFlowApi,
    PaymentApi,
    SqliteDatabase,
    UserApi,
};
use futures::FutureExt;
use log::*;

use crate::{
    auth::TokenIssuer,
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    integrations::ConfiguredProvider,
    middleware::{HmacMiddlewareFactory, IpWhitelistMiddlewareFactory, JwtMiddlewareFactory},
    routes::{
        health,
        CancelOrderRoute,
        CreateCoffeeRoute,
        CreateOrderRoute,
        DeleteCoffeeRoute,
        DeleteUserRoute,
        GetCoffeeRoute,
        GetUserRoute,
        ListCoffeesRoute,
        ListUsersRoute,
        LoginRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        PayForOrderRoute,
        PaystackWebhookRoute,
        SignupRoute,
        UpdateCoffeeRoute,
        UpdateOrderStatusRoute,
        UpdateUserRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 25;
pub const PAYSTACK_SIGNATURE_HEADER: &str = "x-paystack-signature";

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let provider = ConfiguredProvider::from_config(&config)?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, create_logging_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let _worker = start_expiry_worker(db.clone(), producers.clone(), config.unpaid_order_timeout);
    let srv = create_server_instance(config, db, provider, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    provider: ConfiguredProvider,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let bind_addr = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let catalog_api = CatalogApi::new(db.clone());
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let payments_api = PaymentApi::new(db.clone(), provider.clone(), producers.clone());
        let users_api = UserApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let options = ServerOptions::from_config(&config);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("coffee::access_log"))
            .app_data(json_config())
            .app_data(path_config())
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(users_api))
            .app_data(web::Data::new(jwt_signer.clone()))
            .app_data(web::Data::new(options));
        let webhook_scope = web::scope("/webhook")
            .wrap(HmacMiddlewareFactory::new(
                PAYSTACK_SIGNATURE_HEADER,
                config.paystack.api.secret.clone(),
                config.paystack.hmac_checks,
            ))
            .wrap(IpWhitelistMiddlewareFactory::new(config.paystack.whitelist.clone(), options))
            .service(PaystackWebhookRoute::<SqliteDatabase, ConfiguredProvider>::new());
        // Routes that require authentication. `/orders/cancel` must be registered before `/orders/{id}`
        let auth_scope = web::scope("")
            .wrap(JwtMiddlewareFactory::new(jwt_signer))
            .service(ListCoffeesRoute::<SqliteDatabase>::new())
            .service(GetCoffeeRoute::<SqliteDatabase>::new())
            .service(CreateCoffeeRoute::<SqliteDatabase>::new())
            .service(UpdateCoffeeRoute::<SqliteDatabase>::new())
            .service(DeleteCoffeeRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new())
            .service(PayForOrderRoute::<SqliteDatabase, ConfiguredProvider>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(ListUsersRoute::<SqliteDatabase>::new())
            .service(GetUserRoute::<SqliteDatabase>::new())
            .service(UpdateUserRoute::<SqliteDatabase>::new())
            .service(DeleteUserRoute::<SqliteDatabase>::new());
        // The catch-all auth scope goes last, so the public routes are matched first
        app.service(health)
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(SignupRoute::<SqliteDatabase>::new())
            .service(webhook_scope)
            .service(auth_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((bind_addr.0.as_str(), bind_addr.1))?
    .run();
    Ok(srv)
}

/// Malformed bodies are answered in the standard envelope with a 400.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        debug!("💻️ Could not read request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: PathError, _req: &HttpRequest| {
        debug!("💻️ Could not read request path. {err}");
        ServerError::InvalidRequestPath(err.to_string()).into()
    })
}

/// Hooks that log every order event. They are the place to attach notifications (e.g. emails) later on.
pub fn create_logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_created(|ev| {
            async move {
                let order = &ev.order.order;
                info!("📬️ Order #{} placed by user #{} for {}", order.id, order.user_id, order.total_amount);
            }
            .boxed()
        })
        .on_order_paid(|ev| {
            async move {
                info!(
                    "📬️ Order #{} is paid. Payment {} for {}",
                    ev.order.id, ev.transaction.reference, ev.transaction.total_amount
                );
            }
            .boxed()
        })
        .on_order_cancelled(|ev| {
            async move {
                match ev.reason {
                    CancelReason::Cancelled => info!("📬️ Order #{} was cancelled", ev.order.id),
                    CancelReason::Expired => info!("📬️ Order #{} expired without being paid", ev.order.id),
                }
            }
            .boxed()
        });
    hooks
}
