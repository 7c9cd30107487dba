//! Request handler definitions
//!
//! Define each route and its handler here. Handlers are generic over the engine's backend traits so that the endpoint
//! tests can swap the database for a mock.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any I/O, including every database and payment provider call, must
//! be awaited rather than run synchronously.
use actix_web::{get, web, HttpResponse, Responder, ResponseError};
use coffee_engine::{
    db_types::{NewProduct, ProductUpdate, Role, UserUpdate},
    provider::PaymentProvider,
    CatalogApi,
    CatalogManagement,
    NewUserRequest,
    OrderFlowApi,
    OrderManagement,
    PaymentApi,
    PaymentApiError,
    TransactionManagement,
    UserApi,
    UserManagement,
};
use log::*;
use paystack_tools::WebhookEvent;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    data_objects::{
        CreateOrderRequest,
        JsonResponse,
        LoginRequest,
        LoginResponse,
        OrderIdRequest,
        UpdateOrderStatusRequest,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ $(where requires [$($roles:expr),+])?) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                $( let res = res.wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+])); )?
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    // Routes that also need the payment provider
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ ; with provider) => {
        paste::paste! { pub struct [<$name:camel Route>]<A, P>(core::marker::PhantomData<fn() -> (A, P)>);}
        paste::paste! { impl<A, P> [<$name:camel Route>]<A, P> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> (A, P)>)
            }
        }}
        paste::paste! { impl<A, P> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A, P>
        where
            A: $($bounds +)+ 'static,
            P: coffee_engine::provider::PaymentProvider + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A, P>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(login => Post "/login" impl UserManagement);
/// Route handler for the login endpoint
///
/// Checks the email and password and issues an access token. Clients send it back in the
/// `Authorization: Bearer <token>` header. The token is valid for `COFFEE_JWT_EXPIRY_HOURS` and does not refresh.
pub async fn login<B: UserManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<UserApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let LoginRequest { email, password } = body.into_inner();
    trace!("💻️ Received login request for {email}");
    let user = api.authenticate(&email, &password).await?;
    let token = signer.issue_token(JwtClaims::from(user.principal()), None)?;
    info!("💻️ User #{} logged in", user.id);
    Ok(HttpResponse::Ok().json(JsonResponse::success("Login successful", LoginResponse { token })))
}

route!(signup => Post "/users" impl UserManagement);
pub async fn signup<B: UserManagement>(
    body: web::Json<NewUserRequest>,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user = api.create_user(body.into_inner()).await?;
    info!("💻️ New {} account #{} created", user.role, user.id);
    Ok(HttpResponse::Created().json(JsonResponse::success("User created successfully", user)))
}

//----------------------------------------------   Coffees  ----------------------------------------------------
route!(list_coffees => Get "/coffees" impl CatalogManagement);
pub async fn list_coffees<B: CatalogManagement>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError> {
    let coffees = api.fetch_products().await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Coffees retrieved successfully", coffees)))
}

route!(get_coffee => Get "/coffees/{id}" impl CatalogManagement);
pub async fn get_coffee<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let coffee = api.fetch_product(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Coffee retrieved successfully", coffee)))
}

route!(create_coffee => Post "/coffees" impl CatalogManagement where requires [Role::Admin]);
pub async fn create_coffee<B: CatalogManagement>(
    body: web::Json<NewProduct>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let coffee = api.create_product(body.into_inner()).await?;
    info!("💻️ Coffee #{} ({}) added to the catalog", coffee.id, coffee.name);
    Ok(HttpResponse::Created().json(JsonResponse::success("Coffee created successfully", coffee)))
}

route!(update_coffee => Put "/coffees/{id}" impl CatalogManagement where requires [Role::Admin]);
pub async fn update_coffee<B: CatalogManagement>(
    path: web::Path<i64>,
    body: web::Json<ProductUpdate>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let coffee = api.update_product(path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Coffee updated successfully", coffee)))
}

route!(delete_coffee => Delete "/coffees/{id}" impl CatalogManagement where requires [Role::Admin]);
pub async fn delete_coffee<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.delete_product(id).await?;
    info!("💻️ Coffee #{id} removed from the catalog");
    Ok(HttpResponse::Ok().json(JsonResponse::message("Coffee deleted successfully")))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl OrderManagement, UserManagement, CatalogManagement);
pub async fn create_order<B>(
    claims: JwtClaims,
    body: web::Json<CreateOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + UserManagement + CatalogManagement,
{
    debug!("💻️ POST order for user #{}", claims.user_id);
    let order = api.place_order(claims.user_id, body.into_inner().coffees).await?;
    Ok(HttpResponse::Created().json(JsonResponse::success("Order created successfully", order)))
}

route!(my_orders => Get "/orders" impl OrderManagement, UserManagement, CatalogManagement);
pub async fn my_orders<B>(claims: JwtClaims, api: web::Data<OrderFlowApi<B>>) -> Result<HttpResponse, ServerError>
where B: OrderManagement + UserManagement + CatalogManagement {
    debug!("💻️ GET orders for user #{}", claims.user_id);
    let orders = api.fetch_orders_for_user(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Order fetched successfully", orders)))
}

route!(order_by_id => Get "/orders/{id}" impl OrderManagement, UserManagement, CatalogManagement);
/// Users can only see their own orders. Admins can see any order.
pub async fn order_by_id<B>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + UserManagement + CatalogManagement,
{
    let order = api.fetch_order_for_user(&claims.principal(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Order fetched successfully", order)))
}

route!(cancel_order => Patch "/orders/cancel" impl OrderManagement, UserManagement, CatalogManagement);
pub async fn cancel_order<B>(
    claims: JwtClaims,
    body: web::Json<OrderIdRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + UserManagement + CatalogManagement,
{
    let order_id = body.into_inner().order_id;
    debug!("💻️ User #{} is cancelling order #{order_id}", claims.user_id);
    let order = api.cancel_order(&claims.principal(), order_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Order canceled successfully", order)))
}

route!(update_order_status => Patch "/orders/{id}" impl OrderManagement, UserManagement, CatalogManagement where requires [Role::Admin]);
pub async fn update_order_status<B>(
    path: web::Path<i64>,
    body: web::Json<UpdateOrderStatusRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + UserManagement + CatalogManagement,
{
    let id = path.into_inner();
    let status = body.into_inner().status;
    if status.trim().is_empty() {
        return Err(ServerError::ValidationError("No status was specified".into()));
    }
    let order = api.update_order_status(id, status.trim()).await?;
    info!("💻️ Order #{id} is now {}", order.status);
    Ok(HttpResponse::Ok().json(JsonResponse::success("Order updated successfully", order)))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(pay_for_order => Post "/orders/pay" impl TransactionManagement, OrderManagement, UserManagement; with provider);
/// Opens a payment with the configured provider. The response carries the provider's `authorization_url` on a fresh
/// initiation. Calling this again for the same pending order returns the same transaction without a URL.
pub async fn pay_for_order<B, P>(
    claims: JwtClaims,
    body: web::Json<OrderIdRequest>,
    api: web::Data<PaymentApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: TransactionManagement + OrderManagement + UserManagement,
    P: PaymentProvider,
{
    let order_id = body.into_inner().order_id;
    debug!("💻️ User #{} is paying for order #{order_id} via {}", claims.user_id, api.provider().name());
    let tx = api.initiate_payment(claims.user_id, order_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Transaction created successfully", tx)))
}

route!(paystack_webhook => Post "/paystack" impl TransactionManagement, OrderManagement, UserManagement; with provider);
/// Receives Paystack's payment notifications. The IP whitelist and signature checks have already passed by the time
/// this runs.
///
/// Notifications we can never process (an unreadable body, an unknown reference, an event we do not handle) are
/// acknowledged with a 200 so that Paystack stops sending them. If processing fails on our side, the response is a
/// 500 and Paystack redelivers the notification later. Settlement is idempotent, so a redelivery is harmless.
pub async fn paystack_webhook<B, P>(body: web::Bytes, api: web::Data<PaymentApi<B, P>>) -> HttpResponse
where
    B: TransactionManagement + OrderManagement + UserManagement,
    P: PaymentProvider,
{
    let event = match serde_json::from_slice::<WebhookEvent>(body.as_ref()) {
        Ok(event) => event,
        Err(e) => {
            warn!("💻️ Could not parse Paystack webhook body. {e}");
            return HttpResponse::Ok().json(JsonResponse::message("Webhook received"));
        },
    };
    info!("💻️ Paystack webhook received: {} for {}", event.event, event.data.reference);
    let result = match event.event.as_str() {
        WebhookEvent::CHARGE_SUCCESS => Some(api.settle_payment(&event.data.reference).await),
        WebhookEvent::CHARGE_FAILED => Some(api.fail_payment(&event.data.reference).await),
        other => {
            debug!("💻️ Ignoring Paystack event {other}");
            None
        },
    };
    match result {
        Some(Ok(tx)) => info!("💻️ Payment {} is {}", tx.reference, tx.payment_status),
        Some(Err(PaymentApiError::TransactionNotFound(r))) => {
            warn!("💻️ Paystack sent a notification for an unknown payment reference: {r}")
        },
        Some(Err(e)) => {
            let err = ServerError::from(e);
            if err.status_code().is_server_error() {
                error!("💻️ Could not process Paystack notification for {}. {err}", event.data.reference);
                return err.error_response();
            }
            warn!("💻️ Paystack notification for {} was rejected. {err}", event.data.reference);
        },
        None => {},
    }
    HttpResponse::Ok().json(JsonResponse::message("Webhook received"))
}

//----------------------------------------------   Users  ----------------------------------------------------
route!(list_users => Get "/users" impl UserManagement where requires [Role::Admin]);
pub async fn list_users<B: UserManagement>(api: web::Data<UserApi<B>>) -> Result<HttpResponse, ServerError> {
    let users = api.fetch_users().await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Users retrieved successfully", users)))
}

route!(get_user => Get "/users/{id}" impl UserManagement where requires [Role::Admin]);
pub async fn get_user<B: UserManagement>(
    path: web::Path<i64>,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user = api.fetch_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("User retrieved successfully", user)))
}

route!(update_user => Put "/users/{id}" impl UserManagement where requires [Role::Admin]);
pub async fn update_user<B: UserManagement>(
    path: web::Path<i64>,
    body: web::Json<UserUpdate>,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user = api.update_user(path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("User updated successfully", user)))
}

route!(delete_user => Delete "/users/{id}" impl UserManagement where requires [Role::Admin]);
pub async fn delete_user<B: UserManagement>(
    path: web::Path<i64>,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.delete_user(id).await?;
    info!("💻️ User #{id} deleted");
    Ok(HttpResponse::Ok().json(JsonResponse::message("User deleted successfully")))
}

