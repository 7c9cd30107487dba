//! Access control list middleware for the coffee server.
//! This middleware can be placed on any route or service that sits behind [`super::JwtMiddlewareFactory`].
//!
//! It checks the role in the caller's access token against the roles the route requires. Admins hold every role. If
//! the caller lacks any of them, a 403 Forbidden response is returned.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use coffee_engine::db_types::Role;
use futures::{
    future::{ok, Ready},
    Future,
};
use log::{debug, warn};

use crate::{
    auth::JwtClaims,
    errors::{AuthError, ServerError},
};

pub struct AclMiddlewareFactory {
    required_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = AclMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required_roles: self.required_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required_roles = self.required_roles.clone();
        Box::pin(async move {
            let claims = req.extensions().get::<JwtClaims>().copied();
            let Some(claims) = claims else {
                warn!("🔐️ No access token claims found in request extensions");
                let err = ServerError::AuthenticationError(AuthError::MissingToken);
                return Ok(req.error_response(err).map_into_right_body());
            };
            let principal = claims.principal();
            if required_roles.iter().all(|role| principal.has_role(*role)) {
                service.call(req).await.map(ServiceResponse::map_into_left_body)
            } else {
                debug!("🔐️ User #{} ({}) may not access {}", claims.user_id, claims.role, req.path());
                let err = ServerError::InsufficientPermissions(format!("{required_roles:?}"));
                Ok(req.error_response(err).map_into_right_body())
            }
        })
    }
}
