//! Bearer token authentication.
//!
//! Reads the `Authorization: Bearer <token>` header, validates the token with the [`TokenIssuer`] and stores the
//! resulting [`JwtClaims`] in the request extensions for handlers and [`super::AclMiddlewareFactory`] to use.
//! Requests without a valid token are answered with 401 Unauthorized.

use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::{debug, trace};

use crate::{
    auth::TokenIssuer,
    errors::{AuthError, ServerError},
};

pub struct JwtMiddlewareFactory {
    issuer: TokenIssuer,
}

impl JwtMiddlewareFactory {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self { issuer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = JwtMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtMiddlewareService { issuer: Rc::new(self.issuer.clone()), service: Rc::new(service) })
    }
}

pub struct JwtMiddlewareService<S> {
    issuer: Rc<TokenIssuer>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let issuer = Rc::clone(&self.issuer);
        Box::pin(async move {
            let claims = bearer_token(&req).and_then(|token| issuer.validate_token(token));
            match claims {
                Ok(claims) => {
                    trace!("🔑️ Request authenticated for user #{}", claims.user_id);
                    req.extensions_mut().insert(claims);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                },
                Err(e) => {
                    debug!("🔑️ Rejecting request to {}. {e}", req.path());
                    Ok(req.error_response(ServerError::from(e)).map_into_right_body())
                },
            }
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Result<&str, AuthError> {
    let value = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = value.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a Bearer token".into()))
}
