//! HMAC middleware for Actix Web.
//!
//! Paystack signs every webhook with an HMAC-SHA512 of the raw request body, keyed with the merchant's secret key,
//! and sends the lowercase hex digest in the `x-paystack-signature` header.
//!
//! Wrap the webhook routes with this middleware to reject calls whose signature is missing or wrong. The body is read
//! in full to check it, and put back afterwards so the handler can still extract it.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use coffee_common::Secret;
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use paystack_tools::helpers::calculate_signature;

use crate::errors::{AuthError, ServerError};

pub struct HmacMiddlewareFactory {
    hmac_header: String,
    key: Secret<String>,
    // If false, then the middleware will not check the HMAC signature and always allow the call
    enabled: bool,
}

impl HmacMiddlewareFactory {
    pub fn new(hmac_header: &str, key: Secret<String>, enabled: bool) -> Self {
        HmacMiddlewareFactory { hmac_header: hmac_header.into(), key, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = HmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HmacMiddlewareService {
            hmac_header: self.hmac_header.clone(),
            key: self.key.clone(),
            enabled: self.enabled,
            service: Rc::new(service),
        }))
    }
}

pub struct HmacMiddlewareService<S> {
    hmac_header: String,
    key: Secret<String>,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for HmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.key.reveal().clone();
        let hmac_header = self.hmac_header.clone();
        let enabled = self.enabled;
        Box::pin(async move {
            trace!("🔐️ Checking HMAC for request");
            if !enabled {
                trace!("🔐️ HMAC checks are disabled. Allowing request.");
                return service.call(req).await.map(ServiceResponse::map_into_left_body);
            }
            let data = match req.extract::<web::Bytes>().await {
                Ok(data) => data,
                Err(e) => {
                    warn!("🔐️ Failed to extract request data: {e:?}");
                    let err = ServerError::InvalidRequestBody("Failed to extract request data.".into());
                    return Ok(req.error_response(err).map_into_right_body());
                },
            };
            let hmac_calc = calculate_signature(&secret, data.as_ref());
            let signature = req.headers().get(&hmac_header).and_then(|v| v.to_str().ok()).map(str::trim);
            let validated = match signature {
                Some(sig) => !secret.is_empty() && sig.eq_ignore_ascii_case(&hmac_calc),
                None => {
                    warn!("🔐️ No HMAC signature found in request. denying access.");
                    false
                },
            };
            if validated {
                trace!("🔐️ HMAC check for request ✅️");
                req.set_payload(bytes_to_payload(data));
                service.call(req).await.map(ServiceResponse::map_into_left_body)
            } else {
                warn!("🔐️ Invalid HMAC signature found in request. denying access.");
                let err = ServerError::AuthenticationError(AuthError::InvalidSignature);
                Ok(req.error_response(err).map_into_right_body())
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
