//! Only lets requests through from a fixed set of IP addresses.
//!
//! The remote address is resolved with [`get_remote_ip`], honouring the forwarding headers only if the server is
//! configured to trust them. Without a whitelist, every request is allowed.

use std::{net::IpAddr, rc::Rc};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::{info, warn};

use crate::{
    config::ServerOptions,
    errors::{AuthError, ServerError},
    helpers::get_remote_ip,
};

pub struct IpWhitelistMiddlewareFactory {
    whitelist: Option<Vec<IpAddr>>,
    options: ServerOptions,
}

impl IpWhitelistMiddlewareFactory {
    pub fn new(whitelist: Option<Vec<IpAddr>>, options: ServerOptions) -> Self {
        Self { whitelist, options }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IpWhitelistMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = IpWhitelistMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(IpWhitelistMiddlewareService {
            whitelist: Rc::new(self.whitelist.clone()),
            options: self.options,
            service: Rc::new(service),
        })
    }
}

pub struct IpWhitelistMiddlewareService<S> {
    whitelist: Rc<Option<Vec<IpAddr>>>,
    options: ServerOptions,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for IpWhitelistMiddlewareService<S>
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
        let whitelist = Rc::clone(&self.whitelist);
        let ServerOptions { use_x_forwarded_for, use_forwarded } = self.options;
        Box::pin(async move {
            let peer_ip = get_remote_ip(req.request(), use_x_forwarded_for, use_forwarded);
            let whitelisted = match (peer_ip, whitelist.as_ref()) {
                (Some(ip), Some(whitelist)) => {
                    info!("🔐️ Webhook call from {ip}");
                    whitelist.contains(&ip)
                },
                (_, None) => true,
                (None, Some(_)) => {
                    warn!("🔐️ No IP address found in webhook request, denying access.");
                    false
                },
            };
            if whitelisted {
                service.call(req).await.map(ServiceResponse::map_into_left_body)
            } else {
                warn!("🔐️ Webhook call from {peer_ip:?} is not whitelisted, denying access.");
                let err = ServerError::AuthenticationError(AuthError::ForbiddenPeer);
                Ok(req.error_response(err).map_into_right_body())
            }
        })
    }
}
