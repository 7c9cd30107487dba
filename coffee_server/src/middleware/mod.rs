mod acl;
mod hmac;
mod jwt;
mod whitelist;

pub use acl::{AclMiddlewareFactory, AclMiddlewareService};
pub use hmac::{HmacMiddlewareFactory, HmacMiddlewareService};
pub use jwt::{JwtMiddlewareFactory, JwtMiddlewareService};
pub use whitelist::{IpWhitelistMiddlewareFactory, IpWhitelistMiddlewareService};
