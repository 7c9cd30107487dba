use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::Duration;
use coffee_engine::db_types::{Principal, Role};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    UntrustedToken,
};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

/// The custom claims carried in every access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user_id: i64,
    pub role: Role,
}

impl JwtClaims {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.user_id, self.role)
    }
}

impl From<Principal> for JwtClaims {
    fn from(p: Principal) -> Self {
        Self::new(p.user_id, p.role)
    }
}

/// Handlers take `JwtClaims` as an argument to require an authenticated caller. The claims are placed in the request
/// extensions by [`crate::middleware::JwtMiddlewareFactory`].
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().copied();
        ready(claims.ok_or(ServerError::AuthenticationError(AuthError::MissingToken)))
    }
}

/// Signs and checks HS256 access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    key: Hs256Key,
    expiry: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = Hs256Key::new(config.jwt_secret.reveal().as_bytes());
        Self { key, expiry: config.token_expiry }
    }

    /// Issues a new access token for the given claims. The caller is responsible for having authenticated the user.
    pub fn issue_token(&self, claims: JwtClaims, duration: Option<Duration>) -> Result<String, ServerError> {
        let duration = duration.unwrap_or(self.expiry);
        let header = Header::empty().with_token_type("JWT");
        let claims = Claims::new(claims).set_duration(&TimeOptions::default(), duration);
        let token = Hs256
            .token(&header, &claims, &self.key)
            .map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))?;
        trace!("🔑️ Issued access token for user #{}", claims.custom.user_id);
        Ok(token)
    }

    /// Checks the signature and expiry of `token` and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let token = Hs256.validator::<JwtClaims>(&self.key).validate(&untrusted).map_err(|e| {
            debug!("🔑️ Access token failed validation. {e}");
            AuthError::ValidationError(e.to_string())
        })?;
        let claims = token
            .claims()
            .validate_expiration(&TimeOptions::default())
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        Ok(claims.custom)
    }
}
