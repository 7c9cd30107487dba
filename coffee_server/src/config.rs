use std::{env, io::Write, net::IpAddr};

use chrono::Duration;
use coffee_common::{
    helpers::{is_disabled_value, parse_boolean_flag, split_list},
    Secret,
};
use log::*;
use paystack_tools::PaystackConfig;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde_json::json;
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_COFFEE_HOST: &str = "127.0.0.1";
const DEFAULT_COFFEE_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/coffee_store.db";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_JWT_EXPIRY: Duration = Duration::hours(72);
const DEFAULT_UNPAID_ORDER_TIMEOUT: Duration = Duration::hours(48);
const DEFAULT_PAYMENT_PROVIDER: &str = "Paystack";
/// The addresses Paystack sends webhooks from.
pub const PAYSTACK_WEBHOOK_IPS: [&str; 3] = ["52.31.139.75", "52.49.173.169", "52.214.14.220"];

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub auth: AuthConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    /// The time before an unpaid order is cancelled and its stock released.
    pub unpaid_order_timeout: Duration,
    /// The registry key of the payment provider to use. Case-insensitive.
    pub payment_provider: String,
    pub paystack: PaystackServerConfig,
}

#[derive(Clone, Debug, Default)]
pub struct PaystackServerConfig {
    pub api: PaystackConfig,
    /// If false, webhook signatures are not checked. **DANGER**
    pub hmac_checks: bool,
    /// If supplied, webhook calls are only accepted from these addresses.
    /// To explicitly disable the whitelist, set this to "false", "none", or "0".
    pub whitelist: Option<Vec<IpAddr>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_COFFEE_HOST.to_string(),
            port: DEFAULT_COFFEE_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            auth: AuthConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            unpaid_order_timeout: DEFAULT_UNPAID_ORDER_TIMEOUT,
            payment_provider: DEFAULT_PAYMENT_PROVIDER.to_string(),
            paystack: PaystackServerConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("COFFEE_HOST").ok().unwrap_or_else(|| DEFAULT_COFFEE_HOST.into());
        let port = env::var("COFFEE_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for COFFEE_PORT. {e} Using the default, {DEFAULT_COFFEE_PORT}, \
                         instead."
                    );
                    DEFAULT_COFFEE_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_COFFEE_PORT);
        let database_url = env::var("COFFEE_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ COFFEE_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let db_max_connections = env::var("COFFEE_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for COFFEE_DB_MAX_CONNECTIONS. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("COFFEE_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("COFFEE_USE_FORWARDED").ok(), false);
        let unpaid_order_timeout = configure_unpaid_order_timeout();
        let payment_provider = env::var("COFFEE_PAYMENT_PROVIDER").ok().unwrap_or_else(|| {
            info!("🪛️ COFFEE_PAYMENT_PROVIDER is not set. Using {DEFAULT_PAYMENT_PROVIDER}.");
            DEFAULT_PAYMENT_PROVIDER.to_string()
        });
        let paystack = PaystackServerConfig::from_env_or_defaults();
        Self {
            host,
            port,
            database_url,
            db_max_connections,
            auth,
            use_x_forwarded_for,
            use_forwarded,
            unpaid_order_timeout,
            payment_provider,
            paystack,
        }
    }
}

impl PaystackServerConfig {
    pub fn from_env_or_defaults() -> Self {
        let api = PaystackConfig::new_from_env_or_default();
        let hmac_checks = parse_boolean_flag(env::var("COFFEE_PAYSTACK_HMAC_CHECKS").ok(), true);
        if !hmac_checks {
            warn!("🚨️ Paystack webhook signature checks are DISABLED. Anyone can mark payments as settled.");
        }
        let whitelist = match env::var("COFFEE_WEBHOOK_IP_WHITELIST") {
            Ok(s) => parse_whitelist(&s),
            Err(_) => {
                info!("🪛️ COFFEE_WEBHOOK_IP_WHITELIST is not set. Using Paystack's published webhook addresses.");
                parse_whitelist(&PAYSTACK_WEBHOOK_IPS.join(","))
            },
        };
        match &whitelist {
            Some(whitelist) if whitelist.is_empty() => {
                warn!(
                    "🚨️ The webhook IP whitelist was configured, but is empty. The server will run, but won't \
                     authorise any incoming payment notifications."
                );
            },
            None => {
                info!("🪛️ No webhook IP whitelist is set. Only HMAC validation will be used.");
            },
            Some(v) => {
                let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
                info!("🪛️ Webhook IP whitelist: {addrs}");
            },
        }
        Self { api, hmac_checks, whitelist }
    }
}

/// Parses a comma-separated list of IP addresses. Invalid entries are logged and skipped. One of the disabling words
/// (`none`, `false`, `0`, `off`) turns the whitelist off entirely.
pub fn parse_whitelist(value: &str) -> Option<Vec<IpAddr>> {
    if is_disabled_value(value) {
        info!(
            "🪛️ Webhook IP whitelist is disabled. If this is not what you want, set COFFEE_WEBHOOK_IP_WHITELIST to a \
             comma-separated list of IP addresses to enable it."
        );
        return None;
    }
    let ip_addrs = split_list(value)
        .into_iter()
        .filter_map(|s| {
            s.parse::<IpAddr>()
                .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in COFFEE_WEBHOOK_IP_WHITELIST: {e}"))
                .ok()
        })
        .collect::<Vec<IpAddr>>();
    Some(ip_addrs)
}

fn configure_unpaid_order_timeout() -> Duration {
    env::var("COFFEE_UNPAID_ORDER_TIMEOUT")
        .map_err(|_| {
            info!(
                "🪛️ COFFEE_UNPAID_ORDER_TIMEOUT is not set. Using the default value of {} hrs.",
                DEFAULT_UNPAID_ORDER_TIMEOUT.num_hours()
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::hours)
                .map_err(|e| warn!("🪛️ Invalid configuration value for COFFEE_UNPAID_ORDER_TIMEOUT. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_UNPAID_ORDER_TIMEOUT)
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    /// How long an access token remains valid after it is issued.
    pub token_expiry: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. DO NOT \
             operate on production like this since every access token is lost on restart. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect::<String>();
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_secret": secret }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT signing secret for this session was written to {}. If this is a production \
                         instance, you are doing it wrong! Set the COFFEE_JWT_SECRET environment variable instead. \
                         🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT signing secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT signing secret.");
            },
        }
        Self { jwt_secret: Secret::new(secret), token_expiry: token_expiry_from_env() }
    }
}

impl AuthConfig {
    pub fn new(secret: &str, token_expiry: Duration) -> Self {
        Self { jwt_secret: Secret::new(secret.to_string()), token_expiry }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("COFFEE_JWT_SECRET")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [COFFEE_JWT_SECRET]")))?;
        if secret.trim().len() < 32 {
            return Err(ServerError::ConfigurationError(
                "COFFEE_JWT_SECRET must be at least 32 characters long".to_string(),
            ));
        }
        Ok(Self { jwt_secret: Secret::new(secret), token_expiry: token_expiry_from_env() })
    }
}

fn token_expiry_from_env() -> Duration {
    env::var("COFFEE_JWT_EXPIRY_HOURS")
        .ok()
        .and_then(|s| {
            s.parse::<i64>()
                .ok()
                .filter(|h| *h > 0)
                .or_else(|| {
                    warn!("🪛️ Invalid configuration value for COFFEE_JWT_EXPIRY_HOURS: {s}");
                    None
                })
                .map(Duration::hours)
        })
        .unwrap_or(DEFAULT_JWT_EXPIRY)
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that handlers and middleware need at request time. Secrets are excluded so
/// they are not passed around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
