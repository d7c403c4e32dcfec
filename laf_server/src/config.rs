use std::{env, io::Write};

use laf_common::{parse_boolean_flag, Secret};
use laf_engine::matcher::{MatchCriteria, DEFAULT_TOLERANCE_M};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde_json::json;
use tempfile::NamedTempFile;

const DEFAULT_LAF_HOST: &str = "127.0.0.1";
const DEFAULT_LAF_PORT: u16 = 4475;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Haversine tolerance, in metres, for the lost-report reconciliation matcher.
    pub match_tolerance_m: f64,
    /// Checkout gateway configuration
    pub gateway: GatewayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LAF_HOST.to_string(),
            port: DEFAULT_LAF_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            match_tolerance_m: DEFAULT_TOLERANCE_M,
            gateway: GatewayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("LAF_HOST").ok().unwrap_or_else(|| DEFAULT_LAF_HOST.into());
        let port = env::var("LAF_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for LAF_PORT. {e} Using the default, {DEFAULT_LAF_PORT}, instead."
                    );
                    DEFAULT_LAF_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_LAF_PORT);
        let database_url = env::var("LAF_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ LAF_DATABASE_URL is not set. Please set it to the URL for the lost-and-found database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let match_tolerance_m = env::var("LAF_MATCH_TOLERANCE_M")
            .map_err(|_| {
                info!("🪛️ LAF_MATCH_TOLERANCE_M is not set. Using the default of {DEFAULT_TOLERANCE_M} m.");
            })
            .and_then(|s| {
                s.parse::<f64>().map_err(|e| warn!("🪛️ Invalid configuration value for LAF_MATCH_TOLERANCE_M. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_TOLERANCE_M);
        let gateway = GatewayConfig::from_env_or_defaults();
        Self { host, port, database_url, auth, match_tolerance_m, gateway }
    }

    pub fn match_criteria(&self) -> MatchCriteria {
        MatchCriteria::with_tolerance(self.match_tolerance_m)
    }
}

//-------------------------------------------------  AuthConfig  ------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret shared with the identity provider that signs access tokens.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT verification secret has not been set. I'm using a random value for this session. DO NOT \
             operate on production like this since no identity-provider token will validate. 🚨️🚨️🚨️"
        );
        let secret: String = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();
        let tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        match tmpfile {
            Some((mut f, p)) => {
                let key_data = json!({ "jwt_secret": secret.as_str() }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, \
                         you are doing it wrong! Set the LAF_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret.");
            },
        }
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Option<Self> {
        let secret = env::var("LAF_JWT_SECRET").ok()?;
        if secret.is_empty() {
            return None;
        }
        Some(Self { jwt_secret: Secret::new(secret) })
    }
}

//------------------------------------------------  GatewayConfig  ----------------------------------------------------
/// Configuration for the external checkout gateway the settlement flow hands payments off to.
#[derive(Clone, Debug, Default)]
pub struct GatewayConfig {
    /// Base url of the gateway's REST API, e.g. "https://pay.example.com/v1".
    pub base_url: String,
    pub api_key: Secret<String>,
    /// Secret for verifying the HMAC signature on gateway webhook calls.
    pub hmac_secret: Secret<String>,
    /// If false, webhook HMAC verification is skipped. **DANGER**: only disable this in development.
    pub hmac_checks: bool,
}

impl GatewayConfig {
    pub fn from_env_or_defaults() -> Self {
        let base_url = env::var("LAF_GATEWAY_URL").ok().unwrap_or_else(|| {
            error!("🪛️ LAF_GATEWAY_URL is not set. Checkout sessions cannot be created without it.");
            String::default()
        });
        let api_key = env::var("LAF_GATEWAY_API_KEY").ok().unwrap_or_else(|| {
            error!("🪛️ LAF_GATEWAY_API_KEY is not set. Please set it to the API key for the checkout gateway.");
            String::default()
        });
        let hmac_secret = env::var("LAF_GATEWAY_HMAC_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ LAF_GATEWAY_HMAC_SECRET is not set. Please set it to the webhook signing key for the checkout \
                 gateway."
            );
            String::default()
        });
        let hmac_checks = parse_boolean_flag(env::var("LAF_GATEWAY_HMAC_CHECKS").ok(), true);
        if !hmac_checks {
            warn!("🚨️ Gateway webhook HMAC checks are disabled. Anyone can fake a payment confirmation.");
        }
        Self { base_url, api_key: Secret::new(api_key), hmac_secret: Secret::new(hmac_secret), hmac_checks }
    }
}
