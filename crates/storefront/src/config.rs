//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_DOMAIN` - shop domain, must match `*.myshopify.com`
//! - `SHOPIFY_STOREFRONT_TOKEN` - Storefront API access token
//!
//! ## Required in production
//! - `APP_URL` - public base URL of the app (https)
//!
//! ## Optional
//! - `SHOPIFY_API_VERSION` - API version string (default: 2024-01)
//! - `SHOPIFY_WEBHOOK_SECRET` - webhook HMAC secret (verification happens
//!   server-side; only the value is carried here)
//! - `API_TIMEOUT_MS` - per-request timeout in milliseconds (default: 30000)
//! - `MOVILPARTS_ENV` - development | staging | production (default: development)
//! - `ENABLE_ANALYTICS` - "true" to enable analytics hooks
//! - `DEBUG_MODE` - "true" to enable verbose client logging
//!
//! Missing required values fail fast at startup; nothing degrades silently.

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::shopify::validate;

const DEFAULT_API_VERSION: &str = "2024-01";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive).
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Whether this is a production build.
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            other => Err(ConfigError::InvalidEnvVar(
                "MOVILPARTS_ENV".to_string(),
                format!("unknown environment '{other}'"),
            )),
        }
    }
}

/// Storefront client configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Shop domain (e.g. movilparts.myshopify.com).
    pub shop_domain: String,
    /// Storefront API access token.
    pub storefront_token: SecretString,
    /// API version string (e.g. 2024-01).
    pub api_version: String,
    /// Public base URL of the app.
    pub app_url: Option<Url>,
    /// Webhook HMAC secret, if configured.
    pub webhook_secret: Option<SecretString>,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Deployment environment.
    pub environment: Environment,
    /// Whether analytics hooks are enabled.
    pub enable_analytics: bool,
    /// Whether verbose client logging is enabled.
    pub debug_mode: bool,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("shop_domain", &self.shop_domain)
            .field("storefront_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("app_url", &self.app_url)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("request_timeout", &self.request_timeout)
            .field("environment", &self.environment)
            .field("enable_analytics", &self.enable_analytics)
            .field("debug_mode", &self.debug_mode)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the access token fails validation in production (placeholder
    /// detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = match get_optional_env("MOVILPARTS_ENV") {
            Some(value) => Environment::parse(&value)?,
            None => Environment::default(),
        };

        let shop_domain = get_required_env("SHOPIFY_DOMAIN")?;
        if !validate::validate_shop_domain(&shop_domain) {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPIFY_DOMAIN".to_string(),
                "must match *.myshopify.com".to_string(),
            ));
        }

        let token = get_required_env("SHOPIFY_STOREFRONT_TOKEN")?;
        if environment.is_production() {
            validate_secret_strength(&token, "SHOPIFY_STOREFRONT_TOKEN")?;
        }

        let app_url = match get_optional_env("APP_URL") {
            Some(raw) => Some(
                Url::parse(&raw)
                    .map_err(|e| ConfigError::InvalidEnvVar("APP_URL".to_string(), e.to_string()))?,
            ),
            None if environment.is_production() => {
                return Err(ConfigError::MissingEnvVar("APP_URL".to_string()));
            }
            None => None,
        };
        if environment.is_production()
            && let Some(url) = &app_url
            && url.scheme() != "https"
        {
            return Err(ConfigError::InvalidEnvVar(
                "APP_URL".to_string(),
                "must use https in production".to_string(),
            ));
        }

        let timeout_ms = match get_optional_env("API_TIMEOUT_MS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("API_TIMEOUT_MS".to_string(), e.to_string())
            })?,
            None => DEFAULT_TIMEOUT_MS,
        };

        Ok(Self {
            shop_domain,
            storefront_token: SecretString::from(token),
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            app_url,
            webhook_secret: get_optional_env("SHOPIFY_WEBHOOK_SECRET").map(SecretString::from),
            request_timeout: Duration::from_millis(timeout_ms),
            environment,
            enable_analytics: get_optional_env("ENABLE_ANALYTICS").as_deref() == Some("true"),
            debug_mode: get_optional_env("DEBUG_MODE").as_deref() == Some("true"),
        })
    }

    /// GraphQL endpoint URL derived from domain and API version.
    #[must_use]
    pub fn graphql_url(&self) -> String {
        format!(
            "https://{}/api/{}/graphql.json",
            self.shop_domain, self.api_version
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // Token length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Fixture used across unit tests; never touches the process environment.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        shop_domain: "movilparts.myshopify.com".to_string(),
        storefront_token: SecretString::from("shpat_9f8a7b6c5d4e3f2a1b0c"),
        api_version: DEFAULT_API_VERSION.to_string(),
        app_url: Some(Url::parse("https://movilparts.shop").unwrap()),
        webhook_secret: None,
        request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        environment: Environment::Development,
        enable_analytics: false,
        debug_mode: false,
    }
}
