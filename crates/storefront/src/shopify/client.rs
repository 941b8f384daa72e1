//! GraphQL transport for the Storefront API.
//!
//! [`StorefrontClient`] owns the full request pipeline: local throttle check,
//! input sanitization, response cache lookup, HTTP exchange, status
//! classification, and GraphQL envelope handling. Services above it
//! ([`crate::shopify::products`], [`crate::shopify::cart`]) only deal in
//! domain types and [`StorefrontError`].

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, RETRY_AFTER};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::StorefrontConfig;
use crate::error::StorefrontError;
use crate::shopify::cache::{DEFAULT_TTL, ResponseCache};
use crate::shopify::rate_limit::{EndpointClass, RequestMeter};
use crate::shopify::validate;
use crate::storage::{SecureStore, StorageBackend};

/// Upper bound on an outbound query document. Our largest document is well
/// under 4 KB; anything bigger did not come from this crate.
pub const MAX_QUERY_LENGTH: usize = 10_000;

/// Storage key under which the persisted cart session lives.
pub const CART_SESSION_KEY: &str = "cart";

// ============================================================================
// Client
// ============================================================================

/// Cheaply cloneable handle to the shared transport state.
#[derive(Debug, Clone)]
pub struct StorefrontClient<B: StorageBackend> {
    inner: Arc<Inner<B>>,
}

#[derive(Debug)]
struct Inner<B: StorageBackend> {
    http: reqwest::Client,
    config: StorefrontConfig,
    endpoint: String,
    meter: RequestMeter,
    cache: ResponseCache,
    store: SecureStore<B>,
}

/// Builder for [`StorefrontClient`]. Overrides exist for tests that point the
/// client at a local mock server or tighten throttle windows.
pub struct StorefrontClientBuilder<B: StorageBackend> {
    config: StorefrontConfig,
    backend: B,
    endpoint: Option<String>,
    meter: Option<RequestMeter>,
    cache: Option<ResponseCache>,
}

impl<B: StorageBackend> StorefrontClientBuilder<B> {
    /// Override the GraphQL endpoint (defaults to the URL derived from the
    /// configured shop domain and API version).
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Override the request meter.
    #[must_use]
    pub fn meter(mut self, meter: RequestMeter) -> Self {
        self.meter = Some(meter);
        self
    }

    /// Override the response cache.
    #[must_use]
    pub fn cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Network`] if the HTTP client cannot be
    /// constructed.
    pub fn build(self) -> Result<StorefrontClient<B>, StorefrontError> {
        let http = reqwest::Client::builder()
            .timeout(self.config.request_timeout)
            .build()
            .map_err(|e| StorefrontError::Network {
                detail: e.to_string(),
            })?;
        let store = SecureStore::new(
            self.backend,
            self.config.storefront_token.expose_secret(),
        );
        Ok(StorefrontClient {
            inner: Arc::new(Inner {
                http,
                endpoint: self
                    .endpoint
                    .unwrap_or_else(|| self.config.graphql_url()),
                meter: self.meter.unwrap_or_default(),
                cache: self.cache.unwrap_or_default(),
                store,
                config: self.config,
            }),
        })
    }
}

impl<B: StorageBackend> StorefrontClient<B> {
    /// Start building a client over the given storage backend.
    pub fn builder(config: StorefrontConfig, backend: B) -> StorefrontClientBuilder<B> {
        StorefrontClientBuilder {
            config,
            backend,
            endpoint: None,
            meter: None,
            cache: None,
        }
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Handle to the obfuscated local store shared with the session layer.
    #[must_use]
    pub fn store(&self) -> SecureStore<B> {
        self.inner.store.clone()
    }

    /// Execute a GraphQL document and return the `data` payload.
    ///
    /// Queries (documents starting with `query`) are served from and written
    /// to the response cache; mutations always go to the network. Variables
    /// are sanitized before the request is built, so callers may pass
    /// user-originated values directly.
    ///
    /// # Errors
    ///
    /// Any [`StorefrontError`]; see the module docs for the mapping.
    pub async fn request(
        &self,
        query: &str,
        variables: Value,
        class: EndpointClass,
    ) -> Result<Value, StorefrontError> {
        if !self.inner.meter.can_make_request(class) {
            warn!(?class, "local rate limit tripped");
            return Err(StorefrontError::RateLimited);
        }
        if query.trim().is_empty() {
            return Err(StorefrontError::Validation {
                detail: "empty query document".to_string(),
            });
        }
        if query.len() > MAX_QUERY_LENGTH {
            return Err(StorefrontError::Validation {
                detail: format!("query document exceeds {MAX_QUERY_LENGTH} bytes"),
            });
        }

        let variables = validate::validate_api_input(variables);
        let is_query = query.trim_start().starts_with("query");
        let cache_key = is_query.then(|| ResponseCache::cache_key(query, &variables));

        if let Some(key) = &cache_key
            && let Some(hit) = self.inner.cache.get(key)
        {
            debug!("response cache hit");
            return Ok(hit);
        }

        let data = self.exchange(query, &variables).await?;

        if let Some(key) = cache_key {
            self.inner.cache.insert(key, data.clone(), DEFAULT_TTL);
        }
        Ok(data)
    }

    /// Like [`request`](Self::request), deserializing `data` into `T`.
    ///
    /// # Errors
    ///
    /// Everything [`request`](Self::request) returns, plus
    /// [`StorefrontError::MalformedResponse`] when `data` does not fit `T`.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
        class: EndpointClass,
    ) -> Result<T, StorefrontError> {
        let data = self.request(query, variables, class).await?;
        serde_json::from_value(data).map_err(|e| StorefrontError::MalformedResponse {
            detail: e.to_string(),
        })
    }

    /// One HTTP round trip plus envelope handling. No caching or throttling
    /// here; `request` has already done both.
    async fn exchange(&self, query: &str, variables: &Value) -> Result<Value, StorefrontError> {
        let mut req = self
            .inner
            .http
            .post(&self.inner.endpoint)
            .header(
                "X-Shopify-Storefront-Access-Token",
                self.inner.config.storefront_token.expose_secret(),
            )
            .header(ACCEPT, "application/json")
            .json(&json!({ "query": query, "variables": variables }));
        if self.inner.config.environment.is_production() {
            req = req.header("X-Requested-With", "XMLHttpRequest");
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                StorefrontError::Timeout
            } else {
                StorefrontError::Network {
                    detail: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let err = classify_status(status, retry_after);
            warn!(%status, "storefront request failed");
            if matches!(err, StorefrontError::AuthFailed) {
                self.clear_session().await;
            }
            return Err(err);
        }

        let envelope: Envelope =
            response
                .json()
                .await
                .map_err(|e| StorefrontError::MalformedResponse {
                    detail: e.to_string(),
                })?;

        if let Some(errors) = &envelope.errors
            && !errors.is_empty()
        {
            return Err(self.map_graphql_errors(errors).await);
        }
        envelope
            .data
            .ok_or_else(|| StorefrontError::MalformedResponse {
                detail: "response envelope has neither data nor errors".to_string(),
            })
    }

    /// Map top-level GraphQL errors. `ACCESS_DENIED` means the token was
    /// rejected after the HTTP layer accepted it, so the persisted session is
    /// cleared the same way a 401 clears it.
    async fn map_graphql_errors(&self, errors: &[GraphQlError]) -> StorefrontError {
        for error in errors {
            match error.code() {
                Some("ACCESS_DENIED") => {
                    warn!("storefront token rejected by resolver");
                    self.clear_session().await;
                    return StorefrontError::AuthFailed;
                }
                Some("THROTTLED") => {
                    return StorefrontError::Throttled { retry_after: None };
                }
                _ => {}
            }
        }
        let detail = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        StorefrontError::InvalidRequest { detail }
    }

    /// Drop the persisted cart session. Called on authentication failures so
    /// the next interaction rebuilds state under a valid token.
    async fn clear_session(&self) {
        self.inner.store.remove_item(CART_SESSION_KEY).await;
    }
}

/// Map a non-2xx status to the public error taxonomy.
fn classify_status(status: StatusCode, retry_after: Option<u64>) -> StorefrontError {
    match status {
        StatusCode::UNAUTHORIZED => StorefrontError::AuthFailed,
        StatusCode::FORBIDDEN => StorefrontError::Forbidden,
        StatusCode::NOT_FOUND => StorefrontError::NotFound("endpoint".to_string()),
        StatusCode::TOO_MANY_REQUESTS => StorefrontError::Throttled { retry_after },
        StatusCode::UNPROCESSABLE_ENTITY => StorefrontError::InvalidRequest {
            detail: "rejected by the API".to_string(),
        },
        s if s.is_server_error() => StorefrontError::Unavailable,
        s => StorefrontError::Network {
            detail: format!("unexpected status {s}"),
        },
    }
}

// ============================================================================
// GraphQL envelope
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Option<Value>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    extensions: Option<GraphQlErrorExtensions>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorExtensions {
    code: Option<String>,
}

impl GraphQlError {
    fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.code.as_deref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, None),
            StorefrontError::AuthFailed
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, None),
            StorefrontError::Forbidden
        ));
        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE, None),
            StorefrontError::Unavailable
        ));
        assert!(matches!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY, None),
            StorefrontError::InvalidRequest { .. }
        ));
    }

    #[test]
    fn unprocessable_entity_is_not_retryable() {
        let err = classify_status(StatusCode::UNPROCESSABLE_ENTITY, None);
        assert!(!err.is_retryable(), "schema mismatches never resolve on retry");
    }

    #[test]
    fn unlisted_statuses_fall_through_to_network() {
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, None),
            StorefrontError::Network { .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::IM_A_TEAPOT, None),
            StorefrontError::Network { .. }
        ));
    }

    #[test]
    fn throttle_carries_retry_after_hint() {
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, Some(7));
        assert!(matches!(
            err,
            StorefrontError::Throttled {
                retry_after: Some(7)
            }
        ));
    }

    #[test]
    fn envelope_error_codes_parse() {
        let envelope: Envelope = serde_json::from_value(serde_json::json!({
            "errors": [
                {"message": "Throttled", "extensions": {"code": "THROTTLED"}},
                {"message": "bare", "extensions": null}
            ]
        }))
        .unwrap();
        let errors = envelope.errors.unwrap();
        assert_eq!(errors[0].code(), Some("THROTTLED"));
        assert_eq!(errors[1].code(), None);
    }
}
