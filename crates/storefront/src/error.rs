//! Classified errors for the Storefront API client.
//!
//! `Display` carries only a generic, user-presentable message; upstream
//! detail (raw GraphQL error arrays, response bodies, validator reasons)
//! lives in variant fields, is logged via `tracing` at the point of
//! classification, and is never surfaced to the UI.

use thiserror::Error;

/// Errors produced by the request pipeline and the services built on it.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Local throttle tripped before any network call. Caller should back off.
    #[error("Too many requests. Please wait a moment and try again.")]
    RateLimited,

    /// Input failed a whitelist/shape check before any network call. Always a
    /// programming or input error; never retried.
    #[error("The request contained invalid input.")]
    Validation {
        /// Which check failed (internal).
        detail: String,
    },

    /// HTTP 401 or a GraphQL access-denied extension code. Cached session
    /// state has already been cleared when this is returned.
    #[error("Authentication with the store failed. Please reload the page.")]
    AuthFailed,

    /// HTTP 403. Permission or configuration issue; not retried.
    #[error("Access to the store was denied.")]
    Forbidden,

    /// HTTP 429 from the platform.
    #[error("{}", throttled_message(*.retry_after))]
    Throttled {
        /// Retry-After hint from the response, in seconds.
        retry_after: Option<u64>,
    },

    /// HTTP 422, or a GraphQL-level error list on an otherwise successful
    /// response. Payload/schema mismatch.
    #[error("The request was rejected by the store.")]
    InvalidRequest {
        /// First upstream error message (internal).
        detail: String,
    },

    /// HTTP 5xx. Transient; safe to retry later.
    #[error("The store is temporarily unavailable. Please try again later.")]
    Unavailable,

    /// HTTP 404, or a query returning a null entity. Distinguished from
    /// transport failure so the cart manager can auto-recover.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Client-side abort after the configured deadline.
    #[error("The request timed out. Check your connection and try again.")]
    Timeout,

    /// Connection-level failure (DNS, refused connection, ...).
    #[error("A network error occurred. Check your internet connection.")]
    Network {
        /// Transport error text (internal).
        detail: String,
    },

    /// A 2xx response whose body lacked the expected data envelope.
    #[error("The store returned an unexpected response.")]
    MalformedResponse {
        /// What was wrong with the envelope (internal).
        detail: String,
    },

    /// A mutation succeeded transport-wise but the payload carried
    /// business-level user errors.
    #[error("The operation could not be completed.")]
    OperationFailed {
        /// Joined user-error messages (internal).
        detail: String,
    },
}

impl StorefrontError {
    /// Internal detail for logging and tests. Never show this to users.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Validation { detail }
            | Self::InvalidRequest { detail }
            | Self::Network { detail }
            | Self::MalformedResponse { detail }
            | Self::OperationFailed { detail } => Some(detail),
            Self::NotFound(what) => Some(what),
            _ => None,
        }
    }

    /// Whether a caller may reasonably retry the same request later. This
    /// layer never retries on its own.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Throttled { .. } | Self::Unavailable | Self::Timeout | Self::Network { .. }
        )
    }

    /// Whether the error indicates the cart no longer exists upstream. The
    /// cart manager uses this to discard the persisted session and recreate
    /// the cart instead of dead-ending the UI.
    #[must_use]
    pub const fn is_cart_gone(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

fn throttled_message(retry_after: Option<u64>) -> String {
    retry_after.map_or_else(
        || "The store is busy. Please try again in a few moments.".to_string(),
        |secs| format!("The store is busy. Please try again in {secs} seconds."),
    )
}
