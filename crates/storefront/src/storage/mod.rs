//! Persistent key-value storage.
//!
//! The browser's persistent store is an external collaborator; this module
//! models it as a pluggable async key-value backend and layers the secure
//! envelope ([`SecureStore`]) on top. The only record the storefront persists
//! is the cart session id.

mod secure;

pub use secure::SecureStore;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Async key-value backend with string values.
///
/// Backends are cheap handles (`Clone` shares the underlying store). TTL is
/// not a backend concern; [`SecureStore`] enforces expiry at the application
/// layer because the real store has no native expiry either.
#[allow(async_fn_in_trait)]
pub trait StorageBackend: Clone + Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn read(&self, key: &str) -> Option<String>;
    /// Store `value` under `key`, replacing any previous value.
    async fn write(&self, key: &str, value: String);
    /// Delete the value stored under `key`, if any.
    async fn delete(&self, key: &str);
}

/// In-memory backend. The default for tests and for embedders that bring no
/// persistent store of their own.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl StorageBackend for MemoryStore {
    async fn read(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    async fn write(&self, key: &str, value: String) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
    }

    async fn delete(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }
}
