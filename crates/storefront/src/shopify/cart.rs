//! Cart session, service, and manager.
//!
//! Three layers with distinct jobs:
//!
//! * [`CartSession`] persists the cart id in the obfuscated local store with
//!   a sliding 24-hour expiry.
//! * [`CartService`] speaks the GraphQL cart operations and maps their
//!   payloads (including `userErrors`) to domain types.
//! * [`CartManager`] is the stateful facade the UI talks to: it lazily
//!   creates or restores a cart, keeps an in-memory snapshot, and recovers
//!   from carts the platform has expired.

use std::time::Duration;

use movilparts_core::{Cart, CartItem};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::StorefrontError;
use crate::shopify::client::{CART_SESSION_KEY, StorefrontClient};
use crate::shopify::rate_limit::EndpointClass;
use crate::shopify::wire::{
    CartCreateData, CartLineInput, CartLineUpdateInput, CartLinesAddData, CartLinesUpdateData,
    CartPayload, GetCartData, UserError,
};
use crate::shopify::{queries, validate};
use crate::storage::{SecureStore, StorageBackend};

/// How long a persisted cart id stays valid without activity. Every
/// successful restore re-persists the id, sliding the window.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Most lines one mutation may carry.
const MAX_LINES_PER_CALL: usize = 100;

// ============================================================================
// Session persistence
// ============================================================================

/// Persists the active cart id across page loads.
#[derive(Debug, Clone)]
pub struct CartSession<B: StorageBackend> {
    store: SecureStore<B>,
}

impl<B: StorageBackend> CartSession<B> {
    pub fn new(store: SecureStore<B>) -> Self {
        Self { store }
    }

    /// Persist `cart_id` with a fresh TTL.
    pub async fn save(&self, cart_id: &str) {
        self.store
            .set_item(CART_SESSION_KEY, cart_id, SESSION_TTL)
            .await;
    }

    /// Load the persisted cart id, if present and unexpired, and slide its
    /// expiry window.
    pub async fn load(&self) -> Option<String> {
        let cart_id = self.store.get_item(CART_SESSION_KEY).await?;
        self.save(&cart_id).await;
        Some(cart_id)
    }

    /// Drop the persisted cart id.
    pub async fn clear(&self) {
        self.store.remove_item(CART_SESSION_KEY).await;
    }
}

// ============================================================================
// GraphQL operations
// ============================================================================

/// Stateless cart operations against the Storefront API. Mutations bypass the
/// response cache by construction (the client only caches `query` documents).
#[derive(Debug, Clone)]
pub struct CartService<B: StorageBackend> {
    client: StorefrontClient<B>,
}

impl<B: StorageBackend> CartService<B> {
    pub fn new(client: StorefrontClient<B>) -> Self {
        Self { client }
    }

    /// Create a new, empty cart.
    pub async fn create_cart(&self) -> Result<Cart, StorefrontError> {
        let data: CartCreateData = self
            .client
            .request_as(queries::CART_CREATE, json!({}), EndpointClass::Cart)
            .await?;
        let cart = payload_into_cart(data.cart_create)?;
        info!(cart_id = %cart.id, "created cart");
        Ok(cart)
    }

    /// Fetch a cart by id. The platform returns null for expired or unknown
    /// carts; that surfaces as [`StorefrontError::NotFound`] so callers can
    /// recreate.
    pub async fn get_cart(&self, cart_id: &str) -> Result<Cart, StorefrontError> {
        validate_cart_id(cart_id)?;
        let data: GetCartData = self
            .client
            .request_as(
                queries::GET_CART,
                json!({ "cartId": cart_id }),
                EndpointClass::Cart,
            )
            .await?;
        data.cart
            .map(Cart::from)
            .ok_or_else(|| StorefrontError::NotFound(cart_id.to_string()))
    }

    /// Add lines to the cart. Each item's quantity must be in `1..=100`.
    pub async fn add_lines(
        &self,
        cart_id: &str,
        items: &[CartItem],
    ) -> Result<Cart, StorefrontError> {
        validate_cart_id(cart_id)?;
        validate_line_count(items.len())?;
        let lines: Vec<CartLineInput> = items
            .iter()
            .map(|item| {
                if !validate::validate_variant_id(&item.merchandise_id) {
                    return Err(StorefrontError::Validation {
                        detail: "variant id failed whitelist".to_string(),
                    });
                }
                if !validate::validate_add_quantity(item.quantity) {
                    return Err(StorefrontError::Validation {
                        detail: format!("add quantity {} out of range", item.quantity),
                    });
                }
                Ok(CartLineInput {
                    merchandise_id: item.merchandise_id.clone(),
                    quantity: item.quantity,
                })
            })
            .collect::<Result<_, _>>()?;

        let data: CartLinesAddData = self
            .client
            .request_as(
                queries::CART_LINES_ADD,
                json!({ "cartId": cart_id, "lines": lines }),
                EndpointClass::Cart,
            )
            .await?;
        payload_into_cart(data.cart_lines_add)
    }

    /// Update line quantities. Quantity 0 removes the line server-side;
    /// quantities must be in `0..=100`.
    pub async fn update_lines(
        &self,
        cart_id: &str,
        updates: &[(String, i64)],
    ) -> Result<Cart, StorefrontError> {
        validate_cart_id(cart_id)?;
        validate_line_count(updates.len())?;
        let lines: Vec<CartLineUpdateInput> = updates
            .iter()
            .map(|(line_id, quantity)| {
                if !validate::validate_line_id(line_id) {
                    return Err(StorefrontError::Validation {
                        detail: "line id failed whitelist".to_string(),
                    });
                }
                if !validate::validate_update_quantity(*quantity) {
                    return Err(StorefrontError::Validation {
                        detail: format!("update quantity {quantity} out of range"),
                    });
                }
                Ok(CartLineUpdateInput {
                    id: line_id.clone(),
                    quantity: *quantity,
                })
            })
            .collect::<Result<_, _>>()?;

        let data: CartLinesUpdateData = self
            .client
            .request_as(
                queries::CART_LINES_UPDATE,
                json!({ "cartId": cart_id, "lines": lines }),
                EndpointClass::Cart,
            )
            .await?;
        payload_into_cart(data.cart_lines_update)
    }
}

fn validate_line_count(count: usize) -> Result<(), StorefrontError> {
    if count == 0 || count > MAX_LINES_PER_CALL {
        return Err(StorefrontError::Validation {
            detail: format!("line count {count} out of range"),
        });
    }
    Ok(())
}

fn validate_cart_id(cart_id: &str) -> Result<(), StorefrontError> {
    if validate::validate_cart_id(cart_id) {
        Ok(())
    } else {
        Err(StorefrontError::Validation {
            detail: "cart id failed whitelist".to_string(),
        })
    }
}

/// Unpack a mutation payload: user errors win over the cart, and a missing
/// cart without errors is a broken envelope.
fn payload_into_cart(payload: CartPayload) -> Result<Cart, StorefrontError> {
    if !payload.user_errors.is_empty() {
        return Err(map_user_errors(&payload.user_errors));
    }
    payload
        .cart
        .map(Cart::from)
        .ok_or_else(|| StorefrontError::MalformedResponse {
            detail: "mutation payload has neither cart nor userErrors".to_string(),
        })
}

/// User errors that say the cart itself no longer exists are reported as
/// [`StorefrontError::NotFound`] so the manager's recovery path triggers;
/// everything else is an operation failure with the messages joined.
fn map_user_errors(errors: &[UserError]) -> StorefrontError {
    let joined = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    let lower = joined.to_lowercase();
    if lower.contains("does not exist") || lower.contains("could not be found") {
        warn!("cart reported gone by mutation");
        StorefrontError::NotFound("cart".to_string())
    } else {
        StorefrontError::OperationFailed { detail: joined }
    }
}

// ============================================================================
// Manager
// ============================================================================

/// Stateful cart facade.
///
/// Holds the latest cart snapshot behind an async mutex. The mutex guards
/// only snapshot reads and writes; network calls run outside it, so
/// concurrent mutations race upstream and the last response to arrive wins
/// the snapshot, which matches how the platform itself resolves concurrent
/// cart mutations. The persisted session id is likewise last-write-wins
/// across tabs or processes.
#[derive(Debug)]
pub struct CartManager<B: StorageBackend> {
    service: CartService<B>,
    session: CartSession<B>,
    current: Mutex<Option<Cart>>,
}

impl<B: StorageBackend> CartManager<B> {
    pub fn new(client: StorefrontClient<B>) -> Self {
        let session = CartSession::new(client.store());
        Self {
            service: CartService::new(client),
            session,
            current: Mutex::new(None),
        }
    }

    /// Ensure a cart exists: reuse the in-memory snapshot, otherwise restore
    /// the persisted session, otherwise create a fresh cart. A persisted id
    /// the platform no longer recognizes (or that fails validation) is
    /// discarded and replaced.
    pub async fn initialize(&self) -> Result<Cart, StorefrontError> {
        let mut current = self.current.lock().await;
        if let Some(cart) = current.as_ref() {
            return Ok(cart.clone());
        }
        let cart = self.restore_or_create().await?;
        *current = Some(cart.clone());
        Ok(cart)
    }

    async fn restore_or_create(&self) -> Result<Cart, StorefrontError> {
        if let Some(cart_id) = self.session.load().await {
            match self.service.get_cart(&cart_id).await {
                Ok(cart) => {
                    debug!(%cart_id, "restored cart session");
                    return Ok(cart);
                }
                Err(e) if e.is_cart_gone() || matches!(e, StorefrontError::Validation { .. }) => {
                    warn!(%cart_id, "persisted cart unusable, recreating");
                    self.session.clear().await;
                }
                Err(e) => return Err(e),
            }
        }
        match self.service.create_cart().await {
            Ok(cart) => {
                self.session.save(&cart.id).await;
                Ok(cart)
            }
            Err(e) => {
                // A stale id must not survive a failed creation; the next
                // interaction starts from a clean slate.
                self.session.clear().await;
                Err(e)
            }
        }
    }

    /// Add `quantity` of a variant to the cart, initializing it first if
    /// needed.
    ///
    /// If the platform reports the cart gone mid-operation, the stale session
    /// is dropped and a fresh cart is created, but the error is still
    /// returned: the caller decides whether to replay the add.
    pub async fn add_to_cart(
        &self,
        merchandise_id: &str,
        quantity: i64,
    ) -> Result<Cart, StorefrontError> {
        let cart_id = self.initialize().await?.id;
        let item = CartItem {
            merchandise_id: merchandise_id.to_string(),
            quantity,
        };
        let result = self.service.add_lines(&cart_id, &[item]).await;
        self.absorb(result).await
    }

    /// Set a line's quantity. Zero or negative removes the line (requested as
    /// an update to 0, which the platform treats as removal).
    pub async fn update_quantity(
        &self,
        line_id: &str,
        quantity: i64,
    ) -> Result<Cart, StorefrontError> {
        let cart_id = self.initialize().await?.id;
        let quantity = quantity.max(0);
        let result = self
            .service
            .update_lines(&cart_id, &[(line_id.to_string(), quantity)])
            .await;
        self.absorb(result).await
    }

    /// Store a successful result as the new snapshot; on a gone cart, drop
    /// state and provision a replacement before surfacing the error.
    async fn absorb(&self, result: Result<Cart, StorefrontError>) -> Result<Cart, StorefrontError> {
        match result {
            Ok(cart) => {
                self.session.save(&cart.id).await;
                *self.current.lock().await = Some(cart.clone());
                Ok(cart)
            }
            Err(e) if e.is_cart_gone() => {
                warn!("cart expired upstream, provisioning replacement");
                self.session.clear().await;
                *self.current.lock().await = None;
                if let Ok(fresh) = self.service.create_cart().await {
                    self.session.save(&fresh.id).await;
                    *self.current.lock().await = Some(fresh);
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Total item count in the current snapshot (0 when uninitialized).
    pub async fn item_count(&self) -> i64 {
        self.current
            .lock()
            .await
            .as_ref()
            .map_or(0, |c| c.total_quantity)
    }

    /// Cart total amount from the current snapshot, `"0"` when uninitialized.
    pub async fn total(&self) -> String {
        self.current
            .lock()
            .await
            .as_ref()
            .map_or_else(|| "0".to_string(), |c| c.cost.total_amount.amount.clone())
    }

    /// Hosted checkout URL for the current cart.
    ///
    /// # Errors
    ///
    /// [`StorefrontError::NotFound`] when no cart exists yet,
    /// [`StorefrontError::MalformedResponse`] when the platform returned an
    /// unparseable URL.
    pub async fn checkout_url(&self) -> Result<Url, StorefrontError> {
        let current = self.current.lock().await;
        let cart = current
            .as_ref()
            .ok_or_else(|| StorefrontError::NotFound("cart".to_string()))?;
        Url::parse(&cart.checkout_url).map_err(|e| StorefrontError::MalformedResponse {
            detail: format!("checkout url: {e}"),
        })
    }

    /// The current snapshot, if any.
    pub async fn current(&self) -> Option<Cart> {
        self.current.lock().await.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::storage::MemoryStore;

    fn manager() -> CartManager<MemoryStore> {
        let client = StorefrontClient::builder(test_config(), MemoryStore::default())
            .build()
            .unwrap();
        CartManager::new(client)
    }

    #[tokio::test]
    async fn session_roundtrip_and_clear() {
        let client = StorefrontClient::builder(test_config(), MemoryStore::default())
            .build()
            .unwrap();
        let session = CartSession::new(client.store());
        session.save("gid://shopify/Cart/abc123").await;
        assert_eq!(
            session.load().await.as_deref(),
            Some("gid://shopify/Cart/abc123")
        );
        session.clear().await;
        assert!(session.load().await.is_none());
    }

    #[tokio::test]
    async fn uninitialized_manager_reports_empty() {
        let m = manager();
        assert_eq!(m.item_count().await, 0);
        assert_eq!(m.total().await, "0");
        assert!(matches!(
            m.checkout_url().await,
            Err(StorefrontError::NotFound(_))
        ));
    }

    #[test]
    fn gone_cart_user_error_maps_to_not_found() {
        let err = map_user_errors(&[UserError {
            field: None,
            message: "The specified cart does not exist.".to_string(),
        }]);
        assert!(err.is_cart_gone());
    }

    #[test]
    fn other_user_errors_map_to_operation_failed() {
        let err = map_user_errors(&[
            UserError {
                field: Some(vec!["lines".to_string()]),
                message: "Quantity must be positive".to_string(),
            },
            UserError {
                field: None,
                message: "Merchandise is sold out".to_string(),
            },
        ]);
        match err {
            StorefrontError::OperationFailed { detail } => {
                assert!(detail.contains("Quantity must be positive"));
                assert!(detail.contains("sold out"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
