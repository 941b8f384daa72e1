//! Cart types.
//!
//! A cart is created once per browser session (or restored from a persisted
//! id), mutated through add/update operations, and never deleted explicitly -
//! it expires upstream or is discarded and recreated when the platform reports
//! it gone.

use serde::{Deserialize, Serialize};

use super::money::Money;
use super::product::ProductImage;

/// Snapshot of the variant referenced by a cart line ("merchandise" in the
/// platform's vocabulary).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartMerchandise {
    /// Variant ID.
    pub id: String,
    /// Variant title.
    pub title: String,
    /// Parent product title.
    pub product_title: String,
    /// Parent product handle.
    pub product_handle: String,
    /// Variant image.
    pub image: Option<ProductImage>,
    /// Unit price at the time the line was fetched.
    pub price: Money,
}

/// One quantity-bearing entry in a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Line ID, scoped to one cart.
    pub id: String,
    /// Quantity (>= 0; a requested 0 removes the line server-side).
    pub quantity: i64,
    /// The referenced variant snapshot.
    pub merchandise: CartMerchandise,
}

/// Cart cost summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartCost {
    /// Total amount.
    pub total_amount: Money,
}

/// A shopping cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Opaque cart ID (`gid://shopify/Cart/...`).
    pub id: String,
    /// Hosted checkout URL.
    pub checkout_url: String,
    /// Total line-item quantity.
    pub total_quantity: i64,
    /// Cost summary.
    pub cost: CartCost,
    /// Cart lines, in order.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Look up a line by id.
    #[must_use]
    pub fn line(&self, line_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    /// Whether `total_quantity` matches the sum of line quantities. The
    /// platform maintains this; the check exists for tests and debugging.
    #[must_use]
    pub fn quantities_consistent(&self) -> bool {
        self.total_quantity == self.lines.iter().map(|l| l.quantity).sum::<i64>()
    }
}

/// Input for adding a variant to the cart. Used only as a mutation parameter,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Variant ID to add.
    pub merchandise_id: String,
    /// Quantity to add.
    pub quantity: i64,
}
