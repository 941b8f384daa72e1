//! Product and variant types.
//!
//! Products are read-only and externally owned: fetched on demand from the
//! Storefront API, never mutated locally, cached transiently by the client.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::Money;

/// A product image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    /// Image ID.
    pub id: Option<String>,
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
}

/// A product variant (a purchasable configuration, e.g. one screen color).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Variant ID (`gid://shopify/ProductVariant/...`).
    pub id: String,
    /// Variant title.
    pub title: String,
    /// Current price.
    pub price: Money,
    /// Compare-at price (original price when on sale). When present it is
    /// typically >= `price` and drives the discount display.
    pub compare_at_price: Option<Money>,
    /// Whether the variant can currently be purchased.
    pub available_for_sale: bool,
    /// Quantity available, when inventory tracking is enabled.
    pub quantity_available: Option<i64>,
}

impl ProductVariant {
    /// Discount percentage implied by the compare-at price, rounded to the
    /// nearest whole percent. `None` when there is no discount to display
    /// (no compare-at price, compare-at <= price, or unparseable amounts).
    #[must_use]
    pub fn discount_percent(&self) -> Option<Decimal> {
        let price = self.price.amount_decimal()?;
        let compare_at = self.compare_at_price.as_ref()?.amount_decimal()?;
        if compare_at <= price || compare_at <= Decimal::ZERO {
            return None;
        }
        let fraction = (compare_at - price) / compare_at;
        Some((fraction * Decimal::ONE_HUNDRED).round())
    }
}

/// A product in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: String,
    /// Product title.
    pub title: String,
    /// Plain text description.
    pub description: String,
    /// URL-safe handle (unique slug, distinct from the opaque id).
    pub handle: String,
    /// Product type/category (e.g. "Pantallas", "Baterias").
    pub product_type: String,
    /// Product tags.
    pub tags: Vec<String>,
    /// Product images, in display order.
    pub images: Vec<ProductImage>,
    /// Product variants, in display order.
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// First variant that is available for sale, if any.
    #[must_use]
    pub fn first_available_variant(&self) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.available_for_sale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(price: &str, compare_at: Option<&str>) -> ProductVariant {
        ProductVariant {
            id: "gid://shopify/ProductVariant/1".to_string(),
            title: "Negro".to_string(),
            price: Money::new(price, "EUR"),
            compare_at_price: compare_at.map(|a| Money::new(a, "EUR")),
            available_for_sale: true,
            quantity_available: Some(3),
        }
    }

    #[test]
    fn discount_percent_from_compare_at() {
        let v = variant("75.00", Some("100.00"));
        assert_eq!(v.discount_percent(), Some(Decimal::from(25)));
    }

    #[test]
    fn no_discount_without_compare_at() {
        assert_eq!(variant("75.00", None).discount_percent(), None);
    }

    #[test]
    fn no_discount_when_compare_at_not_higher() {
        assert_eq!(variant("75.00", Some("75.00")).discount_percent(), None);
        assert_eq!(variant("75.00", Some("50.00")).discount_percent(), None);
    }

    #[test]
    fn first_available_variant_skips_sold_out() {
        let mut sold_out = variant("10.00", None);
        sold_out.available_for_sale = false;
        let available = variant("12.00", None);
        let product = Product {
            id: "gid://shopify/Product/1".to_string(),
            title: "Pantalla iPhone 12".to_string(),
            description: String::new(),
            handle: "pantalla-iphone-12".to_string(),
            product_type: "Pantallas".to_string(),
            tags: vec![],
            images: vec![],
            variants: vec![sold_out, available],
        };
        assert_eq!(
            product.first_available_variant().map(|v| v.price.amount.as_str()),
            Some("12.00")
        );
    }
}
