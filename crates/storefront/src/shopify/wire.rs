//! Serde mappings for the Storefront API's JSON shapes.
//!
//! The API nests list fields in edges/node pagination envelopes and uses
//! camelCase keys; these types absorb both so the rest of the crate only sees
//! the flat domain types from `movilparts_core`.

use movilparts_core::{
    Cart, CartCost, CartLine, CartMerchandise, Money, Product, ProductImage, ProductVariant,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Shared envelopes
// ============================================================================

/// A paginated connection. We never page past the first window, so only the
/// node contents matter.
#[derive(Debug, Deserialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

impl<T> Connection<T> {
    fn into_nodes(self) -> Vec<T> {
        self.edges.into_iter().map(|e| e.node).collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMoney {
    pub amount: String,
    pub currency_code: String,
}

impl From<WireMoney> for Money {
    fn from(m: WireMoney) -> Self {
        Money {
            amount: m.amount,
            currency_code: m.currency_code,
        }
    }
}

/// A recoverable input error reported inside a successful mutation response.
#[derive(Debug, Deserialize)]
pub struct UserError {
    pub field: Option<Vec<String>>,
    pub message: String,
}

// ============================================================================
// Products
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireImage {
    pub id: Option<String>,
    pub url: String,
    pub alt_text: Option<String>,
}

impl From<WireImage> for ProductImage {
    fn from(i: WireImage) -> Self {
        ProductImage {
            id: i.id,
            url: i.url,
            alt_text: i.alt_text,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireVariant {
    pub id: String,
    pub title: String,
    pub price: WireMoney,
    pub compare_at_price: Option<WireMoney>,
    pub available_for_sale: bool,
    pub quantity_available: Option<i64>,
}

impl From<WireVariant> for ProductVariant {
    fn from(v: WireVariant) -> Self {
        ProductVariant {
            id: v.id,
            title: v.title,
            price: v.price.into(),
            compare_at_price: v.compare_at_price.map(Money::from),
            available_for_sale: v.available_for_sale,
            quantity_available: v.quantity_available,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProduct {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub handle: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub images: Connection<WireImage>,
    pub variants: Connection<WireVariant>,
}

impl From<WireProduct> for Product {
    fn from(p: WireProduct) -> Self {
        Product {
            id: p.id,
            title: p.title,
            description: p.description,
            handle: p.handle,
            product_type: p.product_type,
            tags: p.tags,
            images: p.images.into_nodes().into_iter().map(Into::into).collect(),
            variants: p.variants.into_nodes().into_iter().map(Into::into).collect(),
        }
    }
}

/// `data` for the product list query.
#[derive(Debug, Deserialize)]
pub struct ProductsData {
    pub products: Connection<WireProduct>,
}

/// `data` for the product-by-handle query. `None` means the handle does not
/// exist, which is not a transport error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductByHandleData {
    pub product_by_handle: Option<WireProduct>,
}

// ============================================================================
// Cart
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct WireProductRef {
    pub title: String,
    pub handle: String,
}

#[derive(Debug, Deserialize)]
pub struct WireMerchandise {
    pub id: String,
    pub title: String,
    pub product: WireProductRef,
    pub image: Option<WireImage>,
    pub price: WireMoney,
}

impl From<WireMerchandise> for CartMerchandise {
    fn from(m: WireMerchandise) -> Self {
        CartMerchandise {
            id: m.id,
            title: m.title,
            product_title: m.product.title,
            product_handle: m.product.handle,
            image: m.image.map(Into::into),
            price: m.price.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireCartLine {
    pub id: String,
    pub quantity: i64,
    pub merchandise: WireMerchandise,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCartCost {
    pub total_amount: WireMoney,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCart {
    pub id: String,
    pub checkout_url: String,
    pub total_quantity: i64,
    pub cost: WireCartCost,
    pub lines: Connection<WireCartLine>,
}

impl From<WireCart> for Cart {
    fn from(c: WireCart) -> Self {
        Cart {
            id: c.id,
            checkout_url: c.checkout_url,
            total_quantity: c.total_quantity,
            cost: CartCost {
                total_amount: c.cost.total_amount.into(),
            },
            lines: c
                .lines
                .into_nodes()
                .into_iter()
                .map(|l| CartLine {
                    id: l.id,
                    quantity: l.quantity,
                    merchandise: l.merchandise.into(),
                })
                .collect(),
        }
    }
}

/// Payload shared by every cart mutation: the cart on success, user errors on
/// recoverable input problems.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayload {
    pub cart: Option<WireCart>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCreateData {
    pub cart_create: CartPayload,
}

#[derive(Debug, Deserialize)]
pub struct GetCartData {
    pub cart: Option<WireCart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesAddData {
    pub cart_lines_add: CartPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinesUpdateData {
    pub cart_lines_update: CartPayload,
}

// ============================================================================
// Mutation inputs
// ============================================================================

/// `CartLineInput` for `cartLinesAdd`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub merchandise_id: String,
    pub quantity: i64,
}

/// `CartLineUpdateInput` for `cartLinesUpdate`.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineUpdateInput {
    pub id: String,
    pub quantity: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn product_flattens_connections() {
        let wire: WireProduct = serde_json::from_value(json!({
            "id": "gid://shopify/Product/1",
            "title": "Pantalla iPhone 12",
            "description": "Pantalla OLED de repuesto",
            "handle": "pantalla-iphone-12",
            "productType": "Pantallas",
            "tags": ["iphone-12"],
            "images": {"edges": [
                {"node": {"id": "gid://shopify/ProductImage/1", "url": "https://cdn.example/p.jpg", "altText": null}}
            ]},
            "variants": {"edges": [
                {"node": {
                    "id": "gid://shopify/ProductVariant/11",
                    "title": "Negro",
                    "price": {"amount": "49.99", "currencyCode": "EUR"},
                    "compareAtPrice": {"amount": "69.99", "currencyCode": "EUR"},
                    "availableForSale": true,
                    "quantityAvailable": 4
                }}
            ]}
        }))
        .unwrap();

        let product = Product::from(wire);
        assert_eq!(product.handle, "pantalla-iphone-12");
        assert_eq!(product.images.len(), 1);
        assert_eq!(product.variants[0].price.amount, "49.99");
        assert_eq!(
            product.variants[0].compare_at_price.as_ref().map(|m| m.amount.as_str()),
            Some("69.99")
        );
    }

    #[test]
    fn cart_flattens_merchandise_product_ref() {
        let wire: WireCart = serde_json::from_value(json!({
            "id": "gid://shopify/Cart/abc123",
            "checkoutUrl": "https://tienda.myshopify.com/checkout",
            "totalQuantity": 2,
            "cost": {"totalAmount": {"amount": "99.98", "currencyCode": "EUR"}},
            "lines": {"edges": [
                {"node": {
                    "id": "gid://shopify/CartLine/l1",
                    "quantity": 2,
                    "merchandise": {
                        "id": "gid://shopify/ProductVariant/11",
                        "title": "Negro",
                        "product": {"title": "Pantalla iPhone 12", "handle": "pantalla-iphone-12"},
                        "image": null,
                        "price": {"amount": "49.99", "currencyCode": "EUR"}
                    }
                }}
            ]}
        }))
        .unwrap();

        let cart = Cart::from(wire);
        assert!(cart.quantities_consistent());
        assert_eq!(cart.lines[0].merchandise.product_handle, "pantalla-iphone-12");
    }

    #[test]
    fn user_errors_default_to_empty() {
        let payload: CartPayload = serde_json::from_value(json!({"cart": null})).unwrap();
        assert!(payload.user_errors.is_empty());
    }

    #[test]
    fn line_input_serializes_camel_case() {
        let input = CartLineInput {
            merchandise_id: "gid://shopify/ProductVariant/11".to_string(),
            quantity: 1,
        };
        let value = serde_json::to_value(&input).unwrap();
        assert!(value.get("merchandiseId").is_some());
    }
}
