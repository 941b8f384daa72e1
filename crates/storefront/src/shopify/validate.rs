//! Input validation and sanitization for values flowing into the Storefront
//! API.
//!
//! Identifier validators are strict whitelists: each pattern anchors start and
//! end and bounds length, and anything that does not match is rejected
//! outright. `validate_api_input` is the single choke point all outbound
//! GraphQL variables pass through.
//!
//! All functions are pure; nothing here touches the network or storage.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Maximum length of a sanitized string.
const MAX_STRING_LENGTH: usize = 1000;
/// Maximum number of elements kept when validating an array variable.
const MAX_ARRAY_ITEMS: usize = 100;
/// Maximum number of keys kept when validating an object variable.
const MAX_OBJECT_KEYS: usize = 50;
/// Maximum length of an object key after sanitization.
const MAX_KEY_LENGTH: usize = 100;

/// Quantity ceiling for read-side validation.
const MAX_QUANTITY: i64 = 999;
/// Per-line quantity cap enforced on write paths.
const MAX_LINE_QUANTITY: i64 = 100;

static SHOP_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]{0,60}\.myshopify\.com$").expect("valid pattern")
});
static PRODUCT_HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{1,255}$").expect("valid pattern"));
static CART_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^gid://shopify/Cart/[a-zA-Z0-9_-]{1,100}$").expect("valid pattern")
});
static VARIANT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^gid://shopify/ProductVariant/[0-9]{1,20}$").expect("valid pattern")
});
static LINE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^gid://shopify/CartLine/[a-zA-Z0-9_-]{1,100}$").expect("valid pattern")
});
static SEARCH_QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[a-zA-Z0-9\s\-_.,!?'"]{1,200}$"#).expect("valid pattern"));

/// Dangerous substrings rejected and stripped everywhere.
static DANGEROUS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?is)<script[^>]*>.*?</script>",
        r"(?i)javascript:",
        r"(?i)data:text/html",
        r"(?i)on\w+\s*=",
        r"(?i)<iframe[^>]*>",
        r"(?i)<object[^>]*>",
        r"(?i)<embed[^>]*>",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid pattern"))
    .collect()
});

/// Validate a shop domain (`*.myshopify.com`).
#[must_use]
pub fn validate_shop_domain(domain: &str) -> bool {
    SHOP_DOMAIN.is_match(domain)
}

/// Validate a product handle (URL-safe slug).
#[must_use]
pub fn validate_product_handle(handle: &str) -> bool {
    PRODUCT_HANDLE.is_match(handle)
}

/// Validate an opaque cart id.
#[must_use]
pub fn validate_cart_id(cart_id: &str) -> bool {
    CART_ID.is_match(cart_id)
}

/// Validate a variant (merchandise) id.
#[must_use]
pub fn validate_variant_id(variant_id: &str) -> bool {
    VARIANT_ID.is_match(variant_id)
}

/// Validate a cart line id.
#[must_use]
pub fn validate_line_id(line_id: &str) -> bool {
    LINE_ID.is_match(line_id)
}

/// Validate a quantity on read paths: an integer in [0, 999].
#[must_use]
pub const fn validate_quantity(quantity: i64) -> bool {
    quantity >= 0 && quantity <= MAX_QUANTITY
}

/// Validate a quantity for an "add lines" mutation: [1, 100].
#[must_use]
pub const fn validate_add_quantity(quantity: i64) -> bool {
    quantity >= 1 && quantity <= MAX_LINE_QUANTITY
}

/// Validate a quantity for an "update lines" mutation: [0, 100], where 0
/// means "remove the line".
#[must_use]
pub const fn validate_update_quantity(quantity: i64) -> bool {
    quantity >= 0 && quantity <= MAX_LINE_QUANTITY
}

/// Validate a free-text search query: allowed character class, bounded
/// length, and none of the dangerous substrings.
#[must_use]
pub fn validate_search_query(query: &str) -> bool {
    SEARCH_QUERY.is_match(query) && !contains_dangerous_content(query)
}

/// Whether the input contains any denylisted dangerous substring.
#[must_use]
pub fn contains_dangerous_content(input: &str) -> bool {
    DANGEROUS_PATTERNS.iter().any(|p| p.is_match(input))
}

/// Sanitize a free-text value: strip dangerous patterns, HTML-entity-encode
/// the critical characters, and truncate to the maximum length.
#[must_use]
pub fn sanitize_string(input: &str) -> String {
    let mut sanitized = input.to_string();
    for pattern in DANGEROUS_PATTERNS.iter() {
        sanitized = pattern.replace_all(&sanitized, "").into_owned();
    }

    // Ampersand first, so the encodings below are not double-encoded.
    let sanitized = sanitized
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
        .replace('/', "&#x2F;");

    sanitized.chars().take(MAX_STRING_LENGTH).collect()
}

/// Recursively validate and sanitize an arbitrary GraphQL variable value.
///
/// Strings are sanitized, non-finite numbers are coerced to 0, arrays are
/// truncated to 100 elements, objects are truncated to 50 keys with each key
/// sanitized before recursion. Every outbound variable set passes through
/// here before a request is built.
#[must_use]
pub fn validate_api_input(input: Value) -> Value {
    match input {
        // Identifiers that already passed a whitelist must survive unchanged;
        // entity-encoding would corrupt the `gid://` scheme.
        Value::String(s) if is_whitelisted_identifier(&s) => Value::String(s),
        Value::String(s) => Value::String(sanitize_string(&s)),
        Value::Number(n) => {
            // serde_json numbers cannot encode NaN/infinity, but a custom
            // Number could in principle fail the finite check.
            if n.as_f64().is_some_and(f64::is_finite) {
                Value::Number(n)
            } else {
                Value::from(0)
            }
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .take(MAX_ARRAY_ITEMS)
                .map(validate_api_input)
                .collect(),
        ),
        Value::Object(fields) => {
            let mut sanitized = Map::new();
            for (key, value) in fields.into_iter().take(MAX_OBJECT_KEYS) {
                let key = sanitize_string(&key);
                if !key.is_empty() && key.len() <= MAX_KEY_LENGTH {
                    sanitized.insert(key, validate_api_input(value));
                }
            }
            Value::Object(sanitized)
        }
        other => other,
    }
}

fn is_whitelisted_identifier(s: &str) -> bool {
    CART_ID.is_match(s) || VARIANT_ID.is_match(s) || LINE_ID.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cart_id_whitelist() {
        assert!(validate_cart_id("gid://shopify/Cart/abc123"));
        assert!(validate_cart_id("gid://shopify/Cart/c1-f9a_B7"));
        assert!(!validate_cart_id("'; DROP TABLE carts; --"));
        assert!(!validate_cart_id("gid://shopify/Cart/"));
        assert!(!validate_cart_id("gid://shopify/Product/abc123"));
    }

    #[test]
    fn variant_id_is_numeric_only() {
        assert!(validate_variant_id("gid://shopify/ProductVariant/42424242"));
        assert!(!validate_variant_id("gid://shopify/ProductVariant/abc"));
        assert!(!validate_variant_id("gid://shopify/ProductVariant/"));
    }

    #[test]
    fn line_id_whitelist() {
        assert!(validate_line_id("gid://shopify/CartLine/def-456"));
        assert!(!validate_line_id("gid://shopify/CartLine/<img>"));
    }

    #[test]
    fn handle_whitelist() {
        assert!(validate_product_handle("pantalla-iphone-12"));
        assert!(validate_product_handle("bateria_iphone_13_pro"));
        assert!(!validate_product_handle(""));
        assert!(!validate_product_handle("pantalla/iphone"));
        assert!(!validate_product_handle(&"a".repeat(256)));
    }

    #[test]
    fn shop_domain_whitelist() {
        assert!(validate_shop_domain("movilparts.myshopify.com"));
        assert!(!validate_shop_domain("movilparts.example.com"));
        assert!(!validate_shop_domain("-bad.myshopify.com"));
        assert!(!validate_shop_domain("evil.com#.myshopify.com"));
    }

    #[test]
    fn quantity_bounds() {
        assert!(validate_quantity(0));
        assert!(validate_quantity(999));
        assert!(!validate_quantity(-1));
        assert!(!validate_quantity(1000));
    }

    #[test]
    fn write_path_quantity_bounds() {
        assert!(validate_add_quantity(1));
        assert!(validate_add_quantity(100));
        assert!(!validate_add_quantity(0));
        assert!(!validate_add_quantity(101));

        assert!(validate_update_quantity(0));
        assert!(validate_update_quantity(100));
        assert!(!validate_update_quantity(-1));
        assert!(!validate_update_quantity(101));
    }

    #[test]
    fn search_query_rules() {
        assert!(validate_search_query("pantalla iphone 12"));
        assert!(validate_search_query("bateria, 13 pro!"));
        assert!(!validate_search_query(""));
        assert!(!validate_search_query("<script>alert(1)</script>"));
        assert!(!validate_search_query(&"a".repeat(201)));
    }

    #[test]
    fn sanitize_is_identity_on_safe_input() {
        assert_eq!(sanitize_string("pantalla iphone 12"), "pantalla iphone 12");
    }

    #[test]
    fn sanitize_strips_script_and_encodes_rest() {
        let out = sanitize_string("<script>alert(1)</script><b>hi</b>");
        assert!(!out.contains("<script"));
        assert!(!out.contains("alert"));
        assert_eq!(out, "&lt;b&gt;hi&lt;&#x2F;b&gt;");
    }

    #[test]
    fn sanitize_strips_event_handlers_and_schemes() {
        let out = sanitize_string("<img src=x onerror=alert(1)> javascript:void(0)");
        assert!(!out.to_lowercase().contains("onerror="));
        assert!(!out.to_lowercase().contains("javascript:"));
    }

    #[test]
    fn sanitize_truncates_long_input() {
        let out = sanitize_string(&"x".repeat(5000));
        assert_eq!(out.chars().count(), 1000);
    }

    #[test]
    fn api_input_sanitizes_nested_strings() {
        let input = json!({
            "query": "<script>x</script>pantalla",
            "nested": { "note": "a&b" },
        });
        let out = validate_api_input(input);
        assert_eq!(out["query"], "pantalla");
        assert_eq!(out["nested"]["note"], "a&amp;b");
    }

    #[test]
    fn api_input_passes_platform_ids_through() {
        let input = json!({
            "cartId": "gid://shopify/Cart/abc123",
            "lines": [{ "merchandiseId": "gid://shopify/ProductVariant/42", "quantity": 1 }],
        });
        let out = validate_api_input(input);
        assert_eq!(out["cartId"], "gid://shopify/Cart/abc123");
        assert_eq!(
            out["lines"][0]["merchandiseId"],
            "gid://shopify/ProductVariant/42"
        );
    }

    #[test]
    fn api_input_truncates_arrays() {
        let input = Value::Array((0..250).map(Value::from).collect());
        let Value::Array(items) = validate_api_input(input) else {
            panic!("expected array");
        };
        assert_eq!(items.len(), 100);
    }

    #[test]
    fn api_input_truncates_and_sanitizes_object_keys() {
        let mut fields = Map::new();
        for i in 0..80 {
            fields.insert(format!("key{i:03}"), Value::from(i));
        }
        fields.insert("<script>bad</script>".to_string(), Value::from(1));
        let Value::Object(out) = validate_api_input(Value::Object(fields)) else {
            panic!("expected object");
        };
        assert!(out.len() <= 50);
        assert!(out.keys().all(|k| !k.contains('<')));
    }

    #[test]
    fn api_input_passes_scalars_through() {
        assert_eq!(validate_api_input(json!(true)), json!(true));
        assert_eq!(validate_api_input(json!(null)), json!(null));
        assert_eq!(validate_api_input(json!(42)), json!(42));
    }
}
