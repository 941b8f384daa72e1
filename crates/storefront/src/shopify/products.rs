//! Product catalog reads.

use movilparts_core::Product;
use serde_json::json;
use tracing::debug;

use crate::error::StorefrontError;
use crate::shopify::client::StorefrontClient;
use crate::shopify::rate_limit::EndpointClass;
use crate::shopify::wire::{ProductByHandleData, ProductsData};
use crate::shopify::{queries, validate};
use crate::storage::StorageBackend;

/// Most products one page may request.
pub const MAX_PAGE_SIZE: i64 = 250;

/// Read-side product service. All responses flow through the client's
/// response cache, so repeated catalog renders within the TTL cost one
/// upstream request.
#[derive(Debug, Clone)]
pub struct ProductCatalog<B: StorageBackend> {
    client: StorefrontClient<B>,
}

impl<B: StorageBackend> ProductCatalog<B> {
    pub fn new(client: StorefrontClient<B>) -> Self {
        Self { client }
    }

    /// Fetch up to `count` products, optionally filtered by a free-text
    /// search. `count` must be in `1..=250` (the platform's page ceiling);
    /// an empty result is a normal outcome, not an error.
    ///
    /// # Errors
    ///
    /// [`StorefrontError::Validation`] when `count` is out of range or the
    /// search text fails the whitelist, or any transport error from the
    /// client.
    pub async fn get_products(
        &self,
        count: i64,
        search: Option<&str>,
    ) -> Result<Vec<Product>, StorefrontError> {
        if !(1..=MAX_PAGE_SIZE).contains(&count) {
            return Err(StorefrontError::Validation {
                detail: format!("product count {count} out of range"),
            });
        }
        if let Some(text) = search
            && !validate::validate_search_query(text)
        {
            return Err(StorefrontError::Validation {
                detail: "search query failed whitelist".to_string(),
            });
        }

        let data: ProductsData = self
            .client
            .request_as(
                queries::GET_PRODUCTS,
                json!({ "first": count, "query": search }),
                EndpointClass::Products,
            )
            .await?;
        let products: Vec<Product> = data
            .products
            .edges
            .into_iter()
            .map(|e| e.node.into())
            .collect();
        debug!(count = products.len(), "fetched products");
        Ok(products)
    }

    /// Fetch one product by handle.
    ///
    /// # Errors
    ///
    /// [`StorefrontError::Validation`] for a malformed handle,
    /// [`StorefrontError::NotFound`] when the handle does not exist.
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Product, StorefrontError> {
        if !validate::validate_product_handle(handle) {
            return Err(StorefrontError::Validation {
                detail: "product handle failed whitelist".to_string(),
            });
        }

        let data: ProductByHandleData = self
            .client
            .request_as(
                queries::GET_PRODUCT_BY_HANDLE,
                json!({ "handle": handle }),
                EndpointClass::Products,
            )
            .await?;
        data.product_by_handle
            .map(Product::from)
            .ok_or_else(|| StorefrontError::NotFound(handle.to_string()))
    }
}
