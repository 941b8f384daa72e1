//! MovilParts Storefront API client.
//!
//! Client library for the MovilParts iPhone-parts storefront. It wraps the
//! commerce platform's Storefront GraphQL endpoint with a hardened request
//! pipeline and a client-side cart session lifecycle. The UI layer consumes
//! this crate; it contains no rendering, routing, or checkout logic.
//!
//! # Architecture
//!
//! Every operation flows through [`shopify::StorefrontClient`]:
//!
//! ```text
//! rate-limit -> validate -> cache -> network (timeout) -> classify -> cache
//! ```
//!
//! - [`shopify::ProductCatalog`] - typed product reads
//! - [`shopify::CartManager`] - cart mutations plus persisted session
//!   lifecycle (create, restore, expire, recreate on upstream invalidation)
//! - [`storage::SecureStore`] - obfuscated, TTL-bearing wrapper around a
//!   pluggable key-value backend holding the cart session id
//!
//! The platform is the source of truth: no local product sync, and carts are
//! never deleted locally - they expire upstream or are recreated when the
//! platform reports them gone.
//!
//! # Example
//!
//! ```rust,ignore
//! use movilparts_storefront::config::StorefrontConfig;
//! use movilparts_storefront::shopify::{CartManager, ProductCatalog, StorefrontClient};
//! use movilparts_storefront::storage::MemoryStore;
//!
//! let config = StorefrontConfig::from_env()?;
//! let client = StorefrontClient::builder(config, MemoryStore::default()).build()?;
//!
//! let catalog = ProductCatalog::new(client.clone());
//! let screens = catalog.get_products(20, Some("pantalla")).await?;
//!
//! let cart = CartManager::new(client);
//! cart.initialize().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod shopify;
pub mod storage;
