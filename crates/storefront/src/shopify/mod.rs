//! Storefront API integration.
//!
//! [`client::StorefrontClient`] owns the transport pipeline (throttle,
//! sanitize, cache, HTTP, envelope handling); [`products`] and [`cart`] are
//! the domain services built on top of it.

pub mod cache;
pub mod cart;
pub mod client;
pub mod products;
pub mod queries;
pub mod rate_limit;
pub mod validate;
pub mod wire;

pub use cart::{CartManager, CartService, CartSession};
pub use client::{StorefrontClient, StorefrontClientBuilder};
pub use products::ProductCatalog;
pub use rate_limit::EndpointClass;
