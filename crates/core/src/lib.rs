//! MovilParts Core - Shared domain types.
//!
//! This crate provides the common types used across MovilParts components:
//! - `storefront` - Storefront API client (products, cart, sessions)
//!
//! # Architecture
//!
//! The core crate contains only types and invariant helpers - no I/O, no HTTP
//! clients. Everything here is externally owned data fetched from the commerce
//! platform; nothing is mutated locally except through the client's typed
//! operations.
//!
//! # Modules
//!
//! - [`types`] - Money, products, variants, carts, and cart lines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
