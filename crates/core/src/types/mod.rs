//! Domain types shared across MovilParts components.

mod cart;
mod money;
mod product;

pub use cart::{Cart, CartCost, CartItem, CartLine, CartMerchandise};
pub use money::Money;
pub use product::{Product, ProductImage, ProductVariant};
