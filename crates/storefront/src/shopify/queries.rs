//! GraphQL documents for the Storefront API.
//!
//! The field shapes (including the edges/node pagination envelopes) are a
//! collaborator contract with the platform's versioned schema; keep them
//! exactly as the API defines them. Cache keys are derived from the leading
//! text of these documents, so the operation name appears early.

/// Paginated product list with optional free-text filter.
pub const GET_PRODUCTS: &str = r"
query getProducts($first: Int!, $query: String) {
  products(first: $first, query: $query) {
    edges {
      node {
        id
        title
        description
        handle
        productType
        tags
        images(first: 5) {
          edges {
            node {
              id
              url
              altText
            }
          }
        }
        variants(first: 10) {
          edges {
            node {
              id
              title
              price {
                amount
                currencyCode
              }
              compareAtPrice {
                amount
                currencyCode
              }
              availableForSale
              quantityAvailable
            }
          }
        }
      }
    }
  }
}
";

/// Single product lookup by handle; more images and variants than the list
/// view needs.
pub const GET_PRODUCT_BY_HANDLE: &str = r"
query getProductByHandle($handle: String!) {
  productByHandle(handle: $handle) {
    id
    title
    description
    handle
    productType
    tags
    images(first: 10) {
      edges {
        node {
          id
          url
          altText
        }
      }
    }
    variants(first: 20) {
      edges {
        node {
          id
          title
          price {
            amount
            currencyCode
          }
          compareAtPrice {
            amount
            currencyCode
          }
          availableForSale
          quantityAvailable
        }
      }
    }
  }
}
";

/// Splices the shared cart selection between a document head and tail.
/// Every cart operation returns the same cart shape.
macro_rules! cart_document {
    ($head:expr, $tail:expr) => {
        concat!(
            $head,
            r"
    id
    checkoutUrl
    totalQuantity
    cost {
      totalAmount {
        amount
        currencyCode
      }
    }
    lines(first: 100) {
      edges {
        node {
          id
          quantity
          merchandise {
            ... on ProductVariant {
              id
              title
              product {
                title
                handle
              }
              image {
                url
                altText
              }
              price {
                amount
                currencyCode
              }
            }
          }
        }
      }
    }",
            $tail,
        )
    };
}

/// Create an empty cart.
pub const CART_CREATE: &str = cart_document!(
    r"
mutation cartCreate {
  cartCreate {
    cart {",
    r"
    }
    userErrors {
      field
      message
    }
  }
}
"
);

/// Fetch a cart by id. Returns null for unknown or expired carts.
pub const GET_CART: &str = cart_document!(
    r"
query getCart($cartId: ID!) {
  cart(id: $cartId) {",
    r"
  }
}
"
);

/// Add lines to a cart.
pub const CART_LINES_ADD: &str = cart_document!(
    r"
mutation cartLinesAdd($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart {",
    r"
    }
    userErrors {
      field
      message
    }
  }
}
"
);

/// Update line quantities; quantity 0 removes a line.
pub const CART_LINES_UPDATE: &str = cart_document!(
    r"
mutation cartLinesUpdate($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart {",
    r"
    }
    userErrors {
      field
      message
    }
  }
}
"
);
