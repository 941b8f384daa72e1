//! In-process mock of the Storefront GraphQL endpoint.
//!
//! Tests enqueue scripted responses; every incoming POST pops the next one.
//! An unscripted request is answered with a 500 so the test fails loudly
//! instead of hanging.

#![allow(dead_code)] // each test binary uses a different slice of this module

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use movilparts_storefront::config::{Environment, StorefrontConfig};
use secrecy::SecretString;
use serde_json::{Value, json};

/// One canned HTTP response.
pub struct Scripted {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, String)>,
    pub body: Value,
}

#[derive(Clone)]
struct AppState {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<Value>>>,
    hits: Arc<AtomicUsize>,
}

/// Handle to the running mock server.
pub struct MockShopify {
    /// Endpoint URL to point the client at.
    pub url: String,
    state: AppState,
}

/// Install a log subscriber for the test binary; `RUST_LOG` controls
/// verbosity. Repeated calls are no-ops.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "movilparts_storefront=debug".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

impl MockShopify {
    /// Bind on an ephemeral port and start serving.
    pub async fn start() -> Self {
        init_tracing();
        let state = AppState {
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            hits: Arc::new(AtomicUsize::new(0)),
        };
        let router = axum::Router::new()
            .route("/", post(handle))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock listener");
        let addr = listener.local_addr().expect("mock listener addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve mock");
        });
        Self {
            url: format!("http://{addr}/"),
            state,
        }
    }

    /// Enqueue a 200 response with the given `data` payload.
    pub fn push_data(&self, data: Value) {
        self.push(Scripted {
            status: StatusCode::OK,
            headers: vec![],
            body: json!({ "data": data }),
        });
    }

    /// Enqueue a bare status with an empty JSON body.
    pub fn push_status(&self, status: StatusCode) {
        self.push(Scripted {
            status,
            headers: vec![],
            body: json!({}),
        });
    }

    /// Enqueue a 429 with a `Retry-After` header.
    pub fn push_throttle(&self, retry_after_secs: u64) {
        self.push(Scripted {
            status: StatusCode::TOO_MANY_REQUESTS,
            headers: vec![("retry-after", retry_after_secs.to_string())],
            body: json!({}),
        });
    }

    /// Enqueue a 200 carrying top-level GraphQL errors with the given code.
    pub fn push_graphql_error(&self, code: &str, message: &str) {
        self.push(Scripted {
            status: StatusCode::OK,
            headers: vec![],
            body: json!({
                "errors": [
                    { "message": message, "extensions": { "code": code } }
                ]
            }),
        });
    }

    /// Enqueue a syntactically broken payload.
    pub fn push_garbage(&self) {
        self.push(Scripted {
            status: StatusCode::OK,
            headers: vec![],
            body: json!("not an envelope"),
        });
    }

    pub fn push(&self, scripted: Scripted) {
        self.state
            .script
            .lock()
            .expect("script lock")
            .push_back(scripted);
    }

    /// Number of requests actually received.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Bodies of the requests received so far, in order.
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().expect("requests lock").clone()
    }
}

async fn handle(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().expect("requests lock").push(body);

    let Some(scripted) = state.script.lock().expect("script lock").pop_front() else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "errors": [{ "message": "unscripted request" }] })),
        )
            .into_response();
    };
    let mut headers = HeaderMap::new();
    for (name, value) in scripted.headers {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_str(&value).expect("scripted header value"),
        );
    }
    (scripted.status, headers, Json(scripted.body)).into_response()
}

// ============================================================================
// Fixtures
// ============================================================================

/// Config pointing at a local mock; never reads the process environment.
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        shop_domain: "movilparts.myshopify.com".to_string(),
        storefront_token: SecretString::from("shpat_9f8a7b6c5d4e3f2a1b0c"),
        api_version: "2024-01".to_string(),
        app_url: None,
        webhook_secret: None,
        request_timeout: Duration::from_secs(5),
        environment: Environment::Development,
        enable_analytics: false,
        debug_mode: false,
    }
}

/// Wire-shaped cart JSON as the platform would return it.
pub fn cart_json(id: &str, total_quantity: i64) -> Value {
    json!({
        "id": id,
        "checkoutUrl": "https://movilparts.myshopify.com/checkout/abc",
        "totalQuantity": total_quantity,
        "cost": { "totalAmount": { "amount": "49.99", "currencyCode": "EUR" } },
        "lines": { "edges": [
            {
                "node": {
                    "id": "gid://shopify/CartLine/l1",
                    "quantity": total_quantity,
                    "merchandise": {
                        "id": "gid://shopify/ProductVariant/11",
                        "title": "Negro",
                        "product": {
                            "title": "Pantalla iPhone 12",
                            "handle": "pantalla-iphone-12"
                        },
                        "image": null,
                        "price": { "amount": "49.99", "currencyCode": "EUR" }
                    }
                }
            }
        ]}
    })
}

/// Wire-shaped product JSON.
pub fn product_json(handle: &str) -> Value {
    json!({
        "id": "gid://shopify/Product/1",
        "title": "Pantalla iPhone 12",
        "description": "Pantalla OLED de repuesto",
        "handle": handle,
        "productType": "Pantallas",
        "tags": ["iphone-12", "pantalla"],
        "images": { "edges": [] },
        "variants": { "edges": [
            {
                "node": {
                    "id": "gid://shopify/ProductVariant/11",
                    "title": "Negro",
                    "price": { "amount": "49.99", "currencyCode": "EUR" },
                    "compareAtPrice": null,
                    "availableForSale": true,
                    "quantityAvailable": 4
                }
            }
        ]}
    })
}
