//! Shared harness: the full router over in-memory stores.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use cartwright_api::config::AppConfig;
use cartwright_api::db::memory::{MemoryCartStore, MemoryProductStore, MemoryUserStore};
use cartwright_api::models::Product;
use cartwright_api::routes;
use cartwright_api::services::TokenService;
use cartwright_api::state::AppState;
use cartwright_core::ProductId;

/// Raw (non-base64) signing secret, comfortably over 32 bytes.
pub const TEST_SECRET: &str = "integration-test-secret-0123456789";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub products: Arc<MemoryProductStore>,
}

/// Build the application over empty in-memory stores.
pub fn test_app() -> TestApp {
    let config = AppConfig {
        database_url: SecretString::from("postgres://unused/unused"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 0,
        jwt_secret: SecretString::from(TEST_SECRET),
        token_lifetime: Duration::from_secs(3600),
        sentry_dsn: None,
    };

    let tokens = Arc::new(
        TokenService::new(&config.jwt_secret, config.token_lifetime)
            .expect("test secret must derive a valid key"),
    );

    let users = Arc::new(MemoryUserStore::default());
    let products = Arc::new(MemoryProductStore::default());
    let cart = Arc::new(MemoryCartStore::default());

    let state = AppState::new(
        config,
        None,
        tokens,
        users,
        products.clone(),
        cart,
    );

    TestApp {
        router: routes::router(state.clone()),
        state,
        products,
    }
}

impl TestApp {
    /// Seed one catalog product.
    pub fn seed_product(&self, id: i64, name: &str, price: i64, in_stock: bool) {
        self.products.put(Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            price,
            in_stock,
        });
    }

    /// Fire one request at the router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Register an account and log it in, returning the bearer token.
    pub async fn register_and_login(&self, email: &str, password: &str) -> String {
        let response = self
            .send(json_request(
                "POST",
                "/auth/register",
                None,
                serde_json::json!({"email": email, "password": password}),
            ))
            .await;
        assert_eq!(response.status(), 201, "registration must succeed");

        let response = self
            .send(json_request(
                "POST",
                "/auth/login",
                None,
                serde_json::json!({"email": email, "password": password}),
            ))
            .await;
        assert_eq!(response.status(), 200, "login must succeed");

        let body = body_json(response).await;
        body["token"]
            .as_str()
            .expect("login response carries a token")
            .to_owned()
    }
}

/// Build a JSON request, optionally with a bearer token.
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    builder
        .body(Body::from(body.to_string()))
        .expect("request is well-formed")
}

/// Build a bodyless request, optionally with a bearer token.
pub fn bare_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    builder
        .body(Body::empty())
        .expect("request is well-formed")
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body is readable");
    serde_json::from_slice(&bytes).expect("body is JSON")
}
