//! Test helpers for split-service integration tests.
//!
//! The session store is in-memory, so tests spawn the real router on an
//! ephemeral port and drive it over HTTP; no external infrastructure is
//! required.

#![allow(dead_code)]

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{json, Value};

use service_core::middleware::rate_limit::create_ip_rate_limiter;
use split_service::config::{
    Environment, RateLimitConfig, SecurityConfig, SessionConfig, SplitConfig, SwaggerConfig,
    SwaggerMode,
};
use split_service::services::SessionStore;
use split_service::{build_router, AppState};

pub struct TestApp {
    pub address: String,
    client: reqwest::Client,
}

impl TestApp {
    /// Spawn the application with default test configuration.
    pub async fn spawn() -> Self {
        Self::spawn_with(test_config()).await
    }

    /// Spawn the application with a custom configuration.
    pub async fn spawn_with(config: SplitConfig) -> Self {
        split_service::services::metrics::init_metrics();

        let store = SessionStore::new(config.session.max_sessions, config.session.ttl_minutes);
        let ip_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.global_ip_limit,
            config.rate_limit.global_ip_window_seconds,
        );
        let state = AppState {
            config,
            store,
            ip_rate_limiter,
        };

        let router = build_router(state).await.expect("Failed to build router");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_empty(&self, path: &str) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn patch_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .patch(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Create a split and return the response body; asserts 201.
    pub async fn create_split(&self, body: &Value) -> Value {
        let response = self.post_json("/splits", body).await;
        assert_eq!(response.status(), 201, "split creation should succeed");
        response.json().await.expect("Failed to parse response")
    }

    /// Fetch the current split view; asserts 200.
    pub async fn get_split(&self, split_id: &str) -> Value {
        let response = self.get(&format!("/splits/{}", split_id)).await;
        assert_eq!(response.status(), 200);
        response.json().await.expect("Failed to parse response")
    }
}

pub fn test_config() -> SplitConfig {
    SplitConfig {
        common: service_core::config::Config { port: 0 },
        environment: Environment::Dev,
        service_name: "split-service-test".to_string(),
        service_version: "0.1.0".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Disabled,
        },
        rate_limit: RateLimitConfig {
            global_ip_limit: 10000,
            global_ip_window_seconds: 60,
        },
        session: SessionConfig {
            max_sessions: 1000,
            ttl_minutes: 60,
        },
    }
}

/// Burger + Fries receipt with 8% tax, matching the classic two-person
/// proportional split example.
pub fn sample_receipt() -> Value {
    json!({
        "store_name": "Sample Store",
        "items": [
            { "name": "Burger", "price": 8.99, "quantity": 1 },
            { "name": "Fries", "price": 3.49, "quantity": 1 }
        ],
        "tax_rate_percent": 8
    })
}

/// Parse a decimal-as-string JSON field.
pub fn money(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("expected a decimal string"))
        .expect("expected a parseable decimal")
}

/// The seeded person's id from a fresh split response.
pub fn first_person_id(split: &Value) -> String {
    split["people"][0]["id"]
        .as_str()
        .expect("expected a person id")
        .to_string()
}

pub fn split_id(split: &Value) -> String {
    split["split_id"]
        .as_str()
        .expect("expected a split id")
        .to_string()
}
