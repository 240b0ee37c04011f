//! Common test utilities for API tests
//!
//! Builds the full router over the in-memory repositories, so the HTTP
//! surface can be exercised with `tower::ServiceExt::oneshot` and no
//! database. Trip distance is fixed at 8 km, which prices every ride at 12.50.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use ridehail_api::{
    app::{build_router, AppState},
    config::{ApiConfig, Config, DatabaseConfig, JwtConfig, RideConfig},
};
use ridehail_shared::{
    repository::Repositories,
    services::{FareEstimator, FixedDistance},
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const PASSWORD: &str = "Sturdy#Pass1";

pub fn test_config(require_available_driver: bool) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            ttl_minutes: 60,
        },
        rides: RideConfig {
            base_fare: 2.50,
            per_km_rate: 1.25,
            require_available_driver,
        },
    }
}

/// Router plus the state behind it
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config(false))
    }

    pub fn with_config(config: Config) -> Self {
        let fares = FareEstimator::new(config.fare_config(), Box::new(FixedDistance(8.0)));
        let state = AppState::with_fares(Repositories::in_memory(), config, fares);

        Self {
            app: build_router(state.clone()),
            state,
        }
    }

    /// Sends one request and returns the status and parsed JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body: {}", String::from_utf8_lossy(&bytes))
            })
        };

        (status, value)
    }

    /// Registers and logs in a rider; returns (rider id, token)
    pub async fn rider(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "name": "Rita Rider",
                    "email": email,
                    "phone": "+15550100",
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        let (status, body) = self
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        (
            body["user"]["id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    /// Registers a driver and logs in, which brings it online
    pub async fn driver(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .send(
                Method::POST,
                "/drivers/register",
                None,
                Some(json!({
                    "name": "Dan Driver",
                    "email": email,
                    "phone": "+15550199",
                    "license_number": "DL-0042",
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "driver register failed: {}", body);

        let (status, body) = self
            .send(
                Method::POST,
                "/drivers/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "driver login failed: {}", body);

        (
            body["driver"]["id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    /// Requests a ride from A to B; returns the ride id
    pub async fn request_ride(&self, rider_token: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/riders/request-ride",
                Some(rider_token),
                Some(json!({ "pickup": "A", "dropoff": "B" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "request-ride failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }
}
