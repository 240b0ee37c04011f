/// HTTP-level tests for the Ridehail API
///
/// These tests drive the full router (auth layers, extractors, error
/// mapping) over the in-memory repositories:
/// - Registration and login for riders and drivers
/// - Route-group role checks
/// - Ride request, accept, complete, cancel, history
/// - Uniform error bodies

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{test_config, TestApp, PASSWORD};
use serde_json::json;

fn assert_error(body: &serde_json::Value, code: &str) {
    assert_eq!(body["error"], code, "unexpected body: {}", body);
    assert!(body["message"].is_string(), "missing message: {}", body);
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_register_returns_user_without_password() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "name": "Rita Rider",
                "email": "Rita@Example.com",
                "phone": "+15550100",
                "password": PASSWORD,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "rita@example.com");
    assert_eq!(body["user"]["role"], "rider");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = TestApp::new();
    app.rider("rita@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "name": "Other",
                "email": "rita@example.com",
                "phone": "+15550101",
                "password": PASSWORD,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_error(&body, "conflict");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "name": "Rita Rider",
                "email": "not-an-email",
                "phone": "+15550100",
                "password": PASSWORD,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "validation_error");
    assert_eq!(body["details"][0]["field"], "email");

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "name": "Rita Rider",
                "email": "rita@example.com",
                "phone": "+15550100",
                "password": "weak",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "validation_error");
    assert_eq!(body["details"][0]["field"], "password");
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = TestApp::new();
    app.rider("rita@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "rita@example.com", "password": "Wrong#Pass1" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&body, "unauthorized");
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();
    let (status, body) = app.send_request(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "bad_request");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/riders/rides", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&body, "unauthorized");

    let (status, body) = app
        .send(Method::GET, "/drivers/profile", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&body, "unauthorized");
}

#[tokio::test]
async fn test_role_checks_between_route_groups() {
    let app = TestApp::new();
    let (_, rider_token) = app.rider("rita@example.com").await;
    let (_, driver_token) = app.driver("dan@example.com").await;

    let (status, body) = app
        .send(Method::GET, "/drivers/profile", Some(&rider_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error(&body, "forbidden");

    let (status, body) = app
        .send(Method::GET, "/riders/rides", Some(&driver_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error(&body, "forbidden");
}

#[tokio::test]
async fn test_driver_login_goes_online_and_profile_round_trip() {
    let app = TestApp::new();
    let (driver_id, token) = app.driver("dan@example.com").await;

    let (status, body) = app
        .send(Method::GET, "/drivers/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["driver"]["id"], driver_id.as_str());
    assert_eq!(body["driver"]["status"], "online");
    assert!(body["driver"].get("password_hash").is_none());

    let (status, body) = app
        .send(
            Method::PUT,
            "/drivers/profile",
            Some(&token),
            Some(json!({ "location": "Downtown" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["driver"]["location"], "Downtown");
    assert_eq!(body["driver"]["name"], "Dan Driver");
}

#[tokio::test]
async fn test_driver_status_updates() {
    let app = TestApp::new();
    let (_, token) = app.driver("dan@example.com").await;

    let (status, body) = app
        .send(
            Method::PUT,
            "/drivers/status",
            Some(&token),
            Some(json!({ "status": "offline" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["driver"]["status"], "offline");

    for invalid in ["busy", "sleeping"] {
        let (status, body) = app
            .send(
                Method::PUT,
                "/drivers/status",
                Some(&token),
                Some(json!({ "status": invalid })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "status {}", invalid);
        assert_error(&body, "bad_request");
    }
}

#[tokio::test]
async fn test_ride_lifecycle_over_http() {
    let app = TestApp::new();
    let (rider_id, rider_token) = app.rider("rita@example.com").await;
    let (driver_id, driver_token) = app.driver("dan@example.com").await;

    let (status, ride) = app
        .send(
            Method::POST,
            "/riders/request-ride",
            Some(&rider_token),
            Some(json!({ "pickup": "A", "dropoff": "B" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ride["status"], "requested");
    assert_eq!(ride["rider_id"], rider_id.as_str());
    assert!(ride["driver_id"].is_null());
    assert_eq!(ride["fare"], 12.5);
    let ride_id = ride["id"].as_str().unwrap().to_string();

    let (status, accepted) = app
        .send(
            Method::POST,
            "/drivers/accept-ride",
            Some(&driver_token),
            Some(json!({ "ride_id": ride_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "in_progress");
    assert_eq!(accepted["driver_id"], driver_id.as_str());

    let (_, profile) = app
        .send(Method::GET, "/drivers/profile", Some(&driver_token), None)
        .await;
    assert_eq!(profile["driver"]["status"], "busy");

    // A busy driver cannot go offline or delete the account.
    let (status, _) = app
        .send(
            Method::PUT,
            "/drivers/status",
            Some(&driver_token),
            Some(json!({ "status": "offline" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .send(Method::DELETE, "/drivers/account", Some(&driver_token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, completed) = app
        .send(
            Method::POST,
            "/drivers/complete-ride",
            Some(&driver_token),
            Some(json!({ "ride_id": ride_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "completed");
    assert!(completed["end_time"].is_string());

    let (status, body) = app
        .send(
            Method::POST,
            "/riders/cancel-ride",
            Some(&rider_token),
            Some(json!({ "ride_id": ride_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "bad_request");

    let (_, profile) = app
        .send(Method::GET, "/drivers/profile", Some(&driver_token), None)
        .await;
    assert_eq!(profile["driver"]["status"], "online");

    // The completed ride still names its driver, so the account stays.
    let (status, body) = app
        .send(Method::DELETE, "/drivers/account", Some(&driver_token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot delete account with ride history");
}

#[tokio::test]
async fn test_cancel_in_progress_ride_frees_driver() {
    let app = TestApp::new();
    let (_, rider_token) = app.rider("rita@example.com").await;
    let (_, driver_token) = app.driver("dan@example.com").await;
    let ride_id = app.request_ride(&rider_token).await;

    app.send(
        Method::POST,
        "/drivers/accept-ride",
        Some(&driver_token),
        Some(json!({ "ride_id": ride_id })),
    )
    .await;

    let (status, canceled) = app
        .send(
            Method::POST,
            "/riders/cancel-ride",
            Some(&rider_token),
            Some(json!({ "ride_id": ride_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(canceled["status"], "canceled");

    let (_, profile) = app
        .send(Method::GET, "/drivers/profile", Some(&driver_token), None)
        .await;
    assert_eq!(profile["driver"]["status"], "online");
}

#[tokio::test]
async fn test_cancel_other_riders_ride_is_forbidden() {
    let app = TestApp::new();
    let (_, owner_token) = app.rider("owner@example.com").await;
    let (_, other_token) = app.rider("other@example.com").await;
    let ride_id = app.request_ride(&owner_token).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/riders/cancel-ride",
            Some(&other_token),
            Some(json!({ "ride_id": ride_id })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error(&body, "forbidden");
}

#[tokio::test]
async fn test_unknown_ride_is_not_found() {
    let app = TestApp::new();
    let (_, rider_token) = app.rider("rita@example.com").await;
    let (_, driver_token) = app.driver("dan@example.com").await;
    let missing = uuid::Uuid::new_v4().to_string();

    let (status, body) = app
        .send(
            Method::POST,
            "/drivers/accept-ride",
            Some(&driver_token),
            Some(json!({ "ride_id": missing })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "not_found");

    let (status, _) = app
        .send(
            Method::POST,
            "/riders/cancel-ride",
            Some(&rider_token),
            Some(json!({ "ride_id": missing })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_second_accept_is_rejected() {
    let app = TestApp::new();
    let (_, rider_token) = app.rider("rita@example.com").await;
    let (first_id, first_token) = app.driver("first@example.com").await;
    let (_, second_token) = app.driver("second@example.com").await;
    let ride_id = app.request_ride(&rider_token).await;

    let (status, _) = app
        .send(
            Method::POST,
            "/drivers/accept-ride",
            Some(&first_token),
            Some(json!({ "ride_id": ride_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(
            Method::POST,
            "/drivers/accept-ride",
            Some(&second_token),
            Some(json!({ "ride_id": ride_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "bad_request");

    let (_, history) = app
        .send(Method::GET, "/riders/rides", Some(&rider_token), None)
        .await;
    assert_eq!(history[0]["driver_id"], first_id.as_str());
}

#[tokio::test]
async fn test_ride_history_newest_first() {
    let app = TestApp::new();
    let (_, rider_token) = app.rider("rita@example.com").await;

    let (status, history) = app
        .send(Method::GET, "/riders/rides", Some(&rider_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history, json!([]));

    let first = app.request_ride(&rider_token).await;
    let second = app.request_ride(&rider_token).await;

    let (_, history) = app
        .send(Method::GET, "/riders/rides", Some(&rider_token), None)
        .await;
    let ids: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![second.as_str(), first.as_str()]);
}

#[tokio::test]
async fn test_request_ride_without_drivers_when_required() {
    let app = TestApp::with_config(test_config(true));
    let (_, rider_token) = app.rider("rita@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/riders/request-ride",
            Some(&rider_token),
            Some(json!({ "pickup": "A", "dropoff": "B" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No drivers available");

    app.driver("dan@example.com").await;
    app.request_ride(&rider_token).await;
}

#[tokio::test]
async fn test_delete_driver_account() {
    let app = TestApp::new();
    let (_, token) = app.driver("dan@example.com").await;

    let (status, body) = app
        .send(Method::DELETE, "/drivers/account", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    // The token outlives the account.
    let (status, body) = app
        .send(Method::GET, "/drivers/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "not_found");
}
