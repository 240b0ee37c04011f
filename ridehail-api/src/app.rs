/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use ridehail_api::{app::AppState, config::Config};
/// use ridehail_shared::{db::pool::{create_pool, DatabaseConfig}, repository::Repositories};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
/// let state = AppState::new(Repositories::postgres(pool), config);
/// let app = ridehail_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use ridehail_shared::{
    auth::{
        authorization::{require_audience, Audience},
        jwt::TokenIssuer,
        middleware::{authenticate, AuthContext},
    },
    repository::Repositories,
    services::{AccountService, DriverService, FareEstimator, RideWorkflow},
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is reference-counted, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub drivers: Arc<DriverService>,
    pub rides: Arc<RideWorkflow>,

    /// Signs and verifies bearer tokens
    pub tokens: Arc<TokenIssuer>,

    /// Repository handles, used directly by the health check
    pub repos: Repositories,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires services over `repos` with the placeholder fare estimator
    pub fn new(repos: Repositories, config: Config) -> Self {
        let fares = FareEstimator::placeholder(config.fare_config());
        Self::with_fares(repos, config, fares)
    }

    /// Same as [`AppState::new`] with a caller-supplied fare estimator
    pub fn with_fares(repos: Repositories, config: Config, fares: FareEstimator) -> Self {
        let tokens = Arc::new(TokenIssuer::new(&config.jwt.secret, config.token_ttl()));

        Self {
            accounts: Arc::new(AccountService::new(repos.accounts.clone(), tokens.clone())),
            drivers: Arc::new(DriverService::new(repos.drivers.clone(), tokens.clone())),
            rides: Arc::new(RideWorkflow::new(&repos, fares, config.ride_settings())),
            tokens,
            repos,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                 # Health check (public)
/// ├── /auth/                       # Rider accounts (public)
/// │   ├── POST /register
/// │   └── POST /login
/// ├── /drivers/
/// │   ├── POST   /register         # public
/// │   ├── POST   /login            # public
/// │   ├── GET    /profile          # driver token
/// │   ├── PUT    /profile
/// │   ├── PUT    /status
/// │   ├── DELETE /account
/// │   ├── POST   /accept-ride
/// │   └── POST   /complete-ride
/// └── /riders/                     # rider or admin token
///     ├── POST /request-ride
///     ├── GET  /rides
///     └── POST /cancel-ride
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. CORS (tower-http CorsLayer)
/// 2. Logging (tower-http TraceLayer)
/// 3. Authentication, then audience check (protected route groups only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let driver_public = Router::new()
        .route("/register", post(routes::drivers::register))
        .route("/login", post(routes::drivers::login));

    let driver_private = Router::new()
        .route(
            "/profile",
            get(routes::drivers::get_profile).put(routes::drivers::update_profile),
        )
        .route("/status", put(routes::drivers::update_status))
        .route("/account", delete(routes::drivers::delete_account))
        .route("/accept-ride", post(routes::drivers::accept_ride))
        .route("/complete-ride", post(routes::drivers::complete_ride))
        .route_layer(from_fn(require_driver))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let rider_routes = Router::new()
        .route("/request-ride", post(routes::riders::request_ride))
        .route("/rides", get(routes::riders::ride_history))
        .route("/cancel-ride", post(routes::riders::cancel_ride))
        .route_layer(from_fn(require_rider))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_routes)
        .nest("/drivers", driver_public.merge(driver_private))
        .nest("/riders", rider_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer token and injects [`AuthContext`] into the request
/// extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), &state.tokens)?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

async fn require_driver(req: Request, next: Next) -> Result<Response, ApiError> {
    require_audience_layer(Audience::Driver, req, next).await
}

async fn require_rider(req: Request, next: Next) -> Result<Response, ApiError> {
    require_audience_layer(Audience::Rider, req, next).await
}

/// Rejects callers whose role may not use the route group
async fn require_audience_layer(
    audience: Audience,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let role = req
        .extensions()
        .get::<AuthContext>()
        .map(|ctx| ctx.role)
        .ok_or_else(|| ApiError::Unauthorized("Missing credentials".to_string()))?;

    if let Err(err) = require_audience(role, audience) {
        tracing::warn!(
            role = role.as_str(),
            audience = audience.as_str(),
            path = %req.uri().path(),
            "Request rejected by role check"
        );
        return Err(err.into());
    }

    Ok(next.run(req).await)
}
