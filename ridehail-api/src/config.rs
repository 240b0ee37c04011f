/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `DATABASE_URL`: PostgreSQL connection string. When unset, the URL is
///   assembled from `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER`, `DB_PASSWORD`
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for JWT signing (required, at least 32 chars)
/// - `JWT_TTL_MINUTES`: Access token lifetime (default: 1440)
/// - `FARE_BASE`: Flat part of every fare (default: 2.50)
/// - `FARE_PER_KM`: Per-kilometre rate (default: 1.25)
/// - `RIDE_REQUIRE_AVAILABLE_DRIVER`: Reject ride requests while no driver is
///   online (default: false)
/// - `RUST_LOG`, `LOG_FORMAT`: read by `main` for logging
///
/// # Example
///
/// ```no_run
/// use ridehail_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use ridehail_shared::services::{FareConfig, RideSettings};
use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Fare and ride request settings
    pub rides: RideConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Access token lifetime in minutes
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideConfig {
    pub base_fare: f64,
    pub per_km_rate: f64,
    pub require_available_driver: bool,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api_host = var_or("API_HOST", "0.0.0.0");
        let api_port = var_or("API_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is invalid: {}", e))?;

        let cors_origins: Vec<String> = var_or("CORS_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => {
                let host = lookup("DB_HOST").ok_or_else(|| {
                    anyhow::anyhow!("DATABASE_URL or DB_HOST environment variable is required")
                })?;
                let port = var_or("DB_PORT", "5432");
                let name = var_or("DB_NAME", "ridehail");
                let user = var_or("DB_USER", "ridehail");
                let password = lookup("DB_PASSWORD").unwrap_or_default();
                format!("postgresql://{}:{}@{}:{}/{}", user, password, host, port, name)
            }
        };

        let max_connections = var_or("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))?;

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let ttl_minutes = var_or("JWT_TTL_MINUTES", "1440")
            .parse::<i64>()
            .map_err(|e| anyhow::anyhow!("JWT_TTL_MINUTES is invalid: {}", e))?;
        if ttl_minutes <= 0 {
            anyhow::bail!("JWT_TTL_MINUTES must be positive");
        }

        let base_fare = var_or("FARE_BASE", "2.50")
            .parse::<f64>()
            .map_err(|e| anyhow::anyhow!("FARE_BASE is invalid: {}", e))?;
        let per_km_rate = var_or("FARE_PER_KM", "1.25")
            .parse::<f64>()
            .map_err(|e| anyhow::anyhow!("FARE_PER_KM is invalid: {}", e))?;
        if base_fare <= 0.0 || per_km_rate < 0.0 {
            anyhow::bail!("FARE_BASE must be positive and FARE_PER_KM non-negative");
        }

        let require_available_driver = var_or("RIDE_REQUIRE_AVAILABLE_DRIVER", "false")
            .parse::<bool>()
            .map_err(|e| anyhow::anyhow!("RIDE_REQUIRE_AVAILABLE_DRIVER is invalid: {}", e))?;

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                ttl_minutes,
            },
            rides: RideConfig {
                base_fare,
                per_km_rate,
                require_available_driver,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn fare_config(&self) -> FareConfig {
        FareConfig {
            base_fare: self.rides.base_fare,
            per_km_rate: self.rides.per_km_rate,
        }
    }

    pub fn ride_settings(&self) -> RideSettings {
        RideSettings {
            require_available_driver: self.rides.require_available_driver,
        }
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.jwt.ttl_minutes)
    }
}
