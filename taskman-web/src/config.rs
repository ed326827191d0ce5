/// Configuration management for the web server
///
/// Configuration comes from environment variables; a `.env` file in the
/// working directory is loaded first when present.
///
/// # Environment Variables
///
/// - `APP_HOST`: Host to bind to (default: 0.0.0.0)
/// - `APP_PORT`: Port to bind to (default: 5000)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `SESSION_SECRET`: Key for session tokens and flash signatures (required, 32+ chars)
/// - `SESSION_TTL_HOURS`: Session lifetime, 1 to 8760 (default: 24)
/// - `SECURE_COOKIES`: Mark cookies `Secure` and send HSTS (default: false)
/// - `RUST_LOG`, `LOG_FORMAT`: read by the binary when setting up tracing
///
/// # Example
///
/// ```no_run
/// use taskman_web::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;

/// Shortest accepted `SESSION_SECRET`
pub const MIN_SECRET_LENGTH: usize = 32;

/// Longest accepted `SESSION_TTL_HOURS`: one year
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    pub max_connections: u32,
}

/// Session cookie settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Signs session tokens and flash cookies
    ///
    /// Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,

    pub ttl_hours: i64,

    /// Adds the `Secure` cookie attribute and the HSTS header
    pub secure_cookies: bool,
}

impl SessionConfig {
    /// Session lifetime, clamped to `1..=MAX_SESSION_TTL_HOURS` hours
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS))
    }
}

/// Parses `SESSION_TTL_HOURS`
fn parse_ttl_hours(raw: &str) -> anyhow::Result<i64> {
    let hours = raw
        .trim()
        .parse::<i64>()
        .context("SESSION_TTL_HOURS must be an integer")?;
    if !(1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
        anyhow::bail!("SESSION_TTL_HOURS must be between 1 and {MAX_SESSION_TTL_HOURS}");
    }
    chrono::TimeDelta::try_hours(hours)
        .context("SESSION_TTL_HOURS is out of range")?;
    Ok(hours)
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Fails when `DATABASE_URL` or `SESSION_SECRET` is missing, when the
    /// secret is too short, when a numeric variable does not parse, or when
    /// `SESSION_TTL_HOURS` is outside `1..=MAX_SESSION_TTL_HOURS`.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let port = var_or("APP_PORT", "5000")
            .parse::<u16>()
            .context("APP_PORT must be a port number")?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = var_or("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;

        let secret = env::var("SESSION_SECRET")
            .map_err(|_| anyhow::anyhow!("SESSION_SECRET environment variable is required"))?;
        if secret.len() < MIN_SECRET_LENGTH {
            anyhow::bail!("SESSION_SECRET must be at least {MIN_SECRET_LENGTH} characters long");
        }

        let ttl_hours = parse_ttl_hours(&var_or("SESSION_TTL_HOURS", "24"))?;

        let secure_cookies = var_or("SECURE_COOKIES", "false")
            .parse::<bool>()
            .context("SECURE_COOKIES must be true or false")?;

        Ok(Self {
            server: ServerConfig {
                host: var_or("APP_HOST", "0.0.0.0"),
                port,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            session: SessionConfig {
                secret,
                ttl_hours,
                secure_cookies,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
