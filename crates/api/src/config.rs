use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::token::TokenConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the database URL and JWT secret have defaults suitable
/// for local development. Misconfiguration panics at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Session token signing and lifetime.
    pub jwt: TokenConfig,
    /// Periodic real-time metrics broadcast.
    pub broadcast: BroadcastConfig,
    /// Synthetic metric generator.
    pub generator: GeneratorConfig,
    /// How often expired sessions are swept (default: `900`).
    pub session_sweep_interval_secs: u64,
    /// Per-IP rate limit tiers.
    pub rate_limit: RateLimitSettings,
    /// Reverse proxies whose `X-Forwarded-For` header is believed. Empty by
    /// default, so the socket peer is always the client.
    pub trusted_proxies: Vec<IpAddr>,
}

#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    pub interval: Duration,
    /// Number of latest metric rows pushed per tick.
    pub batch: i64,
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub enabled: bool,
    pub base: Duration,
    pub jitter: Duration,
}

/// Rolling window shared by all tiers, plus the per-tier request caps.
#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub window: Duration,
    pub api_max: u32,
    pub auth_max: u32,
    pub export_max: u32,
    /// Hard cap on distinct IPs each tier remembers.
    pub max_tracked_ips: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                           | Default                 |
    /// |-----------------------------------|-------------------------|
    /// | `HOST`                            | `0.0.0.0`               |
    /// | `PORT`                            | `3000`                  |
    /// | `CORS_ORIGINS`                    | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`            | `30`                    |
    /// | `METRICS_BROADCAST_INTERVAL_SECS` | `5`                     |
    /// | `METRICS_BROADCAST_BATCH`         | `10`                    |
    /// | `METRICS_GENERATOR_ENABLED`       | `true`                  |
    /// | `METRICS_GENERATOR_BASE_MS`       | `4000`                  |
    /// | `METRICS_GENERATOR_JITTER_MS`     | `1000`                  |
    /// | `SESSION_SWEEP_INTERVAL_SECS`     | `900`                   |
    /// | `RATE_LIMIT_WINDOW_SECS`          | `900`                   |
    /// | `RATE_LIMIT_API_MAX`              | `1000`                  |
    /// | `RATE_LIMIT_AUTH_MAX`             | `20`                    |
    /// | `RATE_LIMIT_EXPORT_MAX`           | `10`                    |
    /// | `RATE_LIMIT_MAX_TRACKED_IPS`      | `10000`                 |
    /// | `TRUSTED_PROXIES`                 | (none)                  |
    ///
    /// JWT settings are read by [`TokenConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 30);

        let broadcast = BroadcastConfig {
            interval: Duration::from_secs(env_or("METRICS_BROADCAST_INTERVAL_SECS", 5)),
            batch: env_or("METRICS_BROADCAST_BATCH", 10),
        };
        assert!(!broadcast.interval.is_zero(), "METRICS_BROADCAST_INTERVAL_SECS must be > 0");

        let generator = GeneratorConfig {
            enabled: env_or("METRICS_GENERATOR_ENABLED", true),
            base: Duration::from_millis(env_or("METRICS_GENERATOR_BASE_MS", 4000)),
            jitter: Duration::from_millis(env_or("METRICS_GENERATOR_JITTER_MS", 1000)),
        };

        let session_sweep_interval_secs: u64 = env_or("SESSION_SWEEP_INTERVAL_SECS", 900);
        assert!(session_sweep_interval_secs > 0, "SESSION_SWEEP_INTERVAL_SECS must be > 0");

        let rate_limit = RateLimitSettings {
            window: Duration::from_secs(env_or("RATE_LIMIT_WINDOW_SECS", 900)),
            api_max: env_or("RATE_LIMIT_API_MAX", 1000),
            auth_max: env_or("RATE_LIMIT_AUTH_MAX", 20),
            export_max: env_or("RATE_LIMIT_EXPORT_MAX", 10),
            max_tracked_ips: env_or("RATE_LIMIT_MAX_TRACKED_IPS", 10_000),
        };
        assert!(rate_limit.max_tracked_ips > 0, "RATE_LIMIT_MAX_TRACKED_IPS must be > 0");

        let trusted_proxies: Vec<IpAddr> = std::env::var("TRUSTED_PROXIES")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse()
                    .unwrap_or_else(|e| panic!("TRUSTED_PROXIES entry {s:?} is not an IP: {e}"))
            })
            .collect();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: TokenConfig::from_env(),
            broadcast,
            generator,
            session_sweep_interval_secs,
            rate_limit,
            trusted_proxies,
        }
    }
}

/// Parse an env var, falling back to `default` when unset.
///
/// # Panics
///
/// Panics if the variable is set but does not parse.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} is not valid: {e}")),
        Err(_) => default,
    }
}
