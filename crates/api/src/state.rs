use std::sync::Arc;

use crate::auth::token::TokenService;
use crate::config::ServerConfig;
use crate::middleware::rate_limit::RateLimits;
use crate::ws::RealtimeHub;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: pulseboard_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Real-time connection registry and fan-out.
    pub hub: Arc<RealtimeHub>,
    /// Session token signing and verification.
    pub tokens: Arc<TokenService>,
    /// Per-IP rate limiters, one per tier.
    pub rate_limits: RateLimits,
}

impl AppState {
    pub fn new(pool: pulseboard_db::DbPool, config: ServerConfig) -> Self {
        Self {
            pool,
            tokens: Arc::new(TokenService::new(&config.jwt)),
            rate_limits: RateLimits::from_settings(&config.rate_limit, &config.trusted_proxies),
            hub: Arc::new(RealtimeHub::new()),
            config: Arc::new(config),
        }
    }
}
