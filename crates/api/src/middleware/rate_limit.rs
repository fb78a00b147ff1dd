//! Per-IP rate limiting with a sliding window.
//!
//! Each tier owns an independent [`RateLimiter`]. The general API tier wraps
//! every `/api` route; the auth and export tiers additionally wrap their own
//! route groups, so a login request counts against both the API and auth
//! budgets.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::client::client_ip;
use crate::config::RateLimitSettings;
use crate::error::AppError;

/// Run a full sweep of idle IPs every this many checks.
const CLEANUP_EVERY: u64 = 256;

/// Sliding-window limiter keyed by client IP.
///
/// At most `max_tracked_ips` addresses are remembered. When the map is full
/// an unseen address forces a sweep; if nothing expired it is rejected.
pub struct RateLimiter {
    name: &'static str,
    max_requests: usize,
    window: Duration,
    max_tracked_ips: usize,
    trusted_proxies: Vec<IpAddr>,
    hits: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
    checks: AtomicU64,
}

impl RateLimiter {
    pub fn new(name: &'static str, max_requests: u32, window: Duration, max_tracked_ips: usize) -> Self {
        Self {
            name,
            max_requests: max_requests as usize,
            window,
            max_tracked_ips,
            trusted_proxies: Vec::new(),
            hits: Mutex::new(HashMap::new()),
            checks: AtomicU64::new(0),
        }
    }

    /// Honour `X-Forwarded-For` from these peers.
    pub fn with_trusted_proxies(mut self, proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = proxies;
        self
    }

    /// Record a request from `ip`. Returns `false` if it exceeds the limit;
    /// rejected requests are not recorded.
    pub fn check(&self, ip: IpAddr) -> bool {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> bool {
        let cutoff = now.checked_sub(self.window);
        let expired = |q: &VecDeque<Instant>| !q.back().is_some_and(|t| Some(*t) > cutoff);
        let mut hits = self.hits.lock().unwrap_or_else(PoisonError::into_inner);

        if self.checks.fetch_add(1, Ordering::Relaxed) % CLEANUP_EVERY == CLEANUP_EVERY - 1 {
            hits.retain(|_, q| !expired(&*q));
        }

        if !hits.contains_key(&ip) && hits.len() >= self.max_tracked_ips {
            hits.retain(|_, q| !expired(&*q));
            if hits.len() >= self.max_tracked_ips {
                tracing::warn!(
                    ip = %ip,
                    tier = self.name,
                    tracked = hits.len(),
                    "Rate limiter full, rejecting new IP"
                );
                return false;
            }
        }

        let queue = hits.entry(ip).or_default();
        while queue.front().is_some_and(|t| Some(*t) <= cutoff) {
            queue.pop_front();
        }

        if queue.len() >= self.max_requests {
            tracing::warn!(ip = %ip, tier = self.name, max = self.max_requests, "Rate limit exceeded");
            return false;
        }
        queue.push_back(now);
        true
    }

    /// Number of IPs currently tracked.
    pub fn tracked_ips(&self) -> usize {
        self.hits.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// The three limiter tiers.
#[derive(Clone)]
pub struct RateLimits {
    pub api: Arc<RateLimiter>,
    pub auth: Arc<RateLimiter>,
    pub export: Arc<RateLimiter>,
}

impl RateLimits {
    pub fn from_settings(settings: &RateLimitSettings, trusted_proxies: &[IpAddr]) -> Self {
        let tier = |name, max| {
            Arc::new(
                RateLimiter::new(name, max, settings.window, settings.max_tracked_ips)
                    .with_trusted_proxies(trusted_proxies.to_vec()),
            )
        };
        Self {
            api: tier("api", settings.api_max),
            auth: tier("auth", settings.auth_max),
            export: tier("export", settings.export_max),
        }
    }
}

/// Middleware function; mount with `axum::middleware::from_fn_with_state`.
pub async fn enforce_rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(request.headers(), request.extensions(), &limiter.trusted_proxies);
    if !limiter.check(ip) {
        return Err(AppError::RateLimited);
    }
    Ok(next.run(request).await)
}
