//! Request-level middleware and extractors.
//!
//! - [`auth`] -- bearer token resolution to an active user.
//! - [`rbac`] -- role gates layered on top of [`auth::AuthUser`].
//! - [`client`] -- caller IP / user agent extraction.
//! - [`rate_limit`] -- per-IP sliding window limits.

pub mod auth;
pub mod client;
pub mod rate_limit;
pub mod rbac;
