//! Pulseboard API server library.
//!
//! Exposes the core building blocks (config, state, error handling, routes,
//! real-time hub, background jobs) so integration tests and the binary
//! entrypoint can both access them.

pub mod audit_trail;
pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod export;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
