pub mod admin;
pub mod ai_models;
pub mod audit;
pub mod auth;
pub mod config;
pub mod export;
pub mod metrics;
