//! Domain primitives shared by the database and API layers.
//!
//! This crate has no internal dependencies and no I/O: types, error
//! taxonomy, role rules, the synthetic metric catalog, and the export
//! formatting primitives.

pub mod ai_models;
pub mod audit;
pub mod error;
pub mod export;
pub mod metrics;
pub mod roles;
pub mod types;
pub mod validation;
