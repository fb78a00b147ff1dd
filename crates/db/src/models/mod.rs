//! Row models and DTOs, one module per table.
//!
//! Row structs derive `FromRow`; those safe to expose also derive
//! `Serialize`. Create/update DTOs carry only the writable columns.

pub mod ai_model;
pub mod audit;
pub mod config_entry;
pub mod metric;
pub mod session;
pub mod user;
