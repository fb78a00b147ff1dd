//! Data access for every table. Each repository is a zero-sized struct
//! whose async methods take `&PgPool` and run a single statement.

pub mod ai_model_repo;
pub mod audit_repo;
pub mod config_repo;
pub mod metric_repo;
pub mod session_repo;
pub mod user_repo;

pub use ai_model_repo::AiModelRepo;
pub use audit_repo::AuditLogRepo;
pub use config_repo::ConfigRepo;
pub use metric_repo::MetricRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
