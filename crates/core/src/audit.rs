//! Audit action and resource tags.
//!
//! Audit entries are free-form `(action, resource)` string pairs; the
//! constants here are the tags the server itself writes.

/// Actions recorded by request handlers and the real-time channel.
pub mod actions {
    pub const LOGIN: &str = "LOGIN";
    pub const LOGOUT: &str = "LOGOUT";
    pub const USER_REGISTERED: &str = "USER_REGISTERED";
    pub const USER_UPDATED: &str = "USER_UPDATED";
    pub const WEBSOCKET_AUTH: &str = "WEBSOCKET_AUTH";
    pub const CONFIG_UPDATED: &str = "CONFIG_UPDATED";
    pub const AI_MODEL_CREATED: &str = "AI_MODEL_CREATED";
    pub const AI_MODEL_UPDATED: &str = "AI_MODEL_UPDATED";
    pub const AI_MODEL_DELETED: &str = "AI_MODEL_DELETED";
    pub const DATA_EXPORTED: &str = "DATA_EXPORTED";
    pub const UNAUTHORIZED_ACCESS_ATTEMPT: &str = "UNAUTHORIZED_ACCESS_ATTEMPT";
}

/// Resources referenced by the actions above.
pub mod resources {
    pub const AUTH: &str = "AUTH";
    pub const USER: &str = "USER";
    pub const REALTIME_CONNECTION: &str = "REALTIME_CONNECTION";
    pub const CONFIG: &str = "CONFIG";
    pub const AI_MODEL: &str = "AI_MODEL";
    pub const EXPORT: &str = "EXPORT";
}

/// Catalog of actions used for synthetic system audit entries.
pub const SYSTEM_ACTIONS: &[&str] = &[
    "SYSTEM_SCAN_COMPLETED",
    "SECURITY_CHECK_PASSED",
    "UNAUTHORIZED_ACCESS_BLOCKED",
    "DATA_BACKUP_COMPLETED",
    "AI_MODEL_UPDATED",
    "SYSTEM_MAINTENANCE_SCHEDULED",
];

/// Catalog of resources used for synthetic system audit entries.
pub const SYSTEM_RESOURCES: &[&str] = &[
    "CORE_SYSTEM",
    "SECURITY_SCANNER",
    "DATABASE_CLUSTER",
    "API_GATEWAY",
    "MODEL_REGISTRY",
];
