//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`token`] -- session token issuance, verification, and hashing.

pub mod password;
pub mod token;
