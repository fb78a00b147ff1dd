//! Session token issuance and verification.
//!
//! Tokens are HS256-signed JWTs carrying a [`Claims`] payload. Only the
//! SHA-256 hash of a token is ever persisted; the session store is keyed by
//! that hash so a database leak does not expose live bearer tokens.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use pulseboard_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Default token lifetime in hours.
const DEFAULT_LIFETIME_HOURS: i64 = 24;

/// JWT claims embedded in every session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// Informational only; authorization always reloads the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Unique token identifier, so back-to-back logins get distinct tokens.
    pub jti: String,
}

/// Configuration for token signing.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Token lifetime in hours. Tokens are never renewed.
    pub lifetime_hours: i64,
}

impl TokenConfig {
    /// Load token configuration from environment variables.
    ///
    /// | Env Var                | Required | Default |
    /// |------------------------|----------|---------|
    /// | `JWT_SECRET`           | **yes**  | --      |
    /// | `TOKEN_LIFETIME_HOURS` | no       | `24`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let lifetime_hours: i64 = std::env::var("TOKEN_LIFETIME_HOURS")
            .unwrap_or_else(|_| DEFAULT_LIFETIME_HOURS.to_string())
            .parse()
            .expect("TOKEN_LIFETIME_HOURS must be a valid i64");
        assert!(lifetime_hours > 0, "TOKEN_LIFETIME_HOURS must be > 0");

        Self {
            secret,
            lifetime_hours,
        }
    }
}

/// A freshly issued token together with what the session store needs.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_hash: String,
    pub expires_at: Timestamp,
}

/// The trusted contents of a token that passed verification.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    pub user_id: DbId,
    pub email: Option<String>,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub jti: String,
}

/// Issues and verifies session tokens with a fixed secret and lifetime.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::default(); // HS256, validates exp
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            lifetime: Duration::hours(config.lifetime_hours),
        }
    }

    /// Sign a new token for `user_id`, valid from now for the configured lifetime.
    pub fn issue(
        &self,
        user_id: DbId,
        email: Option<&str>,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        self.issue_at(user_id, email, Utc::now())
    }

    fn issue_at(
        &self,
        user_id: DbId,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let expires_at = now + self.lifetime;
        let claims = Claims {
            sub: user_id,
            email: email.map(str::to_string),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(IssuedToken {
            token_hash: hash_token(&token),
            token,
            expires_at,
        })
    }

    /// Check signature and expiry. Any failure yields `None`.
    pub fn verify(&self, token: &str) -> Option<VerifiedToken> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).ok()?;
        let claims = data.claims;
        Some(VerifiedToken {
            user_id: claims.sub,
            email: claims.email,
            issued_at: Utc.timestamp_opt(claims.iat, 0).single()?,
            expires_at: Utc.timestamp_opt(claims.exp, 0).single()?,
            jti: claims.jti,
        })
    }
}

/// SHA-256 hex digest of a token, used as the session store key.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
