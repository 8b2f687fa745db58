//! JWT token management
//!
//! Issues and validates the signed, stateless tokens handed out at login.
//! A token carries the user id as its subject and expires after the
//! configured lifetime; nothing is persisted server-side.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::JwtConfig;
use crate::user::error::UserError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// User id, as a decimal string
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    pub fn new(user_id: i32, lifetime: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn user_id(&self) -> Result<i32, UserError> {
        self.sub
            .parse()
            .map_err(|_| UserError::Token(format!("Invalid subject '{}'", self.sub)))
    }
}

// Custom Debug implementation to hide sensitive keys
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("encoding_key", &"<hidden>")
            .field("decoding_key", &"<hidden>")
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

impl JwtService {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(&config.secret, Duration::hours(config.expiration_hours))
    }

    /// Issue a token for the given user
    pub fn issue(&self, user_id: i32) -> Result<String, UserError> {
        self.encode_claims(&Claims::new(user_id, self.lifetime))
    }

    pub fn encode_claims(&self, claims: &Claims) -> Result<String, UserError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| UserError::Token(format!("Failed to generate token: {}", e)))
    }

    /// Check signature and expiry, returning the claims
    pub fn validate(&self, token: &str) -> Result<Claims, UserError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| UserError::Token(format!("Invalid token: {}", e)))
    }
}
