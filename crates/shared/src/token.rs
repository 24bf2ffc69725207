//! JWT access token utilities.
//!
//! Tokens are signed with RS256 so the verifying side only ever needs the
//! public key. Sessions are stateless: there is no refresh token and logout
//! is a client-side discard.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to encode token: {0}")]
    Encoding(String),

    #[error("token has expired")]
    Expired,

    #[error("invalid token")]
    Invalid,

    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id, as a decimal string.
    pub sub: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Unique token identifier.
    pub jti: String,
}

impl Claims {
    /// Parses the subject claim back into a user id.
    pub fn user_id(&self) -> Result<i64, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Invalid)
    }
}

/// Signs and validates access tokens for authenticated sessions.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    /// Access token lifetime in seconds.
    pub expiry_secs: i64,
    /// Clock-skew tolerance in seconds applied during validation.
    pub leeway_secs: u64,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("expiry_secs", &self.expiry_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

impl TokenSigner {
    /// Creates a signer from an RSA key pair in PEM format.
    pub fn new(
        private_key_pem: &str,
        public_key_pem: &str,
        expiry_secs: i64,
        leeway_secs: u64,
    ) -> Result<Self, TokenError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| TokenError::InvalidKey(format!("invalid private key: {}", e)))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| TokenError::InvalidKey(format!("invalid public key: {}", e)))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            algorithm: Algorithm::RS256,
            expiry_secs,
            leeway_secs,
        })
    }

    /// Creates a signer with an HS256 symmetric secret. Tests only.
    pub fn new_for_testing(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: Algorithm::HS256,
            expiry_secs: 3600,
            leeway_secs: 0,
        }
    }

    /// Issues an access token for the given user. Returns `(token, jti)`.
    pub fn issue(&self, user_id: i64) -> Result<(String, String), TokenError> {
        let now = Utc::now();
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + Duration::seconds(self.expiry_secs)).timestamp(),
            iat: now.timestamp(),
            jti: jti.clone(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok((token, jti))
    }

    /// Validates a token and returns its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}
