//! JWT token generation and validation

use crate::core::error::{AuthFailure, Result, ShopError};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Token lifetime in seconds (one day)
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens with a single server secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenService {
    /// Create a token service signing with `secret`
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, TOKEN_TTL_SECS)
    }

    /// Create a token service with a custom lifetime
    pub fn with_ttl(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Validation::new(Algorithm::HS256),
            ttl_secs,
        }
    }

    /// Issue a token whose subject is `user_id`
    pub fn issue(&self, user_id: &str) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        self.encode(&claims)
    }

    /// Sign arbitrary claims
    pub fn encode(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| ShopError::TokenError(format!("Failed to generate token: {}", e)))
    }

    /// Verify a token and return its claims
    ///
    /// Bad signature, expiry, and malformed input all collapse into
    /// `AuthFailure::InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                ShopError::Authentication(AuthFailure::InvalidToken)
            })?;

        if token_data.claims.sub.is_empty() {
            return Err(ShopError::Authentication(AuthFailure::InvalidToken));
        }

        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(result: Result<Claims>) {
        match result {
            Err(ShopError::Authentication(AuthFailure::InvalidToken)) => {}
            other => panic!("expected invalid token, got {:?}", other),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = TokenService::new("test-secret");
        let token = tokens.issue("user-1").unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenService::new("secret-a").issue("user-1").unwrap();
        assert_invalid(TokenService::new("secret-b").verify(&token));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = TokenService::new("test-secret");
        let now = chrono::Utc::now().timestamp();
        let token = tokens
            .encode(&Claims {
                sub: "user-1".to_string(),
                iat: now - 3 * TOKEN_TTL_SECS,
                exp: now - 2 * TOKEN_TTL_SECS,
            })
            .unwrap();

        assert_invalid(tokens.verify(&token));
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = TokenService::new("test-secret");
        assert_invalid(tokens.verify("not.a.token"));
        assert_invalid(tokens.verify(""));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let tokens = TokenService::new("test-secret");
        let token = tokens.issue("user-1").unwrap();
        let forged = TokenService::new("other").issue("user-2").unwrap();

        // Header and claims of one token with the signature of another
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_sig = forged.rsplit('.').next().unwrap();
        parts[2] = forged_sig;
        assert_invalid(tokens.verify(&parts.join(".")));
    }
}
