use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{AuthError, AuthResult};

/// Claims carried by a session token. `sub` is the user id, never the
/// username, so renames don't invalidate sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_minutes: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_minutes,
        }
    }

    pub fn issue(&self, user_id: &str) -> AuthResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::minutes(self.ttl_minutes)).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Returns the user id the token was issued for. Expired, tampered and
    /// otherwise undecodable tokens all fail the same way.
    pub fn verify(&self, token: &str) -> AuthResult<String> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|_| AuthError::BadToken)?;
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let issuer = TokenIssuer::new("sekrit", 15);
        let token = issuer.issue("user-123").unwrap();
        assert_eq!(issuer.verify(&token).unwrap(), "user-123");
    }

    #[test]
    fn test_token_is_bound_to_user() {
        let issuer = TokenIssuer::new("sekrit", 15);
        let token_a = issuer.issue("user-a").unwrap();
        let token_b = issuer.issue("user-b").unwrap();
        assert_ne!(token_a, token_b);
        assert_eq!(issuer.verify(&token_a).unwrap(), "user-a");
        assert_eq!(issuer.verify(&token_b).unwrap(), "user-b");
    }

    #[test]
    fn test_expired_token_rejected() {
        // Negative TTL puts exp well past the default leeway.
        let issuer = TokenIssuer::new("sekrit", -120);
        let token = issuer.issue("user-123").unwrap();
        assert!(matches!(issuer.verify(&token), Err(AuthError::BadToken)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenIssuer::new("sekrit", 15);
        let other = TokenIssuer::new("different", 15);
        let token = issuer.issue("user-123").unwrap();
        assert!(matches!(other.verify(&token), Err(AuthError::BadToken)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let issuer = TokenIssuer::new("sekrit", 15);
        assert!(matches!(issuer.verify("not.a.jwt"), Err(AuthError::BadToken)));
    }
}
