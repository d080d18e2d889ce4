use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::db::{SqliteRepository, User, UserRepo};

use super::password::{hash_password, verify_password};
use super::token::TokenIssuer;
use super::{AuthError, AuthResult};

pub struct AuthService {
    db: Arc<SqliteRepository>,
    tokens: TokenIssuer,
    // Verified when the username is unknown, so both login failure paths
    // cost one bcrypt check and return the same error.
    dummy_hash: String,
}

impl AuthService {
    pub fn new(db: Arc<SqliteRepository>, config: &AuthConfig) -> AuthResult<Self> {
        let dummy_hash = hash_password("")?;
        Ok(Self {
            db,
            tokens: TokenIssuer::new(&config.secret, config.token_ttl_minutes),
            dummy_hash,
        })
    }

    /// Create a user with a freshly hashed password. The plaintext is not
    /// stored anywhere. A taken username surfaces as
    /// `AuthError::Db(DbError::AlreadyExists)`.
    pub async fn register(&self, username: &str, password: &str) -> AuthResult<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: hash_password(password)?,
            created: Some(Utc::now().to_rfc3339()),
        };
        self.db.create_user(&user).await?;
        info!("Registered user {}", user.username);
        Ok(user)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> AuthResult<User> {
        match self.db.get_user(username).await? {
            Some(user) if verify_password(password, &user.password_hash) => Ok(user),
            Some(_) => Err(AuthError::BadCredentials),
            None => {
                let _ = verify_password(password, &self.dummy_hash);
                Err(AuthError::BadCredentials)
            }
        }
    }

    pub fn issue_token(&self, user_id: &str) -> AuthResult<String> {
        self.tokens.issue(user_id)
    }

    pub fn verify_token(&self, token: &str) -> AuthResult<String> {
        self.tokens.verify(token)
    }

    pub async fn find_user(&self, user_id: &str) -> AuthResult<Option<User>> {
        Ok(self.db.get_user_by_id(user_id).await?)
    }
}
