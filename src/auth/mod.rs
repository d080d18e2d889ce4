pub mod password;
pub mod service;
pub mod token;

pub use service::AuthService;
pub use token::TokenIssuer;

use crate::db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Bad username or password")]
    BadCredentials,
    #[error("Missing or invalid token")]
    BadToken,
    #[error("Database error: {0}")]
    Db(#[from] DbError),
    #[error("Password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("Token encoding error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

pub type AuthResult<T> = Result<T, AuthError>;
