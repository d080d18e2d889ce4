use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::auth::AuthError;
use crate::catalog::CatalogError;
use crate::db::DbError;
use crate::ledger::LedgerError;

/// Everything a handler can fail with, and the single place where failures
/// turn into HTTP responses. Storage and hashing failures never leak their
/// details to the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Bad username or password")]
    BadCredentials,
    #[error("Missing or invalid token")]
    BadToken,
    #[error("No movies found")]
    NoMovies,
    /// The catalog rejected or failed a fetch needed to record a
    /// recommendation. The client sent an id we cannot vouch for, so this
    /// answers 400.
    #[error("Could not fetch movie from the catalog")]
    CatalogRejected(#[source] CatalogError),
    /// The catalog was unreachable while serving a plain search, which is
    /// the upstream's fault, not the client's.
    #[error("Movie catalog unavailable")]
    CatalogUnavailable(#[source] CatalogError),
    #[error("An error occurred")]
    Database(#[source] DbError),
    #[error("An error occurred")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::UsernameTaken | ApiError::CatalogRejected(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::BadCredentials | ApiError::BadToken => StatusCode::UNAUTHORIZED,
            ApiError::NoMovies => StatusCode::NOT_FOUND,
            ApiError::CatalogUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {:?}", self);
        }
        let message = self.to_string();
        // Credential and token failures use the `msg` key, everything else
        // uses `message`. Clients match on these literals.
        let body = match self {
            ApiError::BadCredentials | ApiError::BadToken => {
                serde_json::json!({ "msg": message })
            }
            _ => serde_json::json!({ "message": message }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::AlreadyExists(_) => ApiError::UsernameTaken,
            other => ApiError::Database(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::BadCredentials => ApiError::BadCredentials,
            AuthError::BadToken => ApiError::BadToken,
            AuthError::Db(db) => ApiError::from(db),
            AuthError::Hash(e) => ApiError::Internal(e.to_string()),
            AuthError::Token(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Catalog(catalog) => ApiError::CatalogRejected(catalog),
            LedgerError::Db(db) => ApiError::from(db),
        }
    }
}
