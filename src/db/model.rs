use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created: Option<String>,
}

/// A movie as cached from the catalog, plus its running recommendation count.
///
/// `recommendation_count` always equals the number of rows in
/// `recommendations` for this `movie_id`; both are only ever touched inside
/// the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub movie_id: i64,
    pub title: String,
    pub release_date: Option<String>,
    pub description: Option<String>,
    pub recommendation_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recommendation {
    pub id: i64,
    pub user_id: String,
    pub movie_id: i64,
    pub comment: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

pub type DbResult<T> = Result<T, DbError>;
