use serde::{Deserialize, Serialize};

use crate::db::Movie;

// Required fields are Options so a missing field answers 400 with a message
// instead of a bare deserialization rejection.

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoggedInAs {
    pub logged_in_as: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub movie_id: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendedMovie {
    pub movie_id: i64,
    pub title: String,
    pub recommendation_count: i64,
    pub description: Option<String>,
}

impl From<Movie> for RecommendedMovie {
    fn from(movie: Movie) -> Self {
        Self {
            movie_id: movie.movie_id,
            title: movie.title,
            recommendation_count: movie.recommendation_count,
            description: movie.description,
        }
    }
}
