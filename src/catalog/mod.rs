pub mod tmdb;
pub mod types;

pub use tmdb::TmdbClient;
pub use types::{MovieDetails, SearchHit};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Movie {0} not found in the catalog")]
    NotFound(i64),
    #[error("Catalog request failed: {0}")]
    Unavailable(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;
