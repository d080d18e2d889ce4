use serde::{Deserialize, Serialize};

/// One page of results from the catalog's movie search.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub results: Vec<CatalogMovie>,
}

/// A movie as the catalog reports it. Fields beyond these are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct CatalogMovie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

/// A search result as served to clients, with the release year already
/// extracted.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub movie_id: i64,
    pub title: String,
    pub year: String,
    pub description: String,
}

impl From<CatalogMovie> for SearchHit {
    fn from(movie: CatalogMovie) -> Self {
        Self {
            movie_id: movie.id,
            title: movie.title,
            year: release_year(movie.release_date.as_deref()),
            description: movie.overview.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovieDetails {
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default, rename = "overview")]
    pub description: Option<String>,
}

/// Leading segment of a `YYYY-MM-DD` date, or `"unknown"` when the catalog
/// reports no date at all.
pub(crate) fn release_year(release_date: Option<&str>) -> String {
    match release_date {
        Some(date) if !date.is_empty() => match date.split('-').next() {
            Some(year) if !year.is_empty() => year.to_string(),
            _ => "unknown".to_string(),
        },
        _ => "unknown".to_string(),
    }
}
