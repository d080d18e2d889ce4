use std::time::Duration;

use tracing::warn;

use crate::config::CatalogConfig;

use super::types::{MovieDetails, SearchHit, SearchResponse};
use super::{CatalogError, CatalogResult};

/// Client for a TMDB-style movie catalog. One reqwest client with a bounded
/// timeout is shared across all requests, so a slow upstream can never hold
/// a caller past the deadline.
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub async fn search(&self, query: &str, page: u32) -> CatalogResult<Vec<SearchHit>> {
        let url = format!("{}/search/movie", self.base_url);
        let page = page.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("query", query),
                ("page", page.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            warn!("Catalog search returned {}", response.status());
            return Err(CatalogError::Unavailable(format!(
                "search returned {}",
                response.status()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        Ok(body.results.into_iter().map(SearchHit::from).collect())
    }

    /// Fetch one movie by catalog id. A 404 is reported as `NotFound`; every
    /// other failure, including timeouts and bad payloads, is `Unavailable`.
    pub async fn fetch_details(&self, movie_id: i64) -> CatalogResult<MovieDetails> {
        let url = format!("{}/movie/{}", self.base_url, movie_id);
        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(movie_id));
        }
        if !response.status().is_success() {
            warn!("Catalog details returned {}", response.status());
            return Err(CatalogError::Unavailable(format!(
                "details returned {}",
                response.status()
            )));
        }

        response
            .json::<MovieDetails>()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: String) -> TmdbClient {
        TmdbClient::new(&CatalogConfig {
            api_key: "test-key".to_string(),
            base_url,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_search_maps_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .and(query_param("api_key", "test-key"))
            .and(query_param("query", "matrix"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "page": 1,
                "results": [
                    {"id": 603, "title": "The Matrix", "release_date": "1999-03-31",
                     "overview": "A hacker learns the truth."},
                    {"id": 604, "title": "The Matrix Reloaded", "release_date": ""}
                ]
            })))
            .mount(&server)
            .await;

        let hits = test_client(server.uri()).search("matrix", 1).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].movie_id, 603);
        assert_eq!(hits[0].year, "1999");
        assert_eq!(hits[1].year, "unknown");
        assert_eq!(hits[1].description, "");
    }

    #[tokio::test]
    async fn test_search_zero_matches_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "page": 1,
                "results": [],
                "total_pages": 1,
                "total_results": 0
            })))
            .mount(&server)
            .await;

        let hits = test_client(server.uri()).search("zzzznope", 1).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_search_upstream_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/movie"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = test_client(server.uri()).search("matrix", 1).await.unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_details_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/999999"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = test_client(server.uri()).fetch_details(999999).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(999999)));
    }

    #[tokio::test]
    async fn test_details_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/603"))
            .and(query_param("api_key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 603,
                "title": "The Matrix",
                "release_date": "1999-03-31",
                "overview": "A hacker learns the truth."
            })))
            .mount(&server)
            .await;

        let details = test_client(server.uri()).fetch_details(603).await.unwrap();
        assert_eq!(details.title, "The Matrix");
        assert_eq!(details.release_date.as_deref(), Some("1999-03-31"));
    }

    #[tokio::test]
    async fn test_unreachable_catalog_is_unavailable() {
        // Nothing listens on this port.
        let err = test_client("http://127.0.0.1:9".to_string())
            .fetch_details(603)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_slow_catalog_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/603"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": 603, "title": "The Matrix"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = TmdbClient::new(&CatalogConfig {
            api_key: "test-key".to_string(),
            base_url: server.uri(),
            timeout_secs: 1,
        })
        .unwrap();
        let err = client.fetch_details(603).await.unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(_)));
    }
}
