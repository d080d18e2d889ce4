use std::sync::Arc;

use tracing::info;

use crate::catalog::{CatalogError, TmdbClient};
use crate::db::{DbError, Movie, MovieRepo, SqliteRepository};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

/// Records recommendations and keeps the per-movie counts in step with the
/// recommendation rows.
pub struct Ledger {
    db: Arc<SqliteRepository>,
    catalog: Arc<TmdbClient>,
}

impl Ledger {
    pub fn new(db: Arc<SqliteRepository>, catalog: Arc<TmdbClient>) -> Self {
        Self { db, catalog }
    }

    /// Record one recommendation. All writes happen in a single transaction.
    /// The count bump runs first; when it matches nothing the movie is not
    /// cached yet, so its details are fetched from the catalog and it is
    /// inserted with a count of one. Any failure drops the transaction and
    /// leaves no partial rows behind.
    ///
    /// Because the bump is the transaction's first statement, concurrent
    /// recommends for the same uncached movie serialize on the write lock:
    /// exactly one of them inserts, the rest increment.
    pub async fn recommend(
        &self,
        user_id: &str,
        movie_id: i64,
        comment: Option<&str>,
    ) -> Result<(), LedgerError> {
        let mut tx = self.db.begin().await?;

        let cached = SqliteRepository::bump_recommendation_count(&mut tx, movie_id).await?;
        if !cached {
            let details = self.catalog.fetch_details(movie_id).await?;
            let movie = Movie {
                movie_id,
                title: details.title,
                release_date: details.release_date,
                description: details.description,
                recommendation_count: 1,
            };
            SqliteRepository::insert_movie(&mut tx, &movie).await?;
            info!("Cached movie {} ({})", movie_id, movie.title);
        }

        SqliteRepository::insert_recommendation(&mut tx, user_id, movie_id, comment).await?;
        tx.commit().await.map_err(DbError::Sqlx)?;
        Ok(())
    }

    /// Movies ordered by recommendation count, most recommended first.
    /// Equal counts keep the order the movies were first recommended in.
    pub async fn list_by_popularity(&self) -> Result<Vec<Movie>, LedgerError> {
        Ok(self.db.list_movies_by_popularity().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn test_ledger(catalog_url: String) -> (Arc<Ledger>, Arc<SqliteRepository>) {
        let db_path =
            std::env::temp_dir().join(format!("cinerec-test-{}.db", uuid::Uuid::new_v4()));
        let db = Arc::new(SqliteRepository::new(db_path.to_str().unwrap()).await.unwrap());
        let catalog = Arc::new(
            TmdbClient::new(&CatalogConfig {
                api_key: "test-key".to_string(),
                base_url: catalog_url,
                timeout_secs: 5,
            })
            .unwrap(),
        );
        (Arc::new(Ledger::new(db.clone(), catalog)), db)
    }

    fn details_response() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 603,
            "title": "The Matrix",
            "release_date": "1999-03-31",
            "overview": "A hacker learns the truth."
        }))
    }

    #[tokio::test]
    async fn test_first_recommend_caches_movie() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/603"))
            .respond_with(details_response())
            .expect(1)
            .mount(&server)
            .await;

        let (ledger, db) = test_ledger(server.uri()).await;
        ledger.recommend("user-1", 603, Some("a classic")).await.unwrap();

        let movie = db.get_movie(603).await.unwrap().unwrap();
        assert_eq!(movie.title, "The Matrix");
        assert_eq!(movie.recommendation_count, 1);

        let recommendations = db.list_recommendations(603).await.unwrap();
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].comment.as_deref(), Some("a classic"));
    }

    #[tokio::test]
    async fn test_second_recommend_skips_catalog() {
        let server = MockServer::start().await;
        // The details fetch must happen exactly once; the second recommend
        // only bumps the count.
        Mock::given(method("GET"))
            .and(path("/movie/603"))
            .respond_with(details_response())
            .expect(1)
            .mount(&server)
            .await;

        let (ledger, db) = test_ledger(server.uri()).await;
        ledger.recommend("user-1", 603, None).await.unwrap();
        ledger.recommend("user-2", 603, None).await.unwrap();

        let movie = db.get_movie(603).await.unwrap().unwrap();
        assert_eq!(movie.recommendation_count, 2);
        assert_eq!(db.list_recommendations(603).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_same_user_may_recommend_twice() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/603"))
            .respond_with(details_response())
            .mount(&server)
            .await;

        let (ledger, db) = test_ledger(server.uri()).await;
        ledger.recommend("user-1", 603, None).await.unwrap();
        ledger.recommend("user-1", 603, None).await.unwrap();

        assert_eq!(db.get_movie(603).await.unwrap().unwrap().recommendation_count, 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_no_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/603"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (ledger, db) = test_ledger(server.uri()).await;
        let err = ledger.recommend("user-1", 603, None).await.unwrap_err();
        assert!(matches!(err, LedgerError::Catalog(CatalogError::Unavailable(_))));

        assert!(db.get_movie(603).await.unwrap().is_none());
        assert!(db.list_recommendations(603).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_movie_leaves_no_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/999999"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let (ledger, db) = test_ledger(server.uri()).await;
        let err = ledger.recommend("user-1", 999999, None).await.unwrap_err();
        assert!(matches!(err, LedgerError::Catalog(CatalogError::NotFound(999999))));

        assert!(db.get_movie(999999).await.unwrap().is_none());
        assert!(db.list_recommendations(999999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_recommends_count_exactly() {
        let server = MockServer::start().await;
        // Even with every task racing on an uncached movie, only the first
        // writer fetches and inserts; the others serialize behind it and
        // increment.
        Mock::given(method("GET"))
            .and(path("/movie/603"))
            .respond_with(details_response())
            .expect(1)
            .mount(&server)
            .await;

        let (ledger, db) = test_ledger(server.uri()).await;

        let mut tasks = Vec::new();
        for i in 0..8 {
            let ledger = ledger.clone();
            tasks.push(tokio::spawn(async move {
                ledger.recommend(&format!("user-{}", i), 603, None).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let movie = db.get_movie(603).await.unwrap().unwrap();
        assert_eq!(movie.recommendation_count, 8);
        assert_eq!(db.list_recommendations(603).await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_list_by_popularity_orders_by_count() {
        let server = MockServer::start().await;
        for id in [1, 2, 3] {
            Mock::given(method("GET"))
                .and(path(format!("/movie/{}", id)))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "id": id,
                    "title": format!("Movie {}", id),
                    "release_date": "2000-01-01",
                    "overview": ""
                })))
                .mount(&server)
                .await;
        }

        let (ledger, _db) = test_ledger(server.uri()).await;
        // Movie 2 ends at two recommendations, movies 1 and 3 at one each.
        ledger.recommend("user-1", 1, None).await.unwrap();
        ledger.recommend("user-1", 2, None).await.unwrap();
        ledger.recommend("user-2", 2, None).await.unwrap();
        ledger.recommend("user-2", 3, None).await.unwrap();

        let movies = ledger.list_by_popularity().await.unwrap();
        let ids: Vec<i64> = movies.iter().map(|m| m.movie_id).collect();
        // The tie between 1 and 3 keeps first-recommended order.
        assert_eq!(ids, vec![2, 1, 3]);
    }
}
