use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tracing::info;

use super::model::*;
use super::repo::*;

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(db_path: &str) -> DbResult<Self> {
        // The recommend transaction holds the write lock across a catalog
        // fetch, so waiting writers must outlast that fetch.
        let options = SqliteConnectOptions::from_str(db_path)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let repo = Self { pool };

        repo.init_schema().await?;

        info!("Database initialized at {}", db_path);

        Ok(repo)
    }

    async fn init_schema(&self) -> DbResult<()> {
        let schema = include_str!("schema.sql");
        sqlx::query(schema).execute(&self.pool).await?;
        Ok(())
    }

    /// Start a transaction. Dropping it without commit rolls back.
    pub async fn begin(&self) -> DbResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Relative increment of a cached movie's recommendation count.
    /// Returns false when no row matched, i.e. the movie is not cached yet.
    /// This runs as the first statement of the recommend transaction, so the
    /// write lock is taken before anything is read.
    pub async fn bump_recommendation_count(
        tx: &mut Transaction<'_, Sqlite>,
        movie_id: i64,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE movies SET recommendation_count = recommendation_count + 1 WHERE movie_id = ?",
        )
        .bind(movie_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_movie(tx: &mut Transaction<'_, Sqlite>, movie: &Movie) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO movies (movie_id, title, release_date, description, recommendation_count)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(movie.movie_id)
        .bind(&movie.title)
        .bind(&movie.release_date)
        .bind(&movie.description)
        .bind(movie.recommendation_count)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn insert_recommendation(
        tx: &mut Transaction<'_, Sqlite>,
        user_id: &str,
        movie_id: i64,
        comment: Option<&str>,
    ) -> DbResult<()> {
        sqlx::query("INSERT INTO recommendations (user_id, movie_id, comment) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(movie_id)
            .bind(comment)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepo for SqliteRepository {
    async fn get_user(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: &User) -> DbResult<()> {
        sqlx::query("INSERT INTO users (id, username, password_hash, created) VALUES (?, ?, ?, ?)")
            .bind(&user.id)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.created)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref dbe) if dbe.is_unique_violation() => {
                    DbError::AlreadyExists(format!("User already exists: {}", user.username))
                }
                _ => DbError::Sqlx(e),
            })?;
        Ok(())
    }
}

#[async_trait]
impl MovieRepo for SqliteRepository {
    async fn get_movie(&self, movie_id: i64) -> DbResult<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(
            "SELECT movie_id, title, release_date, description, recommendation_count
             FROM movies WHERE movie_id = ?",
        )
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(movie)
    }

    async fn list_movies_by_popularity(&self) -> DbResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(
            "SELECT movie_id, title, release_date, description, recommendation_count
             FROM movies
             ORDER BY recommendation_count DESC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    async fn list_recommendations(&self, movie_id: i64) -> DbResult<Vec<Recommendation>> {
        let recommendations = sqlx::query_as::<_, Recommendation>(
            "SELECT id, user_id, movie_id, comment FROM recommendations
             WHERE movie_id = ? ORDER BY id",
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(recommendations)
    }
}
