use async_trait::async_trait;

use super::model::*;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_user(&self, username: &str) -> DbResult<Option<User>>;
    async fn get_user_by_id(&self, id: &str) -> DbResult<Option<User>>;
    async fn create_user(&self, user: &User) -> DbResult<()>;
}

#[async_trait]
pub trait MovieRepo: Send + Sync {
    async fn get_movie(&self, movie_id: i64) -> DbResult<Option<Movie>>;
    async fn list_movies_by_popularity(&self) -> DbResult<Vec<Movie>>;
    async fn list_recommendations(&self, movie_id: i64) -> DbResult<Vec<Recommendation>>;
}
