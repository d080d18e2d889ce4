pub mod auth;
pub mod error;
pub mod movies;
pub mod types;

pub use error::{ApiError, ApiResult};
