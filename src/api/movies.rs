use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::catalog::SearchHit;
use crate::server::AppState;

use super::error::{ApiError, ApiResult};
use super::types::{MessageResponse, RecommendRequest, RecommendedMovie, SearchParams};

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<SearchHit>>> {
    let query = match params.query.as_deref().map(str::trim) {
        Some(query) if !query.is_empty() => query,
        // Nothing to ask the catalog for; answered without an upstream call.
        _ => return Err(ApiError::NoMovies),
    };
    let page = params.page.unwrap_or(1).max(1);

    let hits = state
        .catalog
        .search(query, page)
        .await
        .map_err(ApiError::CatalogUnavailable)?;

    Ok(Json(hits))
}

pub async fn add_recommendation(
    axum::Extension(user_id): axum::Extension<String>,
    State(state): State<AppState>,
    Json(req): Json<RecommendRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let movie_id = req
        .movie_id
        .ok_or_else(|| ApiError::Validation("Missing movie_id".to_string()))?;

    state
        .ledger
        .recommend(&user_id, movie_id, req.comment.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Recommendation added successfully")),
    ))
}

pub async fn recommended_movies(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<RecommendedMovie>>> {
    let movies = state.ledger.list_by_popularity().await?;
    Ok(Json(movies.into_iter().map(RecommendedMovie::from).collect()))
}
