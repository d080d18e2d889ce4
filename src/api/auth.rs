use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::server::AppState;

use super::error::{ApiError, ApiResult};
use super::types::{LoggedInAs, LoginRequest, MessageResponse, RegisterRequest, TokenResponse};

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let (username, password) = match (req.username.as_deref(), req.password.as_deref()) {
        (Some(username), Some(password)) if !username.trim().is_empty() && !password.is_empty() => {
            (username.trim(), password)
        }
        _ => {
            return Err(ApiError::Validation(
                "Missing username or password".to_string(),
            ))
        }
    };

    state.auth.register(username, password).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully.")),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    // A missing field reads as bad credentials, the same as a wrong
    // password. The login endpoint never explains which part was wrong.
    let (username, password) = match (req.username.as_deref(), req.password.as_deref()) {
        (Some(username), Some(password)) => (username.trim(), password),
        _ => return Err(ApiError::BadCredentials),
    };

    let user = state.auth.authenticate(username, password).await?;
    let access_token = state.auth.issue_token(&user.id)?;

    Ok(Json(TokenResponse { access_token }))
}

pub async fn protected(
    axum::Extension(user_id): axum::Extension<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<LoggedInAs>> {
    // The id came from a valid token; a user deleted since then still fails
    // closed.
    let user = state
        .auth
        .find_user(&user_id)
        .await?
        .ok_or(ApiError::BadToken)?;
    Ok(Json(LoggedInAs {
        logged_in_as: user.username,
    }))
}

/// Verifies the bearer token and stores the user id as a request extension.
/// Handlers behind this middleware can count on the extension being there.
pub async fn require_user(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let user_id = bearer_token(&req).and_then(|token| state.auth.verify_token(token).ok());
    match user_id {
        Some(user_id) => {
            req.extensions_mut().insert(user_id);
            next.run(req).await
        }
        None => ApiError::BadToken.into_response(),
    }
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
