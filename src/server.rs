use axum::response::Html;
use axum::routing::{get, post};
use axum::{extract::Request, http::StatusCode, response::IntoResponse, Router};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::auth::AuthService;
use crate::catalog::TmdbClient;
use crate::config::Config;
use crate::ledger::Ledger;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<AuthService>,
    pub catalog: Arc<TmdbClient>,
    pub ledger: Arc<Ledger>,
}

impl AppState {
    pub fn new(
        config: Config,
        auth: Arc<AuthService>,
        catalog: Arc<TmdbClient>,
        ledger: Arc<Ledger>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            auth,
            catalog,
            ledger,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/protected", get(crate::api::auth::protected))
        .route(
            "/add_recommendation",
            post(crate::api::movies::add_recommendation),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::api::auth::require_user,
        ));

    let router = Router::new()
        .route("/register", post(crate::api::auth::register))
        .route("/login", post(crate::api::auth::login))
        .route("/search", get(crate::api::movies::search))
        .route(
            "/recommended_movies",
            get(crate::api::movies::recommended_movies),
        )
        .merge(protected_routes)
        .fallback(fallback_handler);

    // With an appdir the frontend comes from disk, index page included.
    // ServeDir overrides the fallback for file paths; OPTIONS still hits
    // the fallback first.
    let router = match state.config.appdir {
        Some(ref appdir) => router.fallback_service(ServeDir::new(appdir)),
        None => router.route("/", get(landing_page)),
    };

    router
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

const LANDING_PAGE: &str = "<!DOCTYPE html>\n\
<html>\n\
<head><title>cinerec</title></head>\n\
<body>\n\
<h1>cinerec</h1>\n\
<p>Movie recommendation service.</p>\n\
<ul>\n\
<li>POST /register</li>\n\
<li>POST /login</li>\n\
<li>GET /search?query=...&amp;page=1</li>\n\
<li>POST /add_recommendation (bearer token)</li>\n\
<li>GET /recommended_movies</li>\n\
</ul>\n\
</body>\n\
</html>\n";

async fn landing_page() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

async fn fallback_handler(req: Request) -> impl IntoResponse {
    // OPTIONS preflights answer 200 so the CORS layer can do its work.
    if req.method() == axum::http::Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}
