pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod ledger;
pub mod middleware;
pub mod server;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] db::DbError),
    #[error("Server error: {0}")]
    Server(String),
}

pub async fn run(config_path: &str) -> Result<(), ServerError> {
    let config = config::Config::from_file(config_path)?;

    info!("Using config file: {}", config_path);

    let db_path = config
        .get_database_path()
        .ok_or_else(|| ServerError::Server("No database path configured".to_string()))?;

    info!("Opening database at {}", db_path);
    let db = Arc::new(db::SqliteRepository::new(&db_path).await?);

    let auth = Arc::new(
        auth::AuthService::new(db.clone(), &config.auth)
            .map_err(|e| ServerError::Server(format!("Failed to set up auth: {}", e)))?,
    );
    let catalog = Arc::new(
        catalog::TmdbClient::new(&config.catalog)
            .map_err(|e| ServerError::Server(format!("Failed to build catalog client: {}", e)))?,
    );
    let ledger = Arc::new(ledger::Ledger::new(db, catalog.clone()));

    let address = config.listen.address.as_deref().unwrap_or("[::]");
    let port = &config.listen.port;
    let addr: SocketAddr = format!("{}:{}", address, port)
        .parse()
        .map_err(|e| ServerError::Server(format!("Invalid address: {}", e)))?;

    let state = server::AppState::new(config.clone(), auth, catalog, ledger);
    let app = server::build_router(state);

    if let (Some(cert_path), Some(key_path)) = (&config.listen.tlscert, &config.listen.tlskey) {
        info!("Loading TLS certificate from {}", cert_path);
        info!("Loading TLS key from {}", key_path);

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .map_err(|e| ServerError::Server(format!("Failed to load TLS config: {}", e)))?;

        info!("Serving HTTPS on {}", addr);

        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await
            .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;
    } else {
        info!("Serving HTTP on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Server(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;
    }

    Ok(())
}
