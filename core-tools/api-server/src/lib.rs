//! API Server
//!
//! JSON over HTTP for the essay marking front end. Serves account
//! registration and login, essay marking, per-user history, and raw data
//! exports. Static front-end files are served from a directory when one is
//! configured.
//!
//! # Endpoints
//!
//! - GET /api/users - List accounts
//! - POST /api/register - Create an account
//! - POST /api/login - Check credentials
//! - POST /api/mark-essay - Generate and store feedback for an essay
//! - GET /api/user-essays/:username - Essays submitted by one user
//! - GET /api/essays - Every essay
//! - GET /api/export/json - Accounts as a JSON download
//! - GET /api/export/text - Accounts as a text download
//! - GET /api/export/essays-json - Essays as a JSON download
//! - GET /api/status - Get server status

pub mod error;
pub mod extract;
pub mod routes;

pub use error::ApiError;
pub use extract::JsonBody;

use axum::{
    routing::{get, post},
    Router,
};
use sdk::{CoreContext, EngineError, Service};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Build the application router over `ctx`
///
/// Unmatched paths fall through to `static_dir` when it exists.
pub fn router(ctx: CoreContext, static_dir: Option<&Path>) -> Router {
    let api: Router = Router::new()
        .route("/api/users", get(routes::list_users))
        .route("/api/register", post(routes::register))
        .route("/api/login", post(routes::login))
        .route("/api/mark-essay", post(routes::mark_essay))
        .route("/api/user-essays/:username", get(routes::user_essays))
        .route("/api/essays", get(routes::list_essays))
        .route("/api/export/json", get(routes::export_users_json))
        .route("/api/export/text", get(routes::export_users_text))
        .route("/api/export/essays-json", get(routes::export_essays_json))
        .route("/api/status", get(routes::status))
        .with_state(ctx);

    let app = match static_dir {
        Some(dir) if dir.is_dir() => api.fallback_service(ServeDir::new(dir)),
        Some(dir) => {
            tracing::warn!("Static directory {} not found, serving API only", dir.display());
            api
        }
        None => api,
    };

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Where and what the server listens on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            static_dir: None,
        }
    }
}

/// API server
pub struct ApiServer {
    settings: ServerSettings,
    addr: Option<SocketAddr>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl ApiServer {
    /// Create a new ApiServer instance
    pub fn new(settings: ServerSettings) -> Self {
        Self {
            settings,
            addr: None,
            shutdown_tx: None,
        }
    }

    /// Address bound by the last successful `start`
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    /// Whether the server is currently serving
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }
}

impl Default for ApiServer {
    fn default() -> Self {
        Self::new(ServerSettings::default())
    }
}

#[async_trait::async_trait]
impl Service for ApiServer {
    fn name(&self) -> &str {
        "api-server"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    async fn start(&mut self, ctx: CoreContext) -> Result<SocketAddr, EngineError> {
        if self.is_running() {
            return Err(EngineError::Network("API server already running".to_string()));
        }

        let bind_to = format!("{}:{}", self.settings.host, self.settings.port);
        let listener = tokio::net::TcpListener::bind(&bind_to)
            .await
            .map_err(|e| EngineError::Network(format!("Failed to bind to {}: {}", bind_to, e)))?;

        let addr = listener
            .local_addr()
            .map_err(|e| EngineError::Network(format!("Failed to get local address: {}", e)))?;

        let app = router(ctx, self.settings.static_dir.as_deref());

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_rx.await.ok();
                    tracing::info!("API server shutting down gracefully");
                })
                .await
                .unwrap_or_else(|e| {
                    tracing::error!("API server error: {}", e);
                });
        });

        self.addr = Some(addr);
        self.shutdown_tx = Some(shutdown_tx);

        tracing::info!("API server listening on http://{}", addr);
        Ok(addr)
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            shutdown_tx.send(()).ok();
            tracing::info!("API server stopped");
        }
        Ok(())
    }
}
