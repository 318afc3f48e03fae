//! HTTP surface.
//!
//! | Method & path            | Operation                  |
//! |--------------------------|----------------------------|
//! | `GET /`                  | liveness and version       |
//! | `POST /upload`           | store template + data      |
//! | `GET /tags`              | placeholder classification |
//! | `GET /rules`             | list stored rules          |
//! | `DELETE /rules/{tag}`    | remove a rule              |
//! | `POST /rules/generate`   | generate a rule            |
//! | `POST /rules/test`       | run a rule                 |
//! | `POST /document/render`  | render the document        |
//! | `POST /document/pdf`     | convert HTML to PDF        |

mod envelope;
mod handlers;


pub use envelope::{ApiError, ApiResult};

use crate::error::{DocfillError, Result};
use crate::service::TemplateService;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TemplateService>,
}

/// Build the router with CORS, request tracing and the body size limit.
pub fn router(service: Arc<TemplateService>) -> Router {
    let body_limit = service.config().server.max_upload_bytes;
    Router::new()
        .route("/", get(handlers::root))
        .route("/upload", post(handlers::upload))
        .route("/tags", get(handlers::tags))
        .route("/rules", get(handlers::list_rules))
        .route("/rules/{tag}", delete(handlers::remove_rule))
        .route("/rules/generate", post(handlers::generate_rule))
        .route("/rules/test", post(handlers::test_rule))
        .route("/document/render", post(handlers::render_document))
        .route("/document/pdf", post(handlers::document_pdf))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { service })
}

/// Serve until Ctrl+C or SIGTERM.
pub async fn serve(service: Arc<TemplateService>, host: &str, port: u16) -> Result<()> {
    let address = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&address).await.map_err(|e| {
        DocfillError::Configuration(format!("failed to bind {}: {}", address, e))
    })?;
    let local = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or(address);

    info!(address = %local, data_dir = %service.workspace().data_dir.display(), "docfill listening");
    info!("Press Ctrl+C to shut down");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DocfillError::Storage(format!("server error: {}", e)))?;

    info!("server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received SIGTERM");
        },
    }
}
