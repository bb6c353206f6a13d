//! HTTP server: routes, middleware and lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::header;
use axum::response::Json;
use axum::routing::{get, post};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::db::Database;
use crate::error::ServerError;
use crate::web::handlers::{
    case_detail_handler, case_list_handler, home_handler, intake_form_handler,
    intake_submit_handler, lawyer_autocomplete_handler, lawyer_create_handler,
    lawyer_form_handler, note_create_handler, task_create_handler, task_form_handler,
    task_list_handler, task_modal_create_handler, task_modal_form_handler,
};
use crate::web::render::Templates;
use crate::web::types::HealthResponse;

/// Shared state for all handlers.
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub templates: Templates,
    /// Fires graceful shutdown of a running server.
    pub shutdown_tx: tokio::sync::RwLock<Option<oneshot::Sender<()>>>,
    /// The running serve loop, joined on shutdown.
    server_task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>, templates: Templates) -> Self {
        Self {
            db,
            templates,
            shutdown_tx: tokio::sync::RwLock::new(None),
            server_task: tokio::sync::Mutex::new(None),
        }
    }

    /// Stop the running server and wait until in-flight requests have
    /// drained and the listener is closed. Returns false when no server is
    /// running.
    pub async fn shutdown(&self) -> bool {
        let Some(tx) = self.shutdown_tx.write().await.take() else {
            return false;
        };
        let signalled = tx.send(()).is_ok();
        let task = self.server_task.lock().await.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!("HTTP server task failed: {}", e);
            }
        }
        signalled
    }
}

/// All routes with their middleware, ready to serve.
pub fn build_router(state: Arc<AppState>, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/health", get(health_handler))
        .route("/cases/", get(case_list_handler))
        .route("/case/{id}/", get(case_detail_handler))
        .route("/intake", get(intake_form_handler).post(intake_submit_handler))
        .route(
            "/lawyer/create/",
            get(lawyer_form_handler).post(lawyer_create_handler),
        )
        .route("/lawyer/autocomplete/", get(lawyer_autocomplete_handler))
        .route("/case/{id}/note/", post(note_create_handler))
        .route("/case/{id}/tasks/", get(task_list_handler))
        .route(
            "/case/{id}/task/new/",
            get(task_form_handler).post(task_create_handler),
        )
        .route(
            "/case/{id}/task/modal/new/",
            get(task_modal_form_handler).post(task_modal_create_handler),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            header::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            header::HeaderValue::from_static("DENY"),
        ))
        .with_state(state)
}

/// Start the HTTP server in the background.
///
/// Returns the actual bound `SocketAddr` (useful when binding to port 0).
/// Stop it with [`AppState::shutdown`], which also joins the serve task.
pub async fn start_server(
    addr: SocketAddr,
    state: Arc<AppState>,
    body_limit: usize,
) -> Result<SocketAddr, ServerError> {
    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::StartupFailed {
                reason: format!("Failed to bind to {}: {}", addr, e),
            })?;
    let bound_addr = listener
        .local_addr()
        .map_err(|e| ServerError::StartupFailed {
            reason: format!("Failed to get local addr: {}", e),
        })?;

    let app = build_router(Arc::clone(&state), body_limit);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    *state.shutdown_tx.write().await = Some(shutdown_tx);

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("HTTP server shutting down");
            })
            .await
        {
            tracing::error!("HTTP server error: {}", e);
        }
    });
    *state.server_task.lock().await = Some(task);

    tracing::info!(addr = %bound_addr, "HTTP server listening");
    Ok(bound_addr)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
