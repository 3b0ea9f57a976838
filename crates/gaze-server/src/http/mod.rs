//! Router assembly and the listener loop.

pub mod assets;
pub mod client;
pub mod handlers;

use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use gaze_config::{GazeConfig, ServerConfig};
use gaze_core::SaveResponse;
use gaze_db::LogStore;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::ingest::IngestService;
use assets::StaticAssets;

/// Shared handler state.
pub struct AppState<S> {
    pub ingest: Arc<IngestService<S>>,
    pub trust_forwarded_for: bool,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ingest: Arc::clone(&self.ingest),
            trust_forwarded_for: self.trust_forwarded_for,
        }
    }
}

/// Build the full application from loaded configuration.
///
/// `store` is `None` in skip mode.
pub fn app<S: LogStore>(config: &GazeConfig, store: Option<S>) -> Router {
    let ingest = IngestService::new(store, config.database.statement_timeout());
    router(&config.server, ingest)
}

/// Build the router around an existing ingestion service.
pub fn router<S: LogStore>(server: &ServerConfig, ingest: IngestService<S>) -> Router {
    let state = AppState {
        ingest: Arc::new(ingest),
        trust_forwarded_for: server.trust_forwarded_for,
    };

    let api = Router::new()
        .route(
            "/save",
            post(handlers::save::<S>).fallback(handlers::not_found),
        )
        .route("/health", get(handlers::health).fallback(handlers::not_found))
        .with_state(state);

    StaticAssets::new(&server.static_dir)
        .mount(api, server.static_max_age_secs)
        .layer(DefaultBodyLimit::max(server.body_limit_bytes))
        .layer(CompressionLayer::new())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(detail, "request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(SaveResponse::failed("internal error")),
    )
        .into_response()
}

/// Serve `app` on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns the I/O error that stopped the accept loop.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await
}
