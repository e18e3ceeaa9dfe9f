//! HTTP API module for the recurring-transaction scheduler.
//!
//! Provides REST endpoints for managing records, triggering submissions,
//! and controlling the scheduler.

mod errors;
mod handlers;
mod responses;

pub use errors::ApiError;
pub use handlers::ApiState;
pub use responses::*;

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::scheduler::SchedulerHandle;
use crate::storage::TransactionStore;

/// Configuration for the API server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8580,
        }
    }
}

impl ApiConfig {
    /// Create a new API config with custom host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Get the socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("invalid socket address")
    }
}

/// Build the API router with all endpoints.
pub fn build_router<S: TransactionStore + 'static>(state: ApiState<S>) -> Router {
    Router::new()
        // Health check
        .route("/api/health", get(handlers::health))
        // Scheduler control
        .route(
            "/api/scheduler/state",
            get(handlers::get_scheduler_state::<S>),
        )
        .route("/api/scheduler/pause", post(handlers::pause_scheduler::<S>))
        .route(
            "/api/scheduler/resume",
            post(handlers::resume_scheduler::<S>),
        )
        // Records
        .route(
            "/api/transactions",
            get(handlers::list_transactions::<S>).post(handlers::create_transaction::<S>),
        )
        .route("/api/transactions/{code}", get(handlers::get_transaction::<S>))
        // Manual execution
        .route("/api/executions/run", post(handlers::run_due_today::<S>))
        .route(
            "/api/executions/run/{code}",
            post(handlers::run_transaction::<S>),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Create the API state from scheduler components.
pub fn create_api_state<S: TransactionStore>(
    handle: SchedulerHandle,
    store: Arc<S>,
) -> ApiState<S> {
    ApiState { handle, store }
}

/// Start the API server.
///
/// This function spawns the server and returns a handle to the task.
/// The server runs until the task is aborted or the process exits.
pub async fn start_server<S: TransactionStore + 'static>(
    config: ApiConfig,
    state: ApiState<S>,
) -> std::io::Result<tokio::task::JoinHandle<()>> {
    let router = build_router(state);
    let addr = config.socket_addr();

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("API server listening on http://{}", addr);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(handle)
}
