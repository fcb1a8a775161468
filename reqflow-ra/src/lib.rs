//! reqflow-ra library interface for testing
//!
//! Exposes public APIs for integration testing

pub mod api;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::services::ai_client::InferenceGateway;
use crate::services::orchestrator::{AnalysisOrchestrator, RetrySettings};
use crate::services::registry::TaskRegistry;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Task registry, the only shared mutable resource
    pub registry: TaskRegistry,
    /// Orchestrator for analysis rounds
    pub orchestrator: AnalysisOrchestrator,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last analysis failure for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    /// Assemble application state around an inference gateway.
    ///
    /// The gateway is injected so tests can run the full submit/poll
    /// lifecycle against a double.
    pub fn new(gateway: Arc<dyn InferenceGateway>, retry: RetrySettings) -> Self {
        let registry = TaskRegistry::new();
        let last_error = Arc::new(RwLock::new(None));
        let orchestrator = AnalysisOrchestrator::new(
            registry.clone(),
            gateway,
            retry,
            Arc::clone(&last_error),
        );

        Self {
            registry,
            orchestrator,
            startup_time: Utc::now(),
            last_error,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::feedback_routes())
        .merge(api::status_routes())
        .merge(api::health_routes())
        .with_state(state)
}
