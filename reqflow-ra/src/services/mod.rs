//! Core services
//!
//! Gateway client, retry policy, merge protocol, task registry, and the
//! orchestrator that wires them together.

pub mod ai_client;
pub mod backoff;
pub mod merge;
pub mod orchestrator;
pub mod prompt;
pub mod registry;

pub use ai_client::{AiBuilderClient, GatewayError, InferenceGateway};
pub use orchestrator::{AnalysisOrchestrator, RetrySettings};
pub use registry::TaskRegistry;
