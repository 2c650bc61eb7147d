use std::sync::Arc;

use crate::audit::pipeline::AuditSettings;
use crate::llm_client::ModelGateway;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once before the listener starts and never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable gateway. Default: `GeminiClient`. Tests inject doubles.
    pub gateway: Arc<dyn ModelGateway>,
    pub settings: AuditSettings,
}
