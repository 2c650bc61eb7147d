/// Model Gateway: the single point of entry for all generative-model calls.
///
/// ARCHITECTURAL RULE: No other module may call the model provider directly.
/// Handlers only see `dyn ModelGateway`, which is what lets tests swap in doubles.
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::prompt::ModelPrompt;

pub mod gemini;

pub use gemini::GeminiClient;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("could not decode gateway response: {0}")]
    Decode(String),

    #[error("model returned empty content")]
    EmptyResponse,

    #[error("model did not answer within {}s", .0.as_secs())]
    Timeout(Duration),
}

/// Opaque generation capability: prompt in, free-form text out.
///
/// No latency bound and no guarantee the output honors the prompt's contract.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Identifier of the model answering requests, fixed at startup.
    fn model(&self) -> &str;

    async fn generate(&self, prompt: &ModelPrompt) -> Result<String, GatewayError>;
}
