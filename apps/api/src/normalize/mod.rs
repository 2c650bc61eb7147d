//! Response Normalizer. The model's adherence to the prompt is never trusted:
//! fences are stripped, structure is validated and identity terms are scrubbed
//! locally.

use serde::de::DeserializeOwned;
use thiserror::Error;

pub mod fences;
pub mod scrub;

pub use fences::strip_code_fences;
pub use scrub::scrub_identity;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("model output did not match the structured contract: {0}")]
    MalformedStructuredOutput(#[from] serde_json::Error),
}

/// Strips fences, parses JSON, scrubs every string value, then deserializes into `T`.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, NormalizeError> {
    let mut value: serde_json::Value = serde_json::from_str(strip_code_fences(raw))?;
    scrub::scrub_json(&mut value);
    Ok(serde_json::from_value(value)?)
}

/// Free-text contract: trimmed and scrubbed.
pub fn normalize_text(raw: &str) -> String {
    scrub_identity(raw.trim()).into_owned()
}
