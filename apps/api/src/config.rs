use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::gemini::DEFAULT_API_BASE;
use crate::prompt::OutputContract;

const DEFAULT_MODEL_PREFERENCES: &str = "gemini-2.5-flash,gemini-2.0-flash,gemini-1.5-flash";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Read once at startup; fails if required variables are missing.
#[derive(Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    /// Pins the model and skips probing when set.
    pub gemini_model: Option<String>,
    pub model_preferences: Vec<String>,
    pub gateway_timeout: Duration,
    pub output_contract: OutputContract,
    pub expose_error_details: bool,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            gemini_api_key: get("GEMINI_API_KEY").with_context(|| {
                "Required environment variable 'GEMINI_API_KEY' is not set".to_string()
            })?,
            gemini_api_base: get("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            gemini_model: get("GEMINI_MODEL").map(|m| m.trim().to_string()),
            model_preferences: parse_list(
                &get("GEMINI_MODEL_PREFERENCES")
                    .unwrap_or_else(|| DEFAULT_MODEL_PREFERENCES.to_string()),
            ),
            gateway_timeout: Duration::from_secs(
                get("GATEWAY_TIMEOUT_SECS")
                    .unwrap_or_else(|| "120".to_string())
                    .trim()
                    .parse::<u64>()
                    .context("GATEWAY_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            output_contract: get("AUDIT_OUTPUT")
                .map(|v| v.parse::<OutputContract>())
                .transpose()
                .map_err(anyhow::Error::msg)
                .context("AUDIT_OUTPUT is invalid")?
                .unwrap_or_default(),
            expose_error_details: get("EXPOSE_ERROR_DETAILS")
                .map(|v| parse_bool(&v))
                .transpose()
                .context("EXPOSE_ERROR_DETAILS must be true or false")?
                .unwrap_or(false),
            max_upload_bytes: get("MAX_UPLOAD_BYTES")
                .map(|v| v.trim().parse::<usize>())
                .transpose()
                .context("MAX_UPLOAD_BYTES must be a number of bytes")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .trim()
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

// The credential never reaches logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gemini_api_key", &"<redacted>")
            .field("gemini_api_base", &self.gemini_api_base)
            .field("gemini_model", &self.gemini_model)
            .field("model_preferences", &self.model_preferences)
            .field("gateway_timeout", &self.gateway_timeout)
            .field("output_contract", &self.output_contract)
            .field("expose_error_details", &self.expose_error_details)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("'{other}' is not a boolean"),
    }
}
