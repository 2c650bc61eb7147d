//! Validation sequence for one audit, short-circuiting on the first failure:
//! format → extraction → minimum content → gateway → normalization.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::audit::models::{AuditReport, AuditResult, UploadedDocument};
use crate::config::Config;
use crate::errors::AppError;
use crate::extract::{self, DocumentKind, ExtractError, NormalizedContent};
use crate::llm_client::{GatewayError, ModelGateway};
use crate::normalize::{normalize_text, parse_structured};
use crate::prompt::{assemble, AuditContext, OutputContract};

/// Text shorter than this (trimmed, in characters) is treated as unreadable.
pub const MIN_TEXT_CHARS: usize = 50;

const SUPPORTED_EXTENSIONS: &str = "pdf, docx, xlsx, xls, csv, txt, png, jpg, jpeg";

/// Per-process audit behaviour, derived from `Config` at startup.
#[derive(Debug, Clone)]
pub struct AuditSettings {
    pub contract: OutputContract,
    /// When false, error bodies never carry underlying diagnostics.
    pub expose_error_details: bool,
    pub gateway_timeout: Duration,
    pub min_text_chars: usize,
    pub max_upload_bytes: usize,
}

impl AuditSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            contract: config.output_contract,
            expose_error_details: config.expose_error_details,
            gateway_timeout: config.gateway_timeout,
            min_text_chars: MIN_TEXT_CHARS,
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    fn details(&self, cause: &dyn fmt::Display) -> Option<String> {
        self.expose_error_details.then(|| cause.to_string())
    }
}

pub async fn run_audit(
    gateway: &dyn ModelGateway,
    settings: &AuditSettings,
    upload: UploadedDocument,
    context: AuditContext,
) -> Result<AuditResult, AppError> {
    // 1. Format
    let kind = DocumentKind::from_filename(&upload.filename).map_err(|e| {
        warn!("Rejected upload: {e}");
        AppError::UnsupportedFormat(format!(
            "Unsupported file type for '{}'. Accepted formats: {SUPPORTED_EXTENSIONS}",
            upload.filename
        ))
    })?;

    // 2. Extraction
    let content = extract_off_thread(kind, upload, settings).await?;

    // 3. Minimum content, text only
    if let Some(len) = content.text_len() {
        if len < settings.min_text_chars {
            warn!("Rejected {kind} upload: only {len} characters of text");
            return Err(AppError::InsufficientContent(format!(
                "The {kind} document is empty or non-readable: found {len} characters of text, \
                 at least {} required. Scanned documents need a text layer or can be sent as an image.",
                settings.min_text_chars
            )));
        }
    }

    // 4. Gateway
    let prompt = assemble(
        settings.contract.persona(),
        &context,
        content,
        settings.contract,
    );
    let started = Instant::now();
    let raw = tokio::time::timeout(settings.gateway_timeout, gateway.generate(&prompt))
        .await
        .unwrap_or(Err(GatewayError::Timeout(settings.gateway_timeout)))
        .map_err(|e| {
            error!("Gateway call to '{}' failed: {e}", gateway.model());
            AppError::Gateway {
                details: settings.details(&e),
            }
        })?;
    info!(
        "Gateway answered in {}ms ({} chars)",
        started.elapsed().as_millis(),
        raw.len()
    );

    // 5. Normalization
    match settings.contract {
        OutputContract::Json => parse_structured::<AuditReport>(&raw)
            .map(AuditResult::Structured)
            .map_err(|e| {
                error!("Model output violated the JSON contract: {e}");
                AppError::MalformedOutput {
                    details: settings.details(&e),
                }
            }),
        OutputContract::Text => Ok(AuditResult::Text(normalize_text(&raw))),
    }
}

/// Parsers are CPU-bound and some panic on hostile input, so extraction runs
/// on the blocking pool. A panic is reported as a corrupt document.
async fn extract_off_thread(
    kind: DocumentKind,
    upload: UploadedDocument,
    settings: &AuditSettings,
) -> Result<NormalizedContent, AppError> {
    let UploadedDocument {
        filename,
        content_type,
        bytes,
    } = upload;

    let joined = tokio::task::spawn_blocking(move || {
        extract::extract(&filename, content_type.as_deref(), bytes)
    })
    .await;

    let corrupt = |cause: &dyn fmt::Display| {
        warn!("Could not parse {kind} upload: {cause}");
        AppError::CorruptDocument {
            message: format!("The uploaded {kind} file could not be read"),
            details: settings.details(cause),
        }
    };

    match joined {
        Ok(Ok(content)) => Ok(content),
        Ok(Err(e @ ExtractError::CorruptDocument { .. })) => Err(corrupt(&e)),
        Ok(Err(e @ ExtractError::UnsupportedFormat { .. })) => {
            Err(AppError::UnsupportedFormat(e.to_string()))
        }
        Err(join_error) if join_error.is_panic() => {
            Err(corrupt(&format!("{kind} parser panicked")))
        }
        Err(join_error) => Err(AppError::Internal(join_error.into())),
    }
}
