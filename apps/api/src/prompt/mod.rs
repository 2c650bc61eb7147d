//! Prompt Assembler: persona, caller context and document content, in that order.
//!
//! The model weighs later parts as the subject under analysis and earlier parts
//! as framing, so the ordering is part of the contract.

use std::str::FromStr;

use bytes::Bytes;

use crate::extract::NormalizedContent;

pub mod persona;

pub const DEFAULT_BUSINESS_CONTEXT: &str = "No context provided";
pub const DEFAULT_CLIENT_LOCATION: &str = "Not specified";

/// Which shape of answer the persona asks the model for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputContract {
    #[default]
    Json,
    Text,
}

impl OutputContract {
    pub fn persona(self) -> &'static str {
        match self {
            OutputContract::Json => persona::AUDITOR_JSON_PERSONA,
            OutputContract::Text => persona::AUDITOR_TEXT_PERSONA,
        }
    }
}

impl FromStr for OutputContract {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputContract::Json),
            "text" => Ok(OutputContract::Text),
            other => Err(format!("unknown output contract '{other}' (expected json or text)")),
        }
    }
}

/// Free-text fields supplied with the upload. No validation beyond presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    pub business_context: String,
    pub client_location: String,
}

impl AuditContext {
    /// Absent or blank fields fall back to their placeholders.
    pub fn new(business_context: Option<String>, client_location: Option<String>) -> Self {
        Self {
            business_context: non_blank(business_context)
                .unwrap_or_else(|| DEFAULT_BUSINESS_CONTEXT.to_string()),
            client_location: non_blank(client_location)
                .unwrap_or_else(|| DEFAULT_CLIENT_LOCATION.to_string()),
        }
    }
}

impl Default for AuditContext {
    fn default() -> Self {
        Self::new(None, None)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    Text(String),
    Image { bytes: Bytes, mime_type: String },
}

/// Ordered request payload for the model gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrompt {
    pub parts: Vec<PromptPart>,
    pub contract: OutputContract,
}

impl ModelPrompt {
    /// All text parts joined with blank lines. Images are skipped.
    #[cfg(test)]
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                PromptPart::Text(t) => Some(t.as_str()),
                PromptPart::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn has_image(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, PromptPart::Image { .. }))
    }
}

/// Builds the prompt. Pure; cannot fail.
pub fn assemble(
    persona: &str,
    context: &AuditContext,
    content: NormalizedContent,
    contract: OutputContract,
) -> ModelPrompt {
    let mut parts = vec![
        PromptPart::Text(persona.trim().to_string()),
        PromptPart::Text(format!(
            "{}\n{}\n\n{}\n{}",
            persona::CONTEXT_HEADER,
            context.business_context,
            persona::LOCATION_HEADER,
            context.client_location
        )),
    ];

    match content {
        NormalizedContent::Text(body) => parts.push(PromptPart::Text(format!(
            "{}\n{}",
            persona::TEXT_DOCUMENT_HEADER,
            body
        ))),
        NormalizedContent::Image { bytes, mime_type } => {
            parts.push(PromptPart::Text(persona::IMAGE_DOCUMENT_HEADER.to_string()));
            parts.push(PromptPart::Image { bytes, mime_type });
        }
    }

    ModelPrompt { parts, contract }
}
