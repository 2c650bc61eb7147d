use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw upload, alive for one request only.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// One line of the estimate the model commented on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemFinding {
    pub item: String,
    pub quoted: Option<String>,
    pub assessment: String,
    pub fair_estimate: Option<String>,
}

/// Structured verdict produced under the JSON contract.
///
/// `risk_radar` order: over-engineering, hourly padding, technology relevance,
/// vendor lock-in, scope creep. Each 0–10.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub verdict: String,
    pub top_red_flag: String,
    #[serde(default)]
    pub risk_radar: Vec<f32>,
    #[serde(default)]
    pub line_items: Vec<LineItemFinding>,
    #[serde(default)]
    pub stack_assessment: String,
    #[serde(default)]
    pub cheaper_alternatives: Vec<String>,
    #[serde(default)]
    pub ideal_contractor: String,
    #[serde(default)]
    pub negotiation_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AuditResult {
    Structured(AuditReport),
    Text(String),
}

/// Success envelope for `POST /audit`.
#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub status: &'static str,
    pub audit_id: Uuid,
    pub model: String,
    pub audit: AuditResult,
}

impl AuditResponse {
    pub fn success(audit_id: Uuid, model: String, audit: AuditResult) -> Self {
        Self {
            status: "success",
            audit_id,
            model,
            audit,
        }
    }
}
