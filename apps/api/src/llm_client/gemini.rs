//! Gemini `generateContent` client and startup model resolution.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{GatewayError, ModelGateway};
use crate::prompt::{ModelPrompt, OutputContract, PromptPart};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
/// Used when no preference list is configured at all.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const API_KEY_HEADER: &str = "x-goog-api-key";
const GENERATE_METHOD: &str = "generateContent";

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Gateway backed by the Gemini REST API. One model per process, chosen at startup.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Models available to this credential that support `generateContent`,
    /// without the `models/` prefix.
    pub async fn list_models(&self) -> Result<Vec<String>, GatewayError> {
        let response = self
            .client
            .get(format!("{}/v1beta/models", self.base_url))
            .query(&[("pageSize", "1000")])
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let response = Self::check_status(response).await?;
        let listing: ListModelsResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        Ok(listing
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == GENERATE_METHOD)
            })
            .map(|m| {
                m.name
                    .strip_prefix("models/")
                    .map(str::to_owned)
                    .unwrap_or(m.name)
            })
            .collect())
    }

    /// Probes the model listing once and returns the first preferred model that
    /// is available. Falls back to the first preference when the probe fails or
    /// nothing matches.
    pub async fn resolve_model(&self, preferences: &[String]) -> String {
        let fallback = preferences
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        match self.list_models().await {
            Ok(available) => match pick_model(&available, preferences) {
                Some(model) => {
                    info!("Resolved model '{model}' from {} available", available.len());
                    model
                }
                None => {
                    warn!(
                        "None of the preferred models {:?} are available, falling back to '{fallback}'",
                        preferences
                    );
                    fallback
                }
            },
            Err(e) => {
                warn!("Model listing failed ({e}), falling back to '{fallback}'");
                fallback
            }
        }
    }

    fn map_transport(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.timeout)
        } else {
            GatewayError::Http(e)
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        Err(GatewayError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ModelGateway for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    /// Single attempt, no retries: failures are surfaced to the caller.
    async fn generate(&self, prompt: &ModelPrompt) -> Result<String, GatewayError> {
        let request_body = build_request(prompt);
        debug!(
            "Calling model '{}' ({} parts, image: {})",
            self.model,
            prompt.parts.len(),
            prompt.has_image()
        );

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:{GENERATE_METHOD}",
                self.base_url, self.model
            ))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let response = Self::check_status(response).await?;
        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        if let Some(usage) = &body.usage_metadata {
            debug!(
                "Gateway call succeeded: prompt_tokens={:?}, output_tokens={:?}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        body.text().ok_or_else(|| {
            let block_reason = body
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.as_deref());
            let finish_reason = body
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref());
            warn!(
                "Model returned no text (block_reason={:?}, finish_reason={:?})",
                block_reason, finish_reason
            );
            GatewayError::EmptyResponse
        })
    }
}

fn build_request(prompt: &ModelPrompt) -> GenerateContentRequest<'_> {
    let parts = prompt
        .parts
        .iter()
        .map(|part| match part {
            PromptPart::Text(text) => RequestPart::Text { text },
            PromptPart::Image { bytes, mime_type } => RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type,
                    data: STANDARD.encode(bytes),
                },
            },
        })
        .collect();

    let generation_config = match prompt.contract {
        OutputContract::Json => Some(GenerationConfig {
            response_mime_type: "application/json",
        }),
        OutputContract::Text => None,
    };

    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts,
        }],
        generation_config,
    }
}

/// First entry of `preferences` present in `available`. Preference order wins
/// over listing order.
fn pick_model(available: &[String], preferences: &[String]) -> Option<String> {
    preferences
        .iter()
        .find(|wanted| available.iter().any(|m| m == *wanted))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new("test-key".into(), server.uri(), Duration::from_secs(5))
            .unwrap()
            .with_model("gemini-test")
    }

    fn prompt(contract: OutputContract) -> ModelPrompt {
        ModelPrompt {
            parts: vec![PromptPart::Text("persona".into()), PromptPart::Text("doc".into())],
            contract,
        }
    }

    fn prefs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pick_model_honours_preference_order() {
        let available = prefs(&["gemini-1.5-flash", "gemini-2.0-flash"]);
        let preferences = prefs(&["gemini-2.5-flash", "gemini-2.0-flash", "gemini-1.5-flash"]);
        assert_eq!(
            pick_model(&available, &preferences).as_deref(),
            Some("gemini-2.0-flash")
        );
        assert_eq!(pick_model(&available, &prefs(&["other"])), None);
    }

    #[test]
    fn test_request_encodes_image_as_inline_data() {
        let prompt = ModelPrompt {
            parts: vec![
                PromptPart::Text("persona".into()),
                PromptPart::Image {
                    bytes: Bytes::from_static(b"abc"),
                    mime_type: "image/png".into(),
                },
            ],
            contract: OutputContract::Text,
        };
        let value = serde_json::to_value(build_request(&prompt)).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"text": "persona"},
                        {"inlineData": {"mimeType": "image/png", "data": "YWJj"}}
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_json_contract_requests_json_mime_type() {
        let value = serde_json::to_value(build_request(&prompt(OutputContract::Json))).unwrap();
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_generate_returns_concatenated_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{"role": "user"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "{\"verdict\":"}, {"text": "\"padded\"}"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server)
            .generate(&prompt(OutputContract::Json))
            .await
            .unwrap();
        assert_eq!(text, "{\"verdict\":\"padded\"}");
    }

    #[tokio::test]
    async fn test_generate_maps_api_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .generate(&prompt(OutputContract::Text))
            .await
            .unwrap_err();
        match err {
            GatewayError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Quota exceeded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_blocked_prompt_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .generate(&prompt(OutputContract::Text))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_resolve_model_picks_first_available_preference() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    {"name": "models/gemini-1.5-flash", "supportedGenerationMethods": ["generateContent"]},
                    {"name": "models/gemini-2.0-flash", "supportedGenerationMethods": ["generateContent", "countTokens"]},
                    {"name": "models/gemini-2.5-flash", "supportedGenerationMethods": ["embedContent"]}
                ]
            })))
            .mount(&server)
            .await;

        let model = client(&server)
            .resolve_model(&prefs(&["gemini-2.5-flash", "gemini-2.0-flash", "gemini-1.5-flash"]))
            .await;
        assert_eq!(model, "gemini-2.0-flash");
    }

    #[tokio::test]
    async fn test_resolve_model_falls_back_when_listing_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let model = client(&server)
            .resolve_model(&prefs(&["gemini-2.5-flash", "gemini-1.5-flash"]))
            .await;
        assert_eq!(model, "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn test_resolve_model_falls_back_when_nothing_matches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
            .mount(&server)
            .await;

        let model = client(&server).resolve_model(&[]).await;
        assert_eq!(model, DEFAULT_MODEL);
    }
}
