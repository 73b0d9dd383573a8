//! The multimodal model client seam.
//!
//! The pipeline never talks HTTP directly: it calls [`VisionModel::generate`]
//! with a prompt and an image payload and gets free-form text back. The
//! production implementation is [`GeminiClient`]; tests inject a scripted
//! fake through [`crate::config::ExtractionConfig::client`] and exercise the
//! whole pipeline with no network dependency.
//!
//! Recognition quality is entirely the model's concern. Everything the crate
//! is actually about — turning the model's unreliable output into a
//! consistent record — happens after this seam.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// An image ready for a multimodal API request: raw bytes plus the declared
/// mime type. Base64 wrapping happens at the wire, not here.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl ImagePayload {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }
}

/// A multimodal model that can describe an image given a text prompt.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Send (prompt, image) to the model and return its raw text response.
    ///
    /// An empty string is a valid return value (the orchestrator treats it as
    /// an empty-response failure); `Err` is reserved for transport and API
    /// errors.
    async fn generate(&self, prompt: &str, image: &ImagePayload) -> Result<String, ExtractError>;
}

/// Resolve the model client, from most-specific to least-specific.
///
/// 1. **Pre-built client** (`config.client`) — the caller constructed and
///    configured the client entirely; used as-is. This is the test seam.
/// 2. **Explicit key** (`config.api_key`) — construct the built-in Gemini
///    client with it.
/// 3. **Environment** — `GEMINI_API_KEY`, then `GOOGLE_API_KEY`.
///
/// No key anywhere means the client is unavailable; the orchestrator reports
/// that as a failed result rather than panicking mid-request.
pub fn resolve_model(config: &ExtractionConfig) -> Result<Arc<dyn VisionModel>, ExtractError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }

    let key = config
        .api_key
        .clone()
        .or_else(|| std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()))
        .or_else(|| std::env::var("GOOGLE_API_KEY").ok().filter(|k| !k.is_empty()))
        .ok_or_else(|| ExtractError::ClientUnavailable {
            hint: "set GEMINI_API_KEY (or GOOGLE_API_KEY), or inject a client via \
                   ExtractionConfig::builder().client(...)"
                .to_string(),
        })?;

    let client = GeminiClient::new(key, config)?;
    info!(model = %config.model, "vision model client initialised");
    Ok(Arc::new(client))
}

// ── Gemini REST client ───────────────────────────────────────────────────

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Built-in [`VisionModel`] backed by the Gemini `generateContent` REST API.
///
/// The image travels inline as base64 in the request body; there is no upload
/// step. One extraction is exactly one POST.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    generation: GenerationConfig,
}

impl GeminiClient {
    /// Construct a client from an API key and the generation parameters in
    /// `config`. The per-call timeout is applied at the HTTP client level.
    pub fn new(api_key: String, config: &ExtractionConfig) -> Result<Self, ExtractError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| ExtractError::ClientUnavailable {
                hint: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: GEMINI_BASE_URL.to_string(),
            model: config.model.clone(),
            api_key,
            generation: GenerationConfig {
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                max_output_tokens: config.max_tokens,
            },
        })
    }

    /// Override the endpoint base URL (proxies, mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn generate(&self, prompt: &str, image: &ImagePayload) -> Result<String, ExtractError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: prompt.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data: STANDARD.encode(&image.data),
                        },
                    },
                ],
            }],
            generation_config: self.generation.clone(),
        };

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        debug!(model = %self.model, image_bytes = image.data.len(), "calling generateContent");

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractError::Api {
                message: format!("request failed: {e}"),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::Api {
                message: format!("HTTP {status}: {body}"),
            });
        }

        let envelope: GenerateContentResponse =
            response.json().await.map_err(|e| ExtractError::Api {
                message: format!("malformed response envelope: {e}"),
            })?;

        // Join all text parts of the first candidate; the orchestrator treats
        // an empty string as an empty-response failure.
        let text = envelope
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| match p {
                        ResponsePart::Text { text } => Some(text),
                        ResponsePart::Other(_) => None,
                    })
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        debug!(chars = text.len(), "model response received");
        Ok(text)
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponsePart {
    Text { text: String },
    // Catch-all for non-text parts (thoughts, inline data, function calls);
    // they are skipped, never a deserialization failure.
    Other(serde_json::Value),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serialises_with_camel_case_keys() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: "read this".into(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png".into(),
                            data: "aGk=".into(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: 0.1,
                top_p: 0.8,
                top_k: 40,
                max_output_tokens: 4096,
            },
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"inlineData\""));
        assert!(json.contains("\"mimeType\""));
        assert!(json.contains("\"maxOutputTokens\":4096"));
        assert!(json.contains("\"topK\":40"));
    }

    #[test]
    fn response_parses_candidate_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":1}"}]}}]}"#;
        let envelope: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.candidates.len(), 1);
    }

    #[test]
    fn non_text_parts_are_skipped_not_fatal() {
        let body = r#"{"candidates":[{"content":{"parts":[
            {"thought": true},
            {"text":"{\"a\":"},
            {"inlineData":{"mimeType":"image/png","data":"aGk="}},
            {"text":"1}"}
        ]}}]}"#;
        let envelope: GenerateContentResponse = serde_json::from_str(body).unwrap();
        let parts = &envelope.candidates[0].content.parts;
        assert_eq!(parts.len(), 4);
        let text: String = envelope.candidates[0]
            .content
            .parts
            .iter()
            .filter_map(|p| match p {
                ResponsePart::Text { text } => Some(text.as_str()),
                ResponsePart::Other(_) => None,
            })
            .collect();
        assert_eq!(text, r#"{"a":1}"#);
    }

    #[test]
    fn response_tolerates_missing_candidates() {
        let envelope: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(envelope.candidates.is_empty());
    }

    #[test]
    fn resolve_prefers_injected_client() {
        struct Nop;
        #[async_trait]
        impl VisionModel for Nop {
            async fn generate(
                &self,
                _prompt: &str,
                _image: &ImagePayload,
            ) -> Result<String, ExtractError> {
                Ok(String::new())
            }
        }

        let config = ExtractionConfig::builder()
            .client(Arc::new(Nop))
            .build()
            .unwrap();
        assert!(resolve_model(&config).is_ok());
    }
}
