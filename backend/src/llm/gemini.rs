//! Google Generative Language API client.
//!
//! Text goes through `models/{model}:generateContent`; images through the
//! Imagen `models/{model}:predict` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{AgentRole, ContentModel, ModelError};
use crate::config::LlmSettings;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_SEARCH_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-preview-06-06";

/// Gemini-backed [`ContentModel`].
#[derive(Debug, Clone)]
pub struct GeminiModel {
    api_key: String,
    base_url: String,
    /// Model for every agent that does not search.
    text_model: String,
    /// Model for the search-grounded culture agent.
    search_model: String,
    image_model: String,
    client: Client,
}

impl GeminiModel {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            search_model: DEFAULT_SEARCH_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            client: Client::new(),
        }
    }

    /// Build from settings; fails when no API key is configured.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, ModelError> {
        let api_key = settings.api_key.clone().ok_or_else(|| {
            ModelError::ConfigurationError(
                "GEMINI_API_KEY or GOOGLE_API_KEY environment variable not set".to_string(),
            )
        })?;

        Ok(Self::with_api_key(api_key)
            .with_base_url(&settings.base_url)
            .with_text_model(&settings.text_model)
            .with_search_model(&settings.search_model)
            .with_image_model(&settings.image_model))
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_text_model(mut self, model: &str) -> Self {
        self.text_model = model.to_string();
        self
    }

    pub fn with_search_model(mut self, model: &str) -> Self {
        self.search_model = model.to_string();
        self
    }

    pub fn with_image_model(mut self, model: &str) -> Self {
        self.image_model = model.to_string();
        self
    }

    fn model_for(&self, agent: AgentRole) -> &str {
        if agent.uses_search() {
            &self.search_model
        } else {
            &self.text_model
        }
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.base_url, model, method, self.api_key
        )
    }

    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<R, ModelError> {
        let response = self.client.post(url).json(body).send().await.map_err(|e| {
            error!(error = %e, "Failed to send request to Gemini API");
            ModelError::RequestError(format!("Network error: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Gemini API returned error status");

            if status.as_u16() == 402 || status.as_u16() == 429 {
                return Err(ModelError::QuotaExceeded {
                    provider: "gemini".to_string(),
                    message: Some(error_text),
                });
            }
            return Err(ModelError::ApiError {
                status: status.as_u16(),
                body: error_text,
            });
        }

        response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Gemini API response");
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })
    }
}

#[async_trait]
impl ContentModel for GeminiModel {
    async fn generate_text(&self, agent: AgentRole, prompt: &str) -> Result<String, ModelError> {
        let model = self.model_for(agent);
        debug!(model_id = %model, %agent, prompt_len = prompt.len(), "GeminiModel generating text");

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: agent.instruction().to_string(),
                }],
            },
            // The API rejects a JSON mime type together with tools.
            tools: agent
                .uses_search()
                .then(|| vec![Tool {
                    google_search: serde_json::Map::new(),
                }]),
            generation_config: agent.expects_json().then(|| GenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
        };

        let response: GenerateResponse = self
            .post_json(&self.endpoint(model, "generateContent"), &request)
            .await?;

        // Search-grounded replies can arrive split over several parts.
        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            error!(%agent, "No content in Gemini API response");
            return Err(ModelError::EmptyResponse(format!(
                "no text returned for {}",
                agent
            )));
        }
        Ok(text)
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, ModelError> {
        debug!(model_id = %self.image_model, prompt_len = prompt.len(), "GeminiModel generating image");

        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: "1:1".to_string(),
                person_generation: "allow_adult".to_string(),
                output_options: OutputOptions {
                    mime_type: "image/jpeg".to_string(),
                },
            },
        };

        let response: PredictResponse = self
            .post_json(&self.endpoint(&self.image_model, "predict"), &request)
            .await?;

        let image = response
            .predictions
            .into_iter()
            .find(|p| !p.bytes_base64_encoded.is_empty())
            .ok_or_else(|| ModelError::EmptyResponse("No images generated.".to_string()))?;

        let mime = image.mime_type.as_deref().unwrap_or("image/jpeg");
        Ok(format!("data:{};base64,{}", mime, image.bytes_base64_encoded))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    system_instruction: SystemInstruction,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: String,
    person_generation: String,
    output_options: OutputOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputOptions {
    mime_type: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: String,
    mime_type: Option<String>,
}
