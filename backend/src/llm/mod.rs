//! Language-model collaborators.
//!
//! The pipeline talks to a [`ContentModel`] and a [`LocationProvider`]
//! instead of a concrete vendor SDK, so tests can swap in
//! [`ScriptedModel`] and [`StaticLocation`].

use async_trait::async_trait;
use thiserror::Error;

pub mod agents;
pub mod gemini;
pub mod location;
pub mod scripted;

pub use agents::AgentRole;
pub use gemini::GeminiModel;
pub use location::{GoogleMapsLocator, LocationProvider, StaticLocation};
pub use scripted::ScriptedModel;

/// Failures talking to a model or location service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// The request never got a response.
    #[error("Request error: {0}")]
    RequestError(String),

    /// The service answered with a non-success status.
    #[error("API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// Quota or rate limit hit (HTTP 402/429).
    #[error("Quota exceeded for {provider}")]
    QuotaExceeded { provider: String, message: Option<String> },

    /// A successful response that carried no usable payload.
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A scripted model ran out of replies for an agent.
    #[error("No scripted reply left for agent '{0}'")]
    Exhausted(&'static str),
}

impl ModelError {
    /// Whether the failure came from the remote service rather than local setup.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::RequestError(_)
                | Self::ApiError { .. }
                | Self::QuotaExceeded { .. }
                | Self::EmptyResponse(_)
        )
    }
}

/// Text and image generation used by the lesson pipeline.
#[async_trait]
pub trait ContentModel: Send + Sync {
    /// Run `prompt` through the agent's instructions and return the raw reply.
    async fn generate_text(&self, agent: AgentRole, prompt: &str) -> Result<String, ModelError>;

    /// Render `prompt` to a single JPEG, returned as a `data:` URL.
    async fn generate_image(&self, prompt: &str) -> Result<String, ModelError>;
}
