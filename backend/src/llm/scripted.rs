//! Canned-reply model for tests and offline runs.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{AgentRole, ContentModel, ModelError};

/// Replays queued replies per agent, in order.
///
/// An agent can also be given a fallback reply that is returned whenever
/// its queue is empty. Every prompt is recorded for later inspection.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: Mutex<HashMap<AgentRole, VecDeque<Result<String, ModelError>>>>,
    fallbacks: Mutex<HashMap<AgentRole, String>>,
    images: Mutex<VecDeque<Result<String, ModelError>>>,
    prompts: Mutex<Vec<(AgentRole, String)>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `agent`.
    pub fn reply(self, agent: AgentRole, text: impl Into<String>) -> Self {
        self.replies
            .lock()
            .entry(agent)
            .or_default()
            .push_back(Ok(text.into()));
        self
    }

    /// Queue a failure for `agent`.
    pub fn fail(self, agent: AgentRole, error: ModelError) -> Self {
        self.replies
            .lock()
            .entry(agent)
            .or_default()
            .push_back(Err(error));
        self
    }

    /// Reply returned once the queue for `agent` is drained.
    pub fn always(self, agent: AgentRole, text: impl Into<String>) -> Self {
        self.fallbacks.lock().insert(agent, text.into());
        self
    }

    pub fn image(self, data_url: impl Into<String>) -> Self {
        self.images.lock().push_back(Ok(data_url.into()));
        self
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<(AgentRole, String)> {
        self.prompts.lock().clone()
    }

    pub fn prompts_for(&self, agent: AgentRole) -> Vec<String> {
        self.prompts
            .lock()
            .iter()
            .filter(|(a, _)| *a == agent)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl ContentModel for ScriptedModel {
    async fn generate_text(&self, agent: AgentRole, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().push((agent, prompt.to_string()));

        if let Some(next) = self.replies.lock().get_mut(&agent).and_then(VecDeque::pop_front) {
            return next;
        }
        self.fallbacks
            .lock()
            .get(&agent)
            .cloned()
            .ok_or(ModelError::Exhausted(agent.name()))
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts
            .lock()
            .push((AgentRole::ContentGenerator, format!("[image] {}", prompt)));
        self.images
            .lock()
            .pop_front()
            .unwrap_or(Err(ModelError::Exhausted("image")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_then_fallback() {
        let model = ScriptedModel::new()
            .reply(AgentRole::Topics, "first")
            .reply(AgentRole::Topics, "second")
            .always(AgentRole::Topics, "again");

        assert_eq!(model.generate_text(AgentRole::Topics, "a").await.unwrap(), "first");
        assert_eq!(model.generate_text(AgentRole::Topics, "b").await.unwrap(), "second");
        assert_eq!(model.generate_text(AgentRole::Topics, "c").await.unwrap(), "again");
        assert_eq!(model.prompts_for(AgentRole::Topics), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_exhausted_agent() {
        let model = ScriptedModel::new();
        let err = model.generate_text(AgentRole::Culture, "x").await.unwrap_err();
        assert_eq!(err, ModelError::Exhausted("culture_agent"));
        assert!(model.generate_image("x").await.is_err());
    }

    #[tokio::test]
    async fn test_queued_failure() {
        let model = ScriptedModel::new()
            .fail(AgentRole::Enricher, ModelError::RequestError("down".into()))
            .always(AgentRole::Enricher, "ok");

        assert!(model.generate_text(AgentRole::Enricher, "x").await.is_err());
        assert_eq!(model.generate_text(AgentRole::Enricher, "x").await.unwrap(), "ok");
    }
}
