//! The prompt chain behind `parse-and-map`.
//!
//! ```text
//! prompt ─► prompt_parser ─► culture_agent ─► [mapper_agent] ─► per grade × type:
//!                                                               enricher_agent ─► generate_content
//! ```
//!
//! Only model failures and an unreadable parser reply abort the chain.
//! Anything else that cannot be parsed falls back to a default and the chain
//! keeps going.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::GradeContent;
use crate::config::AppConfig;
use crate::extraction::{extract_content, extract_list, extract_object, ExtractionError};
use crate::llm::{AgentRole, ContentModel, LocationProvider, ModelError};

/// Content type that is rendered as an image instead of text.
pub const DIAGRAM: &str = "diagram";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("prompt must not be empty")]
    EmptyPrompt,

    /// The prompt parser's reply could not be read; nothing downstream can run.
    #[error("could not analyse prompt: {0}")]
    Analysis(#[source] ExtractionError),

    #[error("{agent} failed: {source}")]
    Model {
        agent: AgentRole,
        #[source]
        source: ModelError,
    },
}

impl PipelineError {
    fn model(agent: AgentRole) -> impl FnOnce(ModelError) -> Self {
        move |source| PipelineError::Model { agent, source }
    }
}

/// What the prompt parser understood from the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptAnalysis {
    pub topic: String,
    #[serde(default, deserialize_with = "lenient_grades")]
    pub grade_levels: Option<Vec<String>>,
    #[serde(default)]
    pub content_types: Vec<String>,
    #[serde(default)]
    pub need_grade: bool,
}

/// Grades come back as `["5"]` or `[5]` depending on the model's mood.
fn lenient_grades<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|values| {
        values
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s.trim().to_string()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect()
    }))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineResult {
    pub topic: String,
    pub grade_levels: Vec<String>,
    pub content_types: Vec<String>,
    pub cultural_refs: Vec<String>,
    pub generated_content: GradeContent,
}

/// `"Story: with a moral"` -> `"story"`.
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(':')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Generate one item of content. Never fails: a model error is logged and
/// yields an empty string so the rest of a batch can proceed.
pub async fn generate_content(
    model: &dyn ContentModel,
    grade: &str,
    content_type: &str,
    prompt: &str,
) -> String {
    let kind = normalize_content_type(content_type);

    let generated = if kind == DIAGRAM {
        model.generate_image(prompt).await
    } else {
        model
            .generate_text(AgentRole::ContentGenerator, prompt)
            .await
            .map(|raw| extract_content(&raw))
    };

    match generated {
        Ok(content) => {
            debug!(grade, content_type = %kind, len = content.len(), "content generated");
            content
        }
        Err(e) => {
            warn!(grade, content_type = %kind, error = %e, "content generation failed");
            String::new()
        }
    }
}

pub fn culture_prompt(location: &str, topic: &str) -> String {
    format!(
        "For the location of :{} stick to this for the google search for the topic:{}",
        location, topic
    )
}

pub fn mapping_prompt(cultural_refs: &[String], prompt: &str) -> String {
    let refs = serde_json::to_string(cultural_refs).unwrap_or_else(|_| "[]".to_string());
    format!("Culture_refs:{},\nUser query:{}", refs, prompt)
}

pub fn enrichment_prompt(grade: &str, mapping_prompt: &str, content_type: &str) -> String {
    format!(
        "Grade Level:{}\n{}\nContent Type:{}",
        grade, mapping_prompt, content_type
    )
}

/// Run the whole chain for one free-text request.
pub async fn parse_and_map(
    model: &dyn ContentModel,
    location: &dyn LocationProvider,
    config: &AppConfig,
    prompt: &str,
) -> Result<PipelineResult, PipelineError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(PipelineError::EmptyPrompt);
    }

    let raw = model
        .generate_text(AgentRole::PromptParser, prompt)
        .await
        .map_err(PipelineError::model(AgentRole::PromptParser))?;
    let analysis: PromptAnalysis = extract_object(&raw).map_err(PipelineError::Analysis)?;
    info!(topic = %analysis.topic, need_grade = analysis.need_grade, "prompt analysed");

    let place = match location.locate().await {
        Ok(place) => place,
        Err(e) => {
            warn!(error = %e, fallback = %config.fallback_location, "location lookup failed");
            config.fallback_location.clone()
        }
    };

    let raw = model
        .generate_text(AgentRole::Culture, &culture_prompt(&place, &analysis.topic))
        .await
        .map_err(PipelineError::model(AgentRole::Culture))?;
    let cultural_refs = extract_list(&raw, "cultural_refs").unwrap_or_else(|e| {
        warn!(error = %e, "no cultural references in reply");
        Vec::new()
    });

    let mapping = mapping_prompt(&cultural_refs, prompt);
    let parsed_grades = analysis.grade_levels.clone().unwrap_or_default();

    let grade_levels = if analysis.need_grade || parsed_grades.is_empty() {
        let raw = model
            .generate_text(AgentRole::GradeMapper, &mapping)
            .await
            .map_err(PipelineError::model(AgentRole::GradeMapper))?;
        match extract_list(&raw, "grade_levels") {
            Ok(grades) if !grades.is_empty() => grades,
            outcome => {
                if let Err(e) = outcome {
                    warn!(error = %e, "grade mapper reply unreadable");
                }
                if parsed_grades.is_empty() {
                    config.default_grades.clone()
                } else {
                    parsed_grades
                }
            }
        }
    } else {
        parsed_grades
    };

    let mut generated_content = GradeContent::new();
    for grade in &grade_levels {
        for content_type in &analysis.content_types {
            let enriched = model
                .generate_text(
                    AgentRole::Enricher,
                    &enrichment_prompt(grade, &mapping, content_type),
                )
                .await
                .map_err(PipelineError::model(AgentRole::Enricher))?;
            let content = generate_content(model, grade, content_type, &enriched).await;
            generated_content.insert(grade.as_str(), content_type.as_str(), content);
        }
    }

    info!(
        topic = %analysis.topic,
        grades = grade_levels.len(),
        items = generated_content.len(),
        "prompt pipeline finished"
    );

    Ok(PipelineResult {
        topic: analysis.topic,
        grade_levels,
        content_types: analysis.content_types,
        cultural_refs,
        generated_content,
    })
}
