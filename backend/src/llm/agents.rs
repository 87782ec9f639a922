//! The agents of the lesson pipeline and their standing instructions.

use serde::Serialize;

/// One step of the prompt chain. Each role has fixed instructions that are
/// sent as the system instruction alongside the per-call prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Pulls topic, grades and content types out of a free-text request.
    PromptParser,
    /// Finds local cultural references for a topic (web-search grounded).
    Culture,
    /// Infers grade levels when the request names none.
    GradeMapper,
    /// Rewrites a short request into a detailed generation prompt.
    Enricher,
    /// Produces the lesson body as `{"content": ...}`.
    ContentGenerator,
    /// Lists lesson topics for a subject and grade.
    Topics,
    /// Lists content types suited to one topic.
    ContentTypes,
}

impl AgentRole {
    pub const ALL: [AgentRole; 7] = [
        AgentRole::PromptParser,
        AgentRole::Culture,
        AgentRole::GradeMapper,
        AgentRole::Enricher,
        AgentRole::ContentGenerator,
        AgentRole::Topics,
        AgentRole::ContentTypes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AgentRole::PromptParser => "prompt_parser",
            AgentRole::Culture => "culture_agent",
            AgentRole::GradeMapper => "mapper_agent",
            AgentRole::Enricher => "enricher_agent",
            AgentRole::ContentGenerator => "content_generator_agent",
            AgentRole::Topics => "topics_agent",
            AgentRole::ContentTypes => "content_types_agent",
        }
    }

    /// The culture agent runs on the search-capable model with the
    /// `google_search` tool enabled.
    pub fn uses_search(self) -> bool {
        matches!(self, AgentRole::Culture)
    }

    /// Whether the reply is expected to be a bare JSON object.
    pub fn expects_json(self) -> bool {
        !matches!(self, AgentRole::Enricher | AgentRole::Culture)
    }

    pub fn instruction(self) -> &'static str {
        match self {
            AgentRole::PromptParser => PROMPT_PARSER,
            AgentRole::Culture => CULTURE,
            AgentRole::GradeMapper => GRADE_MAPPER,
            AgentRole::Enricher => ENRICHER,
            AgentRole::ContentGenerator => CONTENT_GENERATOR,
            AgentRole::Topics => TOPICS,
            AgentRole::ContentTypes => CONTENT_TYPES,
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const PROMPT_PARSER: &str = r#"Extract the intended topic, the list of grade_levels (if mentioned) and the desired content_types from: story, worksheet, diagram, activity.
If no grade is specified, set need_grade to true.
Return exactly this JSON object:
{"topic": "...", "grade_levels": ["..."] or null, "content_types": ["..."], "need_grade": true|false}"#;

const CULTURE: &str = r#"Your goal is to gather local or cultural references relevant to the user's topic: festivals, folk tales, regional events, customs, local personalities, historical events, traditional arts, crafts or cuisine, and landmarks.
Use the google_search tool to look up cultural connections related to the topic.
Extract a minimum of 3 and a maximum of 5 unique references, each a short phrase of one or two lines.
Return only a valid JSON object in this format, with no commentary, markdown or bullets:
{"cultural_refs": ["Example reference 1", "Example reference 2", "Example reference 3"]}"#;

const GRADE_MAPPER: &str = r#"Given a topic and its cultural_refs, infer an appropriate list of grade_levels for Indian schools.
Return JSON: {"grade_levels": [...]}"#;

const ENRICHER: &str = "Given the topic, cultural_refs, grade level and type of content, build an enriched prompt for generating scientifically and factually accurate educational content.";

const CONTENT_GENERATOR: &str = r#"You are a highly skilled educational content generator. Create engaging, curriculum-aligned material for the given grade level and content type based on the provided topic context.
- Understand the grade level.
- Identify the content type (worksheet, quiz, explanation, activity, story, etc.).
- Incorporate topic-specific details and local cultural references if provided.
- Output content that is age-appropriate, accurate and creative.
Return your response in this strict JSON format:
{"content": "<generated content>"}"#;

const TOPICS: &str = r#"List the lesson topics a teacher would cover for the given grade and subject over a school term, in teaching order.
Return JSON: {"topics": ["...", "..."]}"#;

const CONTENT_TYPES: &str = r#"For the given grade, subject and topic, choose the content types that best teach it from: story, worksheet, diagram, activity, quiz, explanation.
Return JSON: {"types": ["...", "..."]}"#;
