//! In-memory results of the content generation flow.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One generated piece of content before it is given a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedLesson {
    pub topic: String,
    pub content_type: String,
    pub content: String,
}

/// Generated content for one `(subject, grade)` pair, keyed by
/// `(topic, content_type)` and kept in insertion order.
///
/// The order matters: the load balancer hands out lessons to days in exactly
/// this order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationUnit {
    pub subject: String,
    pub grade: String,
    entries: Vec<GeneratedLesson>,
}

impl GenerationUnit {
    pub fn new(subject: impl Into<String>, grade: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            grade: grade.into(),
            entries: Vec::new(),
        }
    }

    /// Record content for a `(topic, content_type)` key.
    ///
    /// Re-inserting an existing key replaces its content but keeps its
    /// original position.
    pub fn insert(
        &mut self,
        topic: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<String>,
    ) {
        let topic = topic.into();
        let content_type = content_type.into();
        let content = content.into();

        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.topic == topic && e.content_type == content_type)
        {
            existing.content = content;
            return;
        }

        self.entries.push(GeneratedLesson {
            topic,
            content_type,
            content,
        });
    }

    pub fn get(&self, topic: &str, content_type: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.topic == topic && e.content_type == content_type)
            .map(|e| e.content.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten into lessons in insertion order.
    pub fn into_lessons(self) -> Vec<GeneratedLesson> {
        self.entries
    }
}

/// Generated content of the prompt pipeline: `grade -> content_type -> content`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeContent(BTreeMap<String, BTreeMap<String, String>>);

impl GradeContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        grade: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<String>,
    ) {
        self.0
            .entry(grade.into())
            .or_default()
            .insert(content_type.into(), content.into());
    }

    pub fn get(&self, grade: &str, content_type: &str) -> Option<&str> {
        self.0
            .get(grade)
            .and_then(|by_type| by_type.get(content_type))
            .map(String::as_str)
    }

    pub fn grades(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Total number of generated items across all grades.
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
