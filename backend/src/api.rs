//! Public API surface for the planner backend.
//!
//! This file consolidates the identifier newtypes and the domain types that
//! cross the HTTP boundary. All types derive Serialize/Deserialize for JSON
//! serialization.

pub use crate::models::generation::{GeneratedLesson, GenerationUnit, GradeContent};
pub use crate::models::lesson::{DateChange, LessonPlan, NewLessonPlan};
pub use crate::scheduling::SchedulingWindow;

use serde::{Deserialize, Serialize};

/// Lesson plan identifier (database primary key).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LessonPlanId(pub i64);

/// Owner of a schedule. Every repository query is partitioned by owner.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl LessonPlanId {
    pub fn new(value: i64) -> Self {
        LessonPlanId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl OwnerId {
    pub fn new(value: impl Into<String>) -> Self {
        OwnerId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LessonPlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        OwnerId(value.to_string())
    }
}
