use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::{LessonPlanId, OwnerId};

/// One scheduled lesson for an owner.
///
/// `subject`, `grade`, `topic`, `content_type` and `content` are opaque to the
/// scheduler; only `date` is ever rewritten after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonPlan {
    pub id: LessonPlanId,
    pub owner_id: OwnerId,
    pub date: NaiveDate,
    pub subject: String,
    pub grade: String,
    #[serde(default)]
    pub topic: String,
    pub content_type: String,
    pub content: String,
}

/// A lesson plan that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLessonPlan {
    pub owner_id: OwnerId,
    pub date: NaiveDate,
    pub subject: String,
    pub grade: String,
    #[serde(default)]
    pub topic: String,
    pub content_type: String,
    pub content: String,
}

impl NewLessonPlan {
    /// Attach a repository-assigned id.
    pub fn into_lesson_plan(self, id: LessonPlanId) -> LessonPlan {
        LessonPlan {
            id,
            owner_id: self.owner_id,
            date: self.date,
            subject: self.subject,
            grade: self.grade,
            topic: self.topic,
            content_type: self.content_type,
            content: self.content,
        }
    }
}

/// A single date move produced by rescheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateChange {
    pub id: LessonPlanId,
    pub new_date: NaiveDate,
}

impl DateChange {
    pub fn new(id: LessonPlanId, new_date: NaiveDate) -> Self {
        Self { id, new_date }
    }
}
