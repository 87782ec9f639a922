use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use super::schema::lesson_plans;
use crate::api::{LessonPlan, LessonPlanId, NewLessonPlan, OwnerId};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = lesson_plans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // created_at is only read by ad-hoc queries
pub struct LessonPlanRow {
    pub id: i64,
    pub owner_id: String,
    pub lesson_date: NaiveDate,
    pub subject: String,
    pub grade: String,
    pub topic: String,
    pub content_type: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<LessonPlanRow> for LessonPlan {
    fn from(row: LessonPlanRow) -> Self {
        LessonPlan {
            id: LessonPlanId(row.id),
            owner_id: OwnerId(row.owner_id),
            date: row.lesson_date,
            subject: row.subject,
            grade: row.grade,
            topic: row.topic,
            content_type: row.content_type,
            content: row.content,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = lesson_plans)]
pub struct NewLessonPlanRow {
    pub owner_id: String,
    pub lesson_date: NaiveDate,
    pub subject: String,
    pub grade: String,
    pub topic: String,
    pub content_type: String,
    pub content: String,
}

impl From<NewLessonPlan> for NewLessonPlanRow {
    fn from(plan: NewLessonPlan) -> Self {
        NewLessonPlanRow {
            owner_id: plan.owner_id.0,
            lesson_date: plan.date,
            subject: plan.subject,
            grade: plan.grade,
            topic: plan.topic,
            content_type: plan.content_type,
            content: plan.content,
        }
    }
}
