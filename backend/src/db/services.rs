//! Service layer over [`LessonPlanRepository`].
//!
//! These functions hold the scheduling rules that sit between a request and
//! storage; handlers and background jobs call them instead of the repository
//! directly.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use super::repository::{LessonPlanRepository, RepositoryResult};
use crate::api::{DateChange, GeneratedLesson, LessonPlan, LessonPlanId, NewLessonPlan, OwnerId};
use crate::scheduling::{push_to_next_working_day, Distribution};

/// Result of marking one day as a holiday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HolidayOutcome {
    pub owner_id: OwnerId,
    pub holiday: NaiveDate,
    pub moved: usize,
    pub changes: Vec<DateChange>,
}

/// Check if the repository is reachable.
pub async fn health_check(repo: &dyn LessonPlanRepository) -> RepositoryResult<bool> {
    repo.health_check().await
}

/// The owner's lesson plans in `(date, id)` order.
pub async fn list_lesson_plans(
    repo: &dyn LessonPlanRepository,
    owner: &OwnerId,
) -> RepositoryResult<Vec<LessonPlan>> {
    repo.list_lesson_plans(owner).await
}

pub async fn delete_lesson_plan(
    repo: &dyn LessonPlanRepository,
    id: LessonPlanId,
) -> RepositoryResult<()> {
    repo.delete_lesson_plan(id).await?;
    info!(lesson_id = %id, "lesson plan deleted");
    Ok(())
}

/// Move one lesson to the next weekday without touching any other lesson.
pub async fn push_lesson_forward(
    repo: &dyn LessonPlanRepository,
    id: LessonPlanId,
) -> RepositoryResult<LessonPlan> {
    let lesson = repo.get_lesson_plan(id).await?;
    let target = push_to_next_working_day(lesson.date);
    let moved = repo.update_lesson_date(id, target).await?;
    info!(lesson_id = %id, from = %lesson.date, to = %target, "lesson pushed forward");
    Ok(moved)
}

/// Shift the owner's schedule off `holiday`.
pub async fn mark_holiday(
    repo: &dyn LessonPlanRepository,
    owner: &OwnerId,
    holiday: NaiveDate,
) -> RepositoryResult<HolidayOutcome> {
    let changes = repo
        .shift_for_holiday(owner, holiday)
        .await
        .map_err(|e| e.with_operation("mark_holiday"))?;

    info!(owner_id = %owner, %holiday, moved = changes.len(), "holiday marked");
    Ok(HolidayOutcome {
        owner_id: owner.clone(),
        holiday,
        moved: changes.len(),
        changes,
    })
}

/// Persist lessons that the load balancer already assigned to days.
pub async fn store_generated_lessons(
    repo: &dyn LessonPlanRepository,
    owner: &OwnerId,
    subject: &str,
    grade: &str,
    distribution: Distribution<GeneratedLesson>,
) -> RepositoryResult<Vec<LessonPlan>> {
    let plans: Vec<NewLessonPlan> = distribution
        .into_iter()
        .flat_map(|(date, lessons)| {
            lessons.into_iter().map(move |lesson| NewLessonPlan {
                owner_id: owner.clone(),
                date,
                subject: subject.to_string(),
                grade: grade.to_string(),
                topic: lesson.topic,
                content_type: lesson.content_type,
                content: lesson.content,
            })
        })
        .collect();

    if plans.is_empty() {
        debug!(owner_id = %owner, subject, grade, "nothing to store");
        return Ok(Vec::new());
    }

    let stored = repo.insert_lesson_plans(plans).await?;
    info!(owner_id = %owner, subject, grade, count = stored.len(), "lesson plans stored");
    Ok(stored)
}
