//! Repository trait for lesson plan storage.
//!
//! Implementations (in-memory, Postgres) are swapped via dependency
//! injection; the HTTP layer and services only ever see
//! `Arc<dyn LessonPlanRepository>`.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::api::{DateChange, LessonPlan, LessonPlanId, NewLessonPlan, OwnerId};

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Storage operations needed by the scheduling flows.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` so one handle can be shared by all
/// request handlers and background jobs.
///
/// # Ordering
/// Every method returning several lesson plans returns them sorted by
/// `(date, id)`.
#[async_trait]
pub trait LessonPlanRepository: Send + Sync {
    /// Check if the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Store new lesson plans, assigning ids. Returned in input order.
    async fn insert_lesson_plans(
        &self,
        plans: Vec<NewLessonPlan>,
    ) -> RepositoryResult<Vec<LessonPlan>>;

    async fn get_lesson_plan(&self, id: LessonPlanId) -> RepositoryResult<LessonPlan>;

    /// All lesson plans of one owner.
    async fn list_lesson_plans(&self, owner: &OwnerId) -> RepositoryResult<Vec<LessonPlan>>;

    /// Lesson plans of `owner` dated on or after `from`.
    async fn fetch_lessons_from(
        &self,
        owner: &OwnerId,
        from: NaiveDate,
    ) -> RepositoryResult<Vec<LessonPlan>>;

    /// Apply a batch of date moves atomically.
    ///
    /// Either every change is applied or none is; an unknown id fails the
    /// whole batch with `NotFound`. Returns the number of rows moved.
    async fn apply_date_changes(&self, changes: &[DateChange]) -> RepositoryResult<usize>;

    /// Fetch the owner's lessons from `holiday` on, compute the holiday
    /// cascade and apply it, all without letting another writer interleave.
    async fn shift_for_holiday(
        &self,
        owner: &OwnerId,
        holiday: NaiveDate,
    ) -> RepositoryResult<Vec<DateChange>>;

    /// Move a single lesson plan.
    async fn update_lesson_date(
        &self,
        id: LessonPlanId,
        date: NaiveDate,
    ) -> RepositoryResult<LessonPlan>;

    async fn delete_lesson_plan(&self, id: LessonPlanId) -> RepositoryResult<()>;
}
