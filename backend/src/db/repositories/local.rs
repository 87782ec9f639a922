//! In-memory local repository implementation.
//!
//! Suitable for unit tests and local development: all data lives in a
//! `BTreeMap` behind one `parking_lot::RwLock`, so a batch of date moves is
//! applied under a single write lock and is never observed half-done.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;

use crate::api::{DateChange, LessonPlan, LessonPlanId, NewLessonPlan, OwnerId};
use crate::db::repository::{ErrorContext, LessonPlanRepository, RepositoryError, RepositoryResult};
use crate::scheduling::redistribute_for_holiday;

/// In-memory local repository.
///
/// Cloning is cheap and clones share the same data.
///
/// # Example
/// ```
/// use neo_planner::db::LocalRepository;
///
/// let repo = LocalRepository::new();
/// assert!(repo.is_empty());
/// ```
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    plans: BTreeMap<LessonPlanId, LessonPlan>,
    next_id: i64,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            plans: BTreeMap::new(),
            next_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn owner_sorted(&self, owner: &OwnerId, from: Option<NaiveDate>) -> Vec<LessonPlan> {
        let mut plans: Vec<LessonPlan> = self
            .plans
            .values()
            .filter(|p| &p.owner_id == owner)
            .filter(|p| from.map_or(true, |from| p.date >= from))
            .cloned()
            .collect();
        plans.sort_by_key(|p| (p.date, p.id));
        plans
    }

    fn apply(&mut self, changes: &[DateChange]) -> RepositoryResult<usize> {
        if let Some(missing) = changes.iter().find(|c| !self.plans.contains_key(&c.id)) {
            return Err(RepositoryError::lesson_not_found(
                "apply_date_changes",
                missing.id,
            ));
        }
        for change in changes {
            if let Some(plan) = self.plans.get_mut(&change.id) {
                plan.date = change.new_date;
            }
        }
        Ok(changes.len())
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable backend.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    pub fn len(&self) -> usize {
        self.data.read().plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_healthy(&self, operation: &str) -> RepositoryResult<()> {
        if self.data.read().is_healthy {
            Ok(())
        } else {
            Err(RepositoryError::connection_with_context(
                "local repository marked unhealthy",
                ErrorContext::new(operation),
            ))
        }
    }
}

#[async_trait]
impl LessonPlanRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn insert_lesson_plans(
        &self,
        plans: Vec<NewLessonPlan>,
    ) -> RepositoryResult<Vec<LessonPlan>> {
        self.ensure_healthy("insert_lesson_plans")?;
        let mut data = self.data.write();
        let mut stored = Vec::with_capacity(plans.len());
        for plan in plans {
            let id = LessonPlanId(data.next_id);
            data.next_id += 1;
            let plan = plan.into_lesson_plan(id);
            data.plans.insert(id, plan.clone());
            stored.push(plan);
        }
        Ok(stored)
    }

    async fn get_lesson_plan(&self, id: LessonPlanId) -> RepositoryResult<LessonPlan> {
        self.ensure_healthy("get_lesson_plan")?;
        self.data
            .read()
            .plans
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::lesson_not_found("get_lesson_plan", id))
    }

    async fn list_lesson_plans(&self, owner: &OwnerId) -> RepositoryResult<Vec<LessonPlan>> {
        self.ensure_healthy("list_lesson_plans")?;
        let data = self.data.read();
        Ok(data.owner_sorted(owner, None))
    }

    async fn fetch_lessons_from(
        &self,
        owner: &OwnerId,
        from: NaiveDate,
    ) -> RepositoryResult<Vec<LessonPlan>> {
        self.ensure_healthy("fetch_lessons_from")?;
        let data = self.data.read();
        Ok(data.owner_sorted(owner, Some(from)))
    }

    async fn apply_date_changes(&self, changes: &[DateChange]) -> RepositoryResult<usize> {
        self.ensure_healthy("apply_date_changes")?;
        self.data.write().apply(changes)
    }

    async fn shift_for_holiday(
        &self,
        owner: &OwnerId,
        holiday: NaiveDate,
    ) -> RepositoryResult<Vec<DateChange>> {
        self.ensure_healthy("shift_for_holiday")?;
        let mut data = self.data.write();
        let in_scope = data.owner_sorted(owner, Some(holiday));
        let changes = redistribute_for_holiday(holiday, &in_scope);
        data.apply(&changes)?;
        Ok(changes)
    }

    async fn update_lesson_date(
        &self,
        id: LessonPlanId,
        date: NaiveDate,
    ) -> RepositoryResult<LessonPlan> {
        self.ensure_healthy("update_lesson_date")?;
        let mut data = self.data.write();
        let plan = data
            .plans
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::lesson_not_found("update_lesson_date", id))?;
        plan.date = date;
        Ok(plan.clone())
    }

    async fn delete_lesson_plan(&self, id: LessonPlanId) -> RepositoryResult<()> {
        self.ensure_healthy("delete_lesson_plan")?;
        self.data
            .write()
            .plans
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::lesson_not_found("delete_lesson_plan", id))
    }
}
