//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::LessonPlanRepository;
use crate::llm::{ContentModel, LocationProvider, StaticLocation};
use crate::services::JobTracker;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn LessonPlanRepository>,
    pub model: Arc<dyn ContentModel>,
    pub location: Arc<dyn LocationProvider>,
    pub job_tracker: JobTracker,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// State with a static location taken from `config`.
    pub fn new(
        repository: Arc<dyn LessonPlanRepository>,
        model: Arc<dyn ContentModel>,
        config: AppConfig,
    ) -> Self {
        let location = Arc::new(StaticLocation::new(config.fallback_location.clone()));
        Self {
            repository,
            model,
            location,
            job_tracker: JobTracker::new(),
            config: Arc::new(config),
        }
    }

    pub fn with_location(mut self, location: Arc<dyn LocationProvider>) -> Self {
        self.location = location;
        self
    }
}
