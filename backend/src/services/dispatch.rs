//! Bulk lesson generation for a term.
//!
//! For every `(subject, grade)` pair: list topics, pick content types per
//! topic, enrich and generate each item, then spread the unit over the
//! window's working days and store it. Runs as a background job; progress is
//! written to the [`JobTracker`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::job_tracker::JobTracker;
use super::pipeline::generate_content;
use crate::api::{GenerationUnit, OwnerId, SchedulingWindow};
use crate::db::{store_generated_lessons, LessonPlanRepository, RepositoryResult};
use crate::extraction::extract_list;
use crate::llm::{AgentRole, ContentModel};
use crate::scheduling::distribute;

pub const JOB_KIND: &str = "generate-lesson-plans";

/// A validated bulk generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub owner_id: OwnerId,
    pub subjects: Vec<String>,
    pub grades: Vec<String>,
    pub window: SchedulingWindow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub lessons_created: usize,
    pub working_days: usize,
    /// `(subject, grade)` pairs that produced at least one lesson.
    pub units: usize,
}

pub fn topics_prompt(subject: &str, grade: &str) -> String {
    format!("List lesson topics for grade {} {}", grade, subject)
}

pub fn content_types_prompt(subject: &str, grade: &str, topic: &str) -> String {
    format!(
        "Generate content types for the following Grade :{} , Subject:{} and topic being:{}",
        grade, subject, topic
    )
}

pub fn item_prompt(subject: &str, grade: &str, topic: &str, content_type: &str) -> String {
    format!(
        "For Grade level : {} , subject:{} , topic being {} and content type {}",
        grade, subject, topic, content_type
    )
}

/// Run a generation job to completion and record the outcome on `tracker`.
pub async fn dispatch_generation(
    request: GenerationRequest,
    model: Arc<dyn ContentModel>,
    repo: Arc<dyn LessonPlanRepository>,
    tracker: JobTracker,
    job_id: String,
) -> RepositoryResult<DispatchSummary> {
    let outcome = run_generation(&request, model.as_ref(), repo.as_ref(), &tracker, &job_id).await;

    match &outcome {
        Ok(summary) => {
            info!(%job_id, owner_id = %request.owner_id, lessons = summary.lessons_created, "generation job completed");
            tracker.success(
                &job_id,
                format!("Created {} lesson plans", summary.lessons_created),
            );
            tracker.complete_job(&job_id, serde_json::to_value(summary).ok());
        }
        Err(e) => {
            warn!(%job_id, owner_id = %request.owner_id, error = %e, "generation job failed");
            tracker.fail_job(&job_id, format!("Generation failed: {}", e));
        }
    }
    outcome
}

async fn run_generation(
    request: &GenerationRequest,
    model: &dyn ContentModel,
    repo: &dyn LessonPlanRepository,
    tracker: &JobTracker,
    job_id: &str,
) -> RepositoryResult<DispatchSummary> {
    let dates = request.window.working_days();
    tracker.info(
        job_id,
        format!(
            "{} working days between {} and {}",
            dates.len(),
            request.window.start_date,
            request.window.end_date
        ),
    );

    let mut summary = DispatchSummary {
        working_days: dates.len(),
        ..DispatchSummary::default()
    };
    if dates.is_empty() {
        tracker.warning(job_id, "No working days in the window; nothing to schedule");
        return Ok(summary);
    }

    for subject in &request.subjects {
        for grade in &request.grades {
            let unit = build_unit(model, tracker, job_id, subject, grade).await;
            if unit.is_empty() {
                tracker.warning(job_id, format!("No content for {} grade {}", subject, grade));
                continue;
            }

            let lessons = unit.into_lessons();
            let distribution = distribute(lessons, &dates);
            let stored =
                store_generated_lessons(repo, &request.owner_id, subject, grade, distribution)
                    .await?;

            tracker.success(
                job_id,
                format!("Stored {} lessons for {} grade {}", stored.len(), subject, grade),
            );
            summary.lessons_created += stored.len();
            summary.units += 1;
        }
    }

    Ok(summary)
}

/// Generate everything for one `(subject, grade)` pair. Failures are logged
/// to the job and skip only the affected topic or item.
async fn build_unit(
    model: &dyn ContentModel,
    tracker: &JobTracker,
    job_id: &str,
    subject: &str,
    grade: &str,
) -> GenerationUnit {
    let mut unit = GenerationUnit::new(subject, grade);

    let topics = match model
        .generate_text(AgentRole::Topics, &topics_prompt(subject, grade))
        .await
        .map_err(|e| e.to_string())
        .and_then(|raw| extract_list(&raw, "topics").map_err(|e| e.to_string()))
    {
        Ok(topics) => topics,
        Err(e) => {
            tracker.warning(job_id, format!("Topics for {} grade {} failed: {}", subject, grade, e));
            return unit;
        }
    };
    tracker.info(
        job_id,
        format!("{} topics for {} grade {}", topics.len(), subject, grade),
    );

    for topic in &topics {
        let content_types = match model
            .generate_text(
                AgentRole::ContentTypes,
                &content_types_prompt(subject, grade, topic),
            )
            .await
            .map_err(|e| e.to_string())
            .and_then(|raw| extract_list(&raw, "types").map_err(|e| e.to_string()))
        {
            Ok(types) => types,
            Err(e) => {
                tracker.warning(job_id, format!("Content types for '{}' failed: {}", topic, e));
                continue;
            }
        };

        for content_type in &content_types {
            let enriched = match model
                .generate_text(
                    AgentRole::Enricher,
                    &item_prompt(subject, grade, topic, content_type),
                )
                .await
            {
                Ok(enriched) => enriched,
                Err(e) => {
                    tracker.warning(
                        job_id,
                        format!("Enriching '{}' / {} failed: {}", topic, content_type, e),
                    );
                    continue;
                }
            };

            let content = generate_content(model, grade, content_type, &enriched).await;
            unit.insert(topic.as_str(), content_type.as_str(), content);
        }
        tracker.info(job_id, format!("Generated '{}' ({} types)", topic, content_types.len()));
    }

    unit
}
