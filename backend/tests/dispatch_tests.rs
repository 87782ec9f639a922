//! Bulk generation jobs against scripted replies and the in-memory repository.

mod support;

use std::sync::Arc;

use neo_planner::api::{OwnerId, SchedulingWindow};
use neo_planner::db::{LessonPlanRepository, LocalRepository};
use neo_planner::llm::{AgentRole, ModelError, ScriptedModel};
use neo_planner::services::dispatch::JOB_KIND;
use neo_planner::services::{dispatch_generation, GenerationRequest, JobStatus, JobTracker, LogLevel};
use support::date;

fn request(grades: &[&str], start: &str, end: &str) -> GenerationRequest {
    GenerationRequest {
        owner_id: OwnerId::from("t1"),
        subjects: vec!["Science".to_string()],
        grades: grades.iter().map(|g| g.to_string()).collect(),
        window: SchedulingWindow::parse(start, end, false, false).unwrap(),
    }
}

fn scripted() -> ScriptedModel {
    ScriptedModel::new()
        .always(AgentRole::Topics, r#"{"topics": ["Plants", "Animals"]}"#)
        .always(AgentRole::ContentTypes, r#"{"types": ["story", "worksheet"]}"#)
        .always(AgentRole::Enricher, "enriched")
        .always(AgentRole::ContentGenerator, r#"{"content": "lesson body"}"#)
}

#[tokio::test]
async fn test_generation_spreads_lessons_over_working_days() {
    let model = Arc::new(scripted());
    let repo = Arc::new(LocalRepository::new());
    let tracker = JobTracker::new();
    let job_id = tracker.create_job(JOB_KIND);

    let summary = dispatch_generation(
        request(&["5"], "2024-06-03", "2024-06-07"),
        model.clone(),
        repo.clone(),
        tracker.clone(),
        job_id.clone(),
    )
    .await
    .unwrap();

    assert_eq!(summary.lessons_created, 4);
    assert_eq!(summary.working_days, 5);
    assert_eq!(summary.units, 1);

    // Four lessons over five days: one per day from the first date, in order.
    let plans = repo.list_lesson_plans(&OwnerId::from("t1")).await.unwrap();
    let placed: Vec<_> = plans
        .iter()
        .map(|p| (p.date, p.topic.as_str(), p.content_type.as_str()))
        .collect();
    assert_eq!(
        placed,
        vec![
            (date("2024-06-03"), "Plants", "story"),
            (date("2024-06-04"), "Plants", "worksheet"),
            (date("2024-06-05"), "Animals", "story"),
            (date("2024-06-06"), "Animals", "worksheet"),
        ]
    );
    assert!(plans.iter().all(|p| p.content == "lesson body"));

    let job = tracker.get_job(&job_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.result.unwrap()["lessons_created"], 4);

    assert_eq!(
        model.prompts_for(AgentRole::Topics),
        vec!["List lesson topics for grade 5 Science"]
    );
}

#[tokio::test]
async fn test_failed_topics_skip_only_that_grade() {
    let model = Arc::new(
        ScriptedModel::new()
            .fail(AgentRole::Topics, ModelError::RequestError("timeout".into()))
            .reply(AgentRole::Topics, r#"{"topics": ["Light"]}"#)
            .always(AgentRole::ContentTypes, r#"{"types": ["story"]}"#)
            .always(AgentRole::Enricher, "enriched")
            .always(AgentRole::ContentGenerator, r#"{"content": "body"}"#),
    );
    let repo = Arc::new(LocalRepository::new());
    let tracker = JobTracker::new();
    let job_id = tracker.create_job(JOB_KIND);

    let summary = dispatch_generation(
        request(&["5", "6"], "2024-06-03", "2024-06-07"),
        model,
        repo.clone(),
        tracker.clone(),
        job_id.clone(),
    )
    .await
    .unwrap();

    assert_eq!(summary.units, 1);
    let plans = repo.list_lesson_plans(&OwnerId::from("t1")).await.unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].grade, "6");

    let job = tracker.get_job(&job_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.logs.iter().any(|l| l.level == LogLevel::Warning));
}

#[tokio::test]
async fn test_repository_failure_fails_the_job() {
    let repo = Arc::new(LocalRepository::new());
    repo.set_healthy(false);
    let tracker = JobTracker::new();
    let job_id = tracker.create_job(JOB_KIND);

    let result = dispatch_generation(
        request(&["5"], "2024-06-03", "2024-06-07"),
        Arc::new(scripted()),
        repo,
        tracker.clone(),
        job_id.clone(),
    )
    .await;

    assert!(result.is_err());
    let job = tracker.get_job(&job_id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.logs.last().unwrap().level, LogLevel::Error);
}

#[tokio::test]
async fn test_window_without_working_days_skips_generation() {
    let model = Arc::new(scripted());
    let tracker = JobTracker::new();
    let job_id = tracker.create_job(JOB_KIND);

    // 2024-06-09 is a Sunday.
    let summary = dispatch_generation(
        request(&["5"], "2024-06-09", "2024-06-09"),
        model.clone(),
        Arc::new(LocalRepository::new()),
        tracker.clone(),
        job_id.clone(),
    )
    .await
    .unwrap();

    assert_eq!(summary.lessons_created, 0);
    assert_eq!(summary.working_days, 0);
    assert!(model.prompts().is_empty());
    assert_eq!(tracker.get_job(&job_id).unwrap().status, JobStatus::Completed);
}
