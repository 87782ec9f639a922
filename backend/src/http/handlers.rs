//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;

use super::dto::{
    DeleteResponse, GenerateLessonPlansRequest, GenerateLessonPlansResponse, HealthResponse,
    HolidayRequest, HolidayResponse, JobStatusResponse, LessonPlanListResponse,
    LessonPlanResponse, PromptRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{LessonPlanId, OwnerId};
use crate::db::services as db_services;
use crate::models::parse_date;
use crate::services::{dispatch, pipeline, PipelineResult};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Lesson plans
// =============================================================================

/// GET /v1/lesson-plans/{owner_id}
pub async fn list_lesson_plans(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> HandlerResult<LessonPlanListResponse> {
    let owner = OwnerId::new(owner_id);
    let lesson_plans = db_services::list_lesson_plans(state.repository.as_ref(), &owner).await?;
    let total = lesson_plans.len();

    Ok(Json(LessonPlanListResponse {
        lesson_plans,
        total,
    }))
}

/// DELETE /v1/lesson-plans/{lesson_id}
pub async fn delete_lesson_plan(
    State(state): State<AppState>,
    Path(lesson_id): Path<i64>,
) -> HandlerResult<DeleteResponse> {
    db_services::delete_lesson_plan(state.repository.as_ref(), LessonPlanId::new(lesson_id))
        .await?;

    Ok(Json(DeleteResponse {
        deleted: lesson_id,
        message: format!("Lesson {} deleted", lesson_id),
    }))
}

/// PUT /v1/lesson-plans/{lesson_id}/push-tomorrow
///
/// Moves a single lesson to the next weekday; other lessons stay put.
pub async fn push_tomorrow(
    State(state): State<AppState>,
    Path(lesson_id): Path<i64>,
) -> HandlerResult<LessonPlanResponse> {
    let lesson_plan =
        db_services::push_lesson_forward(state.repository.as_ref(), LessonPlanId::new(lesson_id))
            .await?;

    Ok(Json(LessonPlanResponse {
        message: format!("Lesson {} moved to {}", lesson_id, lesson_plan.date),
        lesson_plan,
    }))
}

/// PUT /v1/mark-holiday
pub async fn mark_holiday(
    State(state): State<AppState>,
    Json(request): Json<HolidayRequest>,
) -> HandlerResult<HolidayResponse> {
    let holiday = parse_date(&request.date)?;
    let outcome =
        db_services::mark_holiday(state.repository.as_ref(), &request.user_id, holiday).await?;

    Ok(Json(HolidayResponse {
        message: format!(
            "{} lessons moved from {} to next working day.",
            outcome.moved, holiday
        ),
        moved: outcome.moved,
        changes: outcome.changes,
    }))
}

// =============================================================================
// Generation
// =============================================================================

/// POST /v1/parse-and-map
///
/// Runs the whole prompt chain inline and returns the generated content.
pub async fn parse_and_map(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> HandlerResult<PipelineResult> {
    let result = pipeline::parse_and_map(
        state.model.as_ref(),
        state.location.as_ref(),
        &state.config,
        &request.prompt,
    )
    .await?;

    Ok(Json(result))
}

/// POST /v1/generate-lesson-plans
///
/// Validates the window and starts a background generation job.
pub async fn generate_lesson_plans(
    State(state): State<AppState>,
    Json(request): Json<GenerateLessonPlansRequest>,
) -> Result<(StatusCode, Json<GenerateLessonPlansResponse>), AppError> {
    let request = request.into_generation_request()?;
    if request.subjects.is_empty() || request.grades.is_empty() {
        return Err(AppError::BadRequest(
            "at least one subject and one grade are required".to_string(),
        ));
    }
    let working_days = request.window.working_days().len();

    let job_id = state.job_tracker.create_job(dispatch::JOB_KIND);
    let response_job_id = job_id.clone();

    let model = state.model.clone();
    let repo = state.repository.clone();
    let tracker = state.job_tracker.clone();
    tokio::spawn(async move {
        let _ = dispatch::dispatch_generation(request, model, repo, tracker, job_id).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(GenerateLessonPlansResponse {
            message: format!(
                "Lesson plan generation started. Track progress at /v1/jobs/{}/logs",
                response_job_id
            ),
            job_id: response_job_id,
            working_days,
        }),
    ))
}

// =============================================================================
// Async Job Management
// =============================================================================

/// GET /v1/jobs/{job_id}
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> HandlerResult<JobStatusResponse> {
    let job = state
        .job_tracker
        .get_job(&job_id)
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job_id)))?;

    Ok(Json(JobStatusResponse {
        status: serde_json::to_value(job.status)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_default(),
        job_id: job.job_id,
        kind: job.kind,
        logs: job.logs,
        result: job.result,
    }))
}

/// GET /v1/jobs/{job_id}/logs
///
/// Stream job logs via Server-Sent Events (SSE).
pub async fn stream_job_logs(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if state.job_tracker.get_job(&job_id).is_none() {
        return Err(AppError::NotFound(format!("Job {} not found", job_id)));
    }

    let tracker = state.job_tracker.clone();
    let stream = async_stream::stream! {
        let mut sent = 0;
        while let Some((fresh, finished)) = tracker.logs_since(&job_id, sent) {
            sent += fresh.len();
            for entry in fresh {
                let event_data = serde_json::to_string(&entry).unwrap_or_default();
                yield Ok(Event::default().data(event_data));
            }

            if finished {
                if let Some(job) = tracker.get_job(&job_id) {
                    let final_event = serde_json::json!({
                        "status": job.status,
                        "result": job.result,
                    });
                    yield Ok(Event::default()
                        .event("complete")
                        .data(serde_json::to_string(&final_event).unwrap_or_default()));
                }
                break;
            }

            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive"),
    ))
}
