//! HTTP surface exercised through the router with `tower::ServiceExt::oneshot`.

#![cfg(feature = "http-server")]

mod support;

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use neo_planner::config::AppConfig;
use neo_planner::db::{LessonPlanRepository, LocalRepository};
use neo_planner::http::{create_router, AppState};
use neo_planner::llm::{AgentRole, ContentModel, ScriptedModel};
use support::new_lesson;

fn state_with(model: ScriptedModel) -> (AppState, Arc<LocalRepository>) {
    let repo = Arc::new(LocalRepository::new());
    let state = AppState::new(
        repo.clone() as Arc<dyn LessonPlanRepository>,
        Arc::new(model) as Arc<dyn ContentModel>,
        AppConfig::default(),
    );
    (state, repo)
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_list_lesson_plans() {
    let (state, repo) = state_with(ScriptedModel::new());
    repo.insert_lesson_plans(vec![
        new_lesson("t1", "2024-06-11", "b"),
        new_lesson("t1", "2024-06-10", "a"),
    ])
    .await
    .unwrap();

    let (status, body) = send(create_router(state), Method::GET, "/v1/lesson-plans/t1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["lesson_plans"][0]["topic"], "a");
    assert_eq!(body["lesson_plans"][0]["date"], "2024-06-10");
}

#[tokio::test]
async fn test_mark_holiday() {
    let (state, repo) = state_with(ScriptedModel::new());
    repo.insert_lesson_plans(vec![
        new_lesson("t1", "2024-06-08", "a"),
        new_lesson("t1", "2024-06-08", "b"),
        new_lesson("t1", "2024-06-10", "c"),
    ])
    .await
    .unwrap();

    let (status, body) = send(
        create_router(state),
        Method::PUT,
        "/v1/mark-holiday",
        Some(json!({"date": "2024-06-08", "user_id": "t1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["moved"], 3);
    assert_eq!(body["changes"][0]["new_date"], "2024-06-10");
    assert_eq!(body["changes"][2]["new_date"], "2024-06-11");
    assert_eq!(
        body["message"],
        "3 lessons moved from 2024-06-08 to next working day."
    );
}

#[tokio::test]
async fn test_mark_holiday_rejects_bad_date() {
    let (state, _) = state_with(ScriptedModel::new());
    let (status, body) = send(
        create_router(state),
        Method::PUT,
        "/v1/mark-holiday",
        Some(json!({"date": "08/06/2024", "user_id": "t1"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_push_tomorrow_and_delete() {
    let (state, repo) = state_with(ScriptedModel::new());
    let stored = repo
        .insert_lesson_plans(vec![new_lesson("t1", "2024-06-07", "friday")])
        .await
        .unwrap();
    let id = stored[0].id.value();

    let (status, body) = send(
        create_router(state.clone()),
        Method::PUT,
        &format!("/v1/lesson-plans/{}/push-tomorrow", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lesson_plan"]["date"], "2024-06-10");

    let uri = format!("/v1/lesson-plans/{}", id);
    let (status, _) = send(create_router(state.clone()), Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(create_router(state), Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_parse_and_map() {
    let model = ScriptedModel::new()
        .reply(
            AgentRole::PromptParser,
            r#"{"topic":"Plants","grade_levels":["4"],"content_types":["story"],"need_grade":false}"#,
        )
        .reply(AgentRole::Culture, r#"{"cultural_refs":["Tulsi"]}"#)
        .reply(AgentRole::Enricher, "enriched")
        .reply(AgentRole::ContentGenerator, r#"{"content":"A seed grew"}"#);
    let (state, _) = state_with(model);

    let (status, body) = send(
        create_router(state),
        Method::POST,
        "/v1/parse-and-map",
        Some(json!({"prompt": "story about plants for grade 4"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["topic"], "Plants");
    assert_eq!(body["cultural_refs"], json!(["Tulsi"]));
    assert_eq!(body["generated_content"]["4"]["story"], "A seed grew");
}

#[tokio::test]
async fn test_parse_and_map_errors() {
    let (state, _) = state_with(ScriptedModel::new());

    let (status, _) = send(
        create_router(state.clone()),
        Method::POST,
        "/v1/parse-and-map",
        Some(json!({"prompt": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // No scripted reply for the parser: the model call fails.
    let (status, body) = send(
        create_router(state),
        Method::POST,
        "/v1/parse-and-map",
        Some(json!({"prompt": "anything"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "MODEL_ERROR");
}

#[tokio::test]
async fn test_generate_lesson_plans_job() {
    let model = ScriptedModel::new()
        .always(AgentRole::Topics, r#"{"topics":["Numbers"]}"#)
        .always(AgentRole::ContentTypes, r#"{"types":["worksheet"]}"#)
        .always(AgentRole::Enricher, "enriched")
        .always(AgentRole::ContentGenerator, r#"{"content":"1 + 1"}"#);
    let (state, repo) = state_with(model);

    let (status, body) = send(
        create_router(state.clone()),
        Method::POST,
        "/v1/generate-lesson-plans",
        Some(json!({
            "user_id": "t1",
            "subjects": ["Math"],
            "grades": ["1", "2"],
            "start_date": "2024-06-01",
            "end_date": "2024-06-10",
            "saturdays_working": true,
            "second_saturday_off": true
        })),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["working_days"], 7);
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let mut job = Value::Null;
    for _ in 0..50 {
        let (_, current) = send(
            create_router(state.clone()),
            Method::GET,
            &format!("/v1/jobs/{}", job_id),
            None,
        )
        .await;
        job = current;
        if job["status"] != "running" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(job["status"], "completed");
    assert_eq!(job["kind"], "generate-lesson-plans");
    assert_eq!(job["result"]["lessons_created"], 2);
    assert_eq!(repo.len(), 2);
}

#[tokio::test]
async fn test_generate_lesson_plans_validation() {
    let (state, _) = state_with(ScriptedModel::new());

    let (status, _) = send(
        create_router(state.clone()),
        Method::POST,
        "/v1/generate-lesson-plans",
        Some(json!({
            "user_id": "t1",
            "subjects": ["Math"],
            "grades": ["1"],
            "start_date": "2024-06-10",
            "end_date": "2024-06-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        create_router(state),
        Method::POST,
        "/v1/generate-lesson-plans",
        Some(json!({
            "user_id": "t1",
            "subjects": [],
            "grades": ["1"],
            "start_date": "2024-06-01",
            "end_date": "2024-06-10"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
