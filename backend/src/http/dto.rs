//! Data Transfer Objects for the HTTP API.
//!
//! Lesson plans themselves are serialized as [`LessonPlan`]; the types here
//! wrap them or describe request bodies.

use serde::{Deserialize, Serialize};

use crate::api::{DateChange, LessonPlan, OwnerId, SchedulingWindow};
use crate::models::FormatError;
use crate::services::job_tracker::LogEntry;
use crate::services::GenerationRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Repository connection status
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonPlanListResponse {
    pub lesson_plans: Vec<LessonPlan>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonPlanResponse {
    pub lesson_plan: LessonPlan,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: i64,
    pub message: String,
}

/// Body of `PUT /v1/mark-holiday`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolidayRequest {
    /// `YYYY-MM-DD`
    pub date: String,
    pub user_id: OwnerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolidayResponse {
    pub message: String,
    pub moved: usize,
    pub changes: Vec<DateChange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

/// Body of `POST /v1/generate-lesson-plans`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateLessonPlansRequest {
    pub user_id: OwnerId,
    pub subjects: Vec<String>,
    pub grades: Vec<String>,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub saturdays_working: bool,
    #[serde(default)]
    pub second_saturday_off: bool,
}

impl GenerateLessonPlansRequest {
    /// Validate the window; blank subjects and grades are dropped.
    pub fn into_generation_request(self) -> Result<GenerationRequest, FormatError> {
        let window = SchedulingWindow::parse(
            &self.start_date,
            &self.end_date,
            self.saturdays_working,
            self.second_saturday_off,
        )?;

        let clean = |values: Vec<String>| -> Vec<String> {
            values
                .into_iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect()
        };

        Ok(GenerationRequest {
            owner_id: self.user_id,
            subjects: clean(self.subjects),
            grades: clean(self.grades),
            window,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateLessonPlansResponse {
    pub job_id: String,
    pub working_days: usize,
    pub message: String,
}

/// Job status response for async processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub kind: String,
    pub status: String,
    pub logs: Vec<LogEntry>,
    pub result: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(start: &str, end: &str) -> GenerateLessonPlansRequest {
        GenerateLessonPlansRequest {
            user_id: OwnerId::from("t1"),
            subjects: vec![" Science ".into(), "".into()],
            grades: vec!["5".into()],
            start_date: start.into(),
            end_date: end.into(),
            saturdays_working: true,
            second_saturday_off: true,
        }
    }

    #[test]
    fn test_generation_request_conversion() {
        let req = request("2024-06-01", "2024-06-10")
            .into_generation_request()
            .unwrap();
        assert_eq!(req.subjects, vec!["Science"]);
        assert_eq!(req.window.working_days().len(), 7);
    }

    #[test]
    fn test_inverted_window_rejected() {
        assert!(matches!(
            request("2024-06-10", "2024-06-01").into_generation_request(),
            Err(FormatError::InvertedRange { .. })
        ));
        assert!(matches!(
            request("06/01/2024", "2024-06-10").into_generation_request(),
            Err(FormatError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_saturday_flags_default_to_false() {
        let body = r#"{"user_id":"t1","subjects":["Math"],"grades":["3"],
                       "start_date":"2024-06-01","end_date":"2024-06-30"}"#;
        let req: GenerateLessonPlansRequest = serde_json::from_str(body).unwrap();
        assert!(!req.saturdays_working);
        assert!(!req.second_saturday_off);
    }
}
