//! Request, response, and error bodies for the HTTP gateway.

use crate::error::DelveError;
use crate::research::ResearchReport;
use crate::types::SearchResult;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Body of `POST /api/research`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub topic: String,
    /// Results per query. Falls back to the configured default when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i64>,
}

/// Reply to `POST /api/research`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchResponse {
    pub summary: String,
    pub subtopics: Vec<String>,
    pub search_results: Vec<SearchResult>,
    pub critique: String,
}

impl From<ResearchReport> for ResearchResponse {
    fn from(report: ResearchReport) -> Self {
        Self {
            summary: report.summary,
            subtopics: report.subtopics,
            search_results: report.search_results,
            critique: report.critique,
        }
    }
}

/// Reply to `GET /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// An error rendered as `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<DelveError> for ApiError {
    fn from(err: DelveError) -> Self {
        match err {
            DelveError::InvalidInput { message } => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
            }
            other => {
                error!(error = %other, "Research request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "detail": self.detail })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LlmError, StepError};
    use crate::research::PipelineStep;

    #[test]
    fn test_request_max_results_optional() {
        let req: ResearchRequest = serde_json::from_str(r#"{"topic": "rust"}"#).unwrap();
        assert_eq!(req.topic, "rust");
        assert!(req.max_results.is_none());

        let req: ResearchRequest =
            serde_json::from_str(r#"{"topic": "rust", "max_results": 3}"#).unwrap();
        assert_eq!(req.max_results, Some(3));
    }

    #[test]
    fn test_invalid_input_maps_to_422() {
        let err = ApiError::from(DelveError::invalid_input("topic must not be empty"));
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.detail, "topic must not be empty");
    }

    #[test]
    fn test_pipeline_failure_maps_to_500() {
        let err = ApiError::from(DelveError::pipeline(
            PipelineStep::Expand,
            StepError::from(LlmError::Timeout { timeout_secs: 120 }),
        ));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.detail.contains("expand"));
    }
}
