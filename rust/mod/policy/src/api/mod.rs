pub mod policies;
pub mod upload;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use insure_core::ServiceError;

use crate::model::{StoreHalf, WriteOutcome};
use crate::service::PolicyService;

/// Shared application state.
pub type AppState = Arc<PolicyService>;

/// Build the policy API router. `max_upload_bytes` caps the `/upload` body.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .merge(policies::routes())
        .merge(upload::routes(max_upload_bytes))
        .with_state(state)
}

/// Body of a successful write.
#[derive(Debug, Serialize)]
pub struct WriteResponse {
    pub message: String,
    pub policy_id: i64,
}

/// Body of a write whose supplement half failed (HTTP 207).
#[derive(Debug, Serialize)]
pub struct PartialResponse {
    pub message: String,
    pub policy_id: i64,
    pub failed: StoreHalf,
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Render a dual-store write: 200 when both halves landed, 207 otherwise.
pub(crate) fn write_response(
    result: Result<WriteOutcome, ServiceError>,
    message: &str,
) -> Result<Response, ServiceError> {
    let response = match result? {
        WriteOutcome::Complete { policy_id } => (
            StatusCode::OK,
            Json(WriteResponse {
                message: message.to_string(),
                policy_id,
            }),
        )
            .into_response(),
        WriteOutcome::PartialSuccess {
            policy_id,
            failed,
            error,
        } => (
            StatusCode::MULTI_STATUS,
            Json(PartialResponse {
                message: format!("{message}; supplement write failed"),
                policy_id,
                failed,
                error: ErrorBody {
                    code: error.error_code(),
                    message: error.to_string(),
                },
            }),
        )
            .into_response(),
    };
    Ok(response)
}
