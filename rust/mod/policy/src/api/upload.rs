//! Tabular upload — parses a CSV or XLSX file and echoes its rows back.

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, multipart::MultipartRejection},
    http::StatusCode,
    routing::post,
    Json,
};
use serde::Serialize;
use tracing::info;

use insure_core::ServiceError;
use insure_tabular::{Record, TabularError};

use super::AppState;

/// Upload body limit used when none is configured.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new().route(
        "/upload",
        post(upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
    )
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub data: Vec<Record>,
}

fn multipart_err(status: StatusCode, message: String) -> ServiceError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ServiceError::PayloadTooLarge(message)
    } else {
        ServiceError::Validation(message)
    }
}

fn tabular_err(e: TabularError) -> ServiceError {
    match e {
        TabularError::UnsupportedFormat(msg) => ServiceError::UnsupportedFormat(msg),
        TabularError::Parse(msg) => ServiceError::Parse(msg),
    }
}

async fn upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ServiceError> {
    let mut multipart = multipart.map_err(|e| multipart_err(e.status(), e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_err(e.status(), e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_err(e.status(), e.body_text()))?;

        let data = insure_tabular::parse(&bytes, &filename).map_err(tabular_err)?;
        info!(filename = %filename, rows = data.len(), "upload parsed");
        return Ok(Json(UploadResponse { data }));
    }

    Err(ServiceError::Validation("No file uploaded".into()))
}
