//! Handlers for backup export and import.

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use dreamdress_backup::ImportSummary;
use dreamdress_core::backup::ExportCategory;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Query parameters for a raw-body import.
#[derive(Debug, Deserialize)]
pub struct ImportParams {
    /// Name of the uploaded file; `*.zip` selects the archive format.
    pub file_name: Option<String>,
}

fn log_progress(percent: u8, total: u8, message: &str) {
    tracing::debug!(percent, total, message, "Backup progress");
}

// ---------------------------------------------------------------------------
// POST /backup/export/{category}
// ---------------------------------------------------------------------------

/// Export a backup category and return it as a file attachment.
pub async fn export_backup(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> AppResult<impl IntoResponse> {
    let category: ExportCategory = category.parse()?;

    let unit = {
        let backup = state.backup.lock().await;
        backup.export(category, &log_progress).await?
    };

    let disposition = content_disposition(&unit.file_name);
    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, unit.content_type), (CONTENT_DISPOSITION, disposition)],
        unit.bytes,
    ))
}

/// `attachment` disposition for `file_name`.
///
/// Non-ASCII names get an ASCII `filename` fallback plus an RFC 5987
/// `filename*` carrying the UTF-8 name.
fn content_disposition(file_name: &str) -> String {
    if file_name.is_ascii() {
        return format!("attachment; filename=\"{file_name}\"");
    }
    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}

// ---------------------------------------------------------------------------
// POST /backup/import
// ---------------------------------------------------------------------------

/// Import a previously exported backup.
///
/// Accepts `multipart/form-data` (the first field carrying a file name is
/// the backup) or a raw request body named by `?file_name=`.
pub async fn import_backup(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
    request: Request,
) -> AppResult<Json<DataResponse<ImportSummary>>> {
    let (file_name, bytes) = if is_multipart(&request) {
        read_multipart(request).await?
    } else {
        read_raw(request, params).await?
    };

    if bytes.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }

    let summary = {
        let backup = state.backup.lock().await;
        backup.import(&file_name, &bytes, &log_progress).await?
    };

    Ok(Json(DataResponse { data: summary }))
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"))
}

async fn read_multipart(request: Request) -> AppResult<(String, Bytes)> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        return Ok((file_name, bytes));
    }

    Err(AppError::BadRequest(
        "Multipart upload has no file field".into(),
    ))
}

async fn read_raw(request: Request, params: ImportParams) -> AppResult<(String, Bytes)> {
    let file_name = params
        .file_name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing 'file_name' query parameter".into()))?;
    let bytes = Bytes::from_request(request, &())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok((file_name, bytes))
}
