//! Review records: marks/comments per student plus file attachments.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Query, State},
    Json,
};
use service_core::error::AppError;
use service_core::middleware::security_headers::UPLOADS_PREFIX;

use crate::dtos::{MessageResponse, ReviewData, ReviewQuery, ReviewResponse};
use crate::middleware::AuthTeacher;
use crate::models::FileAttachment;
use crate::services::metrics::record_review_saved;
use crate::services::{stored_file_name, ReviewUpsert};
use crate::startup::AppState;

const REVIEW_DATA_FIELD: &str = "reviewData";
const FILES_FIELD: &str = "files";

/// A file part read from the request, not yet written to storage.
struct PendingFile {
    original_name: String,
    mime_type: String,
    data: Vec<u8>,
}

struct ReviewForm {
    data: ReviewData,
    files: Vec<PendingFile>,
}

/// POST /saveReview
pub async fn save_review(
    State(state): State<AppState>,
    teacher: AuthTeacher,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    store_review(&state, &teacher, multipart, false).await?;
    Ok(Json(MessageResponse::new("Review saved")))
}

/// POST /submitReview
pub async fn submit_review(
    State(state): State<AppState>,
    teacher: AuthTeacher,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    store_review(&state, &teacher, multipart, true).await?;
    Ok(Json(MessageResponse::new("Review submitted")))
}

/// GET /reviews?studentId=...
pub async fn list_reviews(
    State(state): State<AppState>,
    teacher: AuthTeacher,
    Query(query): Query<ReviewQuery>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    let student_id = query
        .student_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("studentId is required"))?;

    let records = state.db.find_reviews(teacher.id(), &student_id).await?;
    Ok(Json(records.into_iter().map(ReviewResponse::from).collect()))
}

/// Shared body of save and submit: parse the form, persist the attachments,
/// then upsert the record. Attachments are removed again if the upsert fails.
async fn store_review(
    state: &AppState,
    teacher: &AuthTeacher,
    multipart: Result<Multipart, MultipartRejection>,
    submitted: bool,
) -> Result<(), AppError> {
    let multipart = multipart.map_err(|e| {
        AppError::bad_request(format!("Invalid multipart request: {}", e.body_text()))
    })?;
    let form = read_review_form(multipart, state.config.storage.max_file_bytes).await?;

    let student_reg_no = form
        .data
        .student_id
        .clone()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("studentId is required"))?;

    let mut stored_keys = Vec::with_capacity(form.files.len());
    let mut attachments = Vec::with_capacity(form.files.len());
    for file in form.files {
        let key = stored_file_name(&file.original_name);
        if let Err(e) = state.storage.upload(&key, file.data).await {
            tracing::error!(key = %key, "Failed to store review attachment: {}", e);
            discard_files(state, &stored_keys).await;
            return Err(e);
        }
        attachments.push(FileAttachment {
            original_name: file.original_name,
            path: format!("{}/{}", UPLOADS_PREFIX, key),
            mime_type: file.mime_type,
        });
        stored_keys.push(key);
    }

    let upsert = ReviewUpsert {
        student_reg_no,
        reviews: form.data.reviews,
        class_name: form.data.class_name,
        batch_name: form.data.batch_name,
        files: attachments,
        submitted,
    };

    let record = match state.db.upsert_review(teacher.id(), &upsert).await {
        Ok(record) => record,
        Err(e) => {
            discard_files(state, &stored_keys).await;
            return Err(e);
        }
    };

    record_review_saved(submitted, stored_keys.len());
    tracing::info!(
        review_id = %record.id,
        teacher_id = %teacher.id(),
        student = %record.student_reg_no,
        files_added = stored_keys.len(),
        submitted,
        "Review stored"
    );

    Ok(())
}

async fn discard_files(state: &AppState, keys: &[String]) {
    for key in keys {
        if let Err(e) = state.storage.delete(key).await {
            tracing::warn!(key = %key, "Failed to remove orphaned attachment: {}", e);
        }
    }
}

/// Reads `reviewData` and every `files` part; other fields are skipped.
async fn read_review_form(
    mut multipart: Multipart,
    max_file_bytes: usize,
) -> Result<ReviewForm, AppError> {
    let mut review_data: Option<String> = None;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(REVIEW_DATA_FIELD) => {
                let text = field.text().await.map_err(|e| {
                    AppError::bad_request(format!("Failed to read reviewData: {}", e))
                })?;
                review_data = Some(text);
            }
            Some(FILES_FIELD) => {
                let original_name = field.file_name().unwrap_or_default().to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        AppError::bad_request(format!("Failed to read file bytes: {}", e))
                    })?
                    .to_vec();

                // An untouched file input posts an empty, unnamed part.
                if original_name.is_empty() && data.is_empty() {
                    continue;
                }
                if data.len() > max_file_bytes {
                    return Err(AppError::bad_request(format!(
                        "File '{}' is too large (max {} bytes)",
                        original_name, max_file_bytes
                    )));
                }

                files.push(PendingFile {
                    original_name: if original_name.is_empty() {
                        "file".to_string()
                    } else {
                        original_name
                    },
                    mime_type,
                    data,
                });
            }
            _ => {}
        }
    }

    Ok(ReviewForm {
        data: parse_review_data(review_data.as_deref())?,
        files,
    })
}

/// A missing field reads as `{}`; anything that is not valid JSON is a client error.
fn parse_review_data(raw: Option<&str>) -> Result<ReviewData, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(ReviewData::default()),
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| AppError::bad_request(format!("Invalid reviewData: {}", e))),
    }
}
