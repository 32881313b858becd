//! Batches of students, always scoped to the calling teacher.

use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;

use crate::dtos::{
    BatchResponse, CreateBatchRequest, CreateBatchResponse, StudentInfoRequest,
    StudentInfoResponse,
};
use crate::middleware::AuthTeacher;
use crate::models::Batch;
use crate::startup::AppState;
use crate::utils::ValidatedJson;

/// POST /batches
pub async fn create_batch(
    State(state): State<AppState>,
    teacher: AuthTeacher,
    ValidatedJson(req): ValidatedJson<CreateBatchRequest>,
) -> Result<Json<CreateBatchResponse>, AppError> {
    let batch = Batch::new(teacher.id().to_string(), req.class_name, req.batch_name);
    state.db.insert_batch(&batch).await?;

    tracing::info!(batch_id = %batch.id, teacher_id = %teacher.id(), "Batch created");

    Ok(Json(CreateBatchResponse {
        message: "Batch added".to_string(),
        batch: batch.into(),
    }))
}

/// GET /batches/:section
pub async fn list_batches_for_section(
    State(state): State<AppState>,
    teacher: AuthTeacher,
    Path(section): Path<String>,
) -> Result<Json<Vec<BatchResponse>>, AppError> {
    let batches = state.db.find_batches(teacher.id(), Some(&section)).await?;
    Ok(Json(batches.into_iter().map(BatchResponse::from).collect()))
}

/// POST /studentinfo
///
/// Upserts the teacher's batch named `batch` with the given project title and
/// student list.
pub async fn save_student_info(
    State(state): State<AppState>,
    teacher: AuthTeacher,
    ValidatedJson(req): ValidatedJson<StudentInfoRequest>,
) -> Result<Json<StudentInfoResponse>, AppError> {
    if let Some(index) = req.first_student_missing_reg_no() {
        return Err(AppError::bad_request(format!(
            "Student at position {} is missing regNo",
            index + 1
        )));
    }

    let record = state
        .db
        .upsert_student_info(teacher.id(), &req.batch, &req.project_title, &req.students)
        .await?;

    tracing::info!(
        batch_id = %record.id,
        teacher_id = %teacher.id(),
        students = record.students.len(),
        "Student info saved"
    );

    Ok(Json(StudentInfoResponse {
        message: "Student info saved".to_string(),
        record: record.into(),
    }))
}

/// GET /studentinfo
pub async fn list_student_info(
    State(state): State<AppState>,
    teacher: AuthTeacher,
) -> Result<Json<Vec<BatchResponse>>, AppError> {
    let batches = state.db.find_batches(teacher.id(), None).await?;
    Ok(Json(batches.into_iter().map(BatchResponse::from).collect()))
}
