//! Teacher registration and login.

use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::dtos::{ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest};
use crate::models::Teacher;
use crate::services::metrics::record_login;
use crate::startup::AppState;
use crate::utils::{hash_password, verify_password, ValidatedJson};

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if state.db.find_teacher_by_fullname(&req.fullname).await?.is_some() {
        return Err(AppError::bad_request("User already exists"));
    }

    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Password hashing task failed: {}", e)))??;

    let teacher = Teacher::new(req.fullname, req.department, req.email, password_hash);
    state.db.insert_teacher(&teacher).await?;

    tracing::info!(teacher_id = %teacher.id, "Teacher registered");

    Ok(Json(MessageResponse::new("Registration successful")))
}

/// POST /teacher-login
///
/// Unknown name and wrong password get the same answer.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let Some(teacher) = state.db.find_teacher_by_fullname(&req.fullname).await? else {
        record_login("unknown_user");
        return Err(AppError::bad_request("Invalid credentials"));
    };

    let password = req.password;
    let stored_hash = teacher.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Password check task failed: {}", e)))?;

    if verified.is_err() {
        record_login("bad_password");
        tracing::info!(teacher_id = %teacher.id, "Login rejected");
        return Err(AppError::bad_request("Invalid credentials"));
    }

    let token = state.jwt.issue(&teacher.id, &teacher.fullname)?;
    record_login("success");
    tracing::info!(teacher_id = %teacher.id, "Teacher logged in");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
    }))
}

/// POST /forgot-password
///
/// Resets are handled by an administrator; this only acknowledges the request.
/// A missing or unreadable body counts as no email.
pub async fn forgot_password(
    req: Option<Json<ForgotPasswordRequest>>,
) -> Json<MessageResponse> {
    let email = req.and_then(|Json(req)| req.email).unwrap_or_default();
    tracing::info!(email = %email, "Password reset requested");

    Json(MessageResponse::new(format!(
        "Password reset is not automated yet. Please contact the administrator. (You entered: {})",
        email
    )))
}
