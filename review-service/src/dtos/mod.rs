pub mod account;
pub mod batches;
pub mod reviews;

use serde::Serialize;

pub use account::{ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest};
pub use batches::{BatchResponse, CreateBatchRequest, CreateBatchResponse, StudentInfoRequest, StudentInfoResponse};
pub use reviews::{ReviewData, ReviewQuery, ReviewResponse};

/// Plain `{ "message": ... }` body used by most write endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
