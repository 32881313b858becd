use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Batch, Student};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "className is required"))]
    pub class_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "batchName is required"))]
    pub batch_name: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StudentInfoRequest {
    /// Batch name the student list belongs to.
    #[serde(default)]
    #[validate(length(min = 1, message = "batch is required"))]
    pub batch: String,
    #[serde(default)]
    pub project_title: String,
    #[serde(default)]
    pub students: Vec<Student>,
}

impl StudentInfoRequest {
    /// Index of the first student without a registration number.
    pub fn first_student_missing_reg_no(&self) -> Option<usize> {
        self.students
            .iter()
            .position(|s| s.reg_no.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub teacher: String,
    pub class_name: Option<String>,
    pub batch_name: Option<String>,
    pub project_title: Option<String>,
    pub students: Vec<Student>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Batch> for BatchResponse {
    fn from(batch: Batch) -> Self {
        Self {
            id: batch.id,
            teacher: batch.teacher,
            class_name: batch.class_name,
            batch_name: batch.batch_name,
            project_title: batch.project_title,
            students: batch.students,
            created_at: batch.created_at,
            updated_at: batch.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateBatchResponse {
    pub message: String,
    pub batch: BatchResponse,
}

#[derive(Debug, Serialize)]
pub struct StudentInfoResponse {
    pub message: String,
    pub record: BatchResponse,
}
