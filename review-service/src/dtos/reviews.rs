use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{FileAttachment, Review, ReviewItem};

/// JSON carried in the `reviewData` multipart field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewData {
    /// Student registration number.
    #[serde(default, deserialize_with = "crate::models::scalar::opt_string_from_scalar")]
    pub student_id: Option<String>,
    #[serde(default)]
    pub reviews: Option<Vec<ReviewItem>>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub batch_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    pub student_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub teacher: String,
    pub class_name: Option<String>,
    pub batch_name: Option<String>,
    pub student_reg_no: String,
    pub reviews: Vec<ReviewItem>,
    pub files: Vec<FileAttachment>,
    pub submitted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            teacher: review.teacher,
            class_name: review.class_name,
            batch_name: review.batch_name,
            student_reg_no: review.student_reg_no,
            reviews: review.reviews,
            files: review.files,
            submitted: review.submitted,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}
