use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mark {
    #[serde(default)]
    pub criteria: Option<String>,
    #[serde(default, deserialize_with = "super::scalar::opt_string_from_scalar")]
    pub mark: Option<String>,
}

/// One numbered review round for a student.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    #[serde(default, deserialize_with = "super::scalar::opt_i32_from_scalar")]
    pub review_number: Option<i32>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub marks: Vec<Mark>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    pub original_name: String,
    /// Public URL path, `/uploads/<stored name>`.
    pub path: String,
    pub mime_type: String,
}

/// Review record: one per (teacher, student).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: String,
    pub teacher: String,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub batch_name: Option<String>,
    pub student_reg_no: String,
    #[serde(default)]
    pub reviews: Vec<ReviewItem>,
    #[serde(default)]
    pub files: Vec<FileAttachment>,
    #[serde(default)]
    pub submitted: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}
