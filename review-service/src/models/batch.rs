use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A student inside a batch. Marks are free-form text entered by the teacher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(deserialize_with = "super::scalar::string_from_scalar")]
    pub reg_no: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "super::scalar::opt_string_from_scalar")]
    pub marks: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    #[serde(rename = "_id")]
    pub id: String,
    /// Owning teacher id.
    pub teacher: String,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub batch_name: Option<String>,
    #[serde(default)]
    pub project_title: Option<String>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    /// Fresh batch for a class section: empty project title, no students yet.
    pub fn new(teacher: String, class_name: String, batch_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            teacher,
            class_name: Some(class_name),
            batch_name: Some(batch_name),
            project_title: Some(String::new()),
            students: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
