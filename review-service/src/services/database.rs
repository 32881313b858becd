use crate::models::{Batch, FileAttachment, Review, ReviewItem, Student, Teacher};
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{self, doc, Document},
    error::{CommandError, ErrorKind, WriteError, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;
use uuid::Uuid;

const DUPLICATE_KEY: i32 = 11000;

/// Fields written by a save/submit of a review record.
#[derive(Debug, Clone)]
pub struct ReviewUpsert {
    pub student_reg_no: String,
    /// `None` keeps whatever reviews the record already holds.
    pub reviews: Option<Vec<ReviewItem>>,
    pub class_name: Option<String>,
    pub batch_name: Option<String>,
    /// Appended to the record's existing attachments.
    pub files: Vec<FileAttachment>,
    pub submitted: bool,
}

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for review-service");

        let fullname_index = IndexModel::builder()
            .keys(doc! { "fullname": 1 })
            .options(
                IndexOptions::builder()
                    .name("fullname_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.teachers()
            .create_index(fullname_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create fullname index on teachers collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created unique index on teachers.fullname");

        let section_index = IndexModel::builder()
            .keys(doc! { "teacher": 1, "className": 1 })
            .options(
                IndexOptions::builder()
                    .name("teacher_section_lookup".to_string())
                    .build(),
            )
            .build();
        let batch_name_index = IndexModel::builder()
            .keys(doc! { "teacher": 1, "batchName": 1 })
            .options(
                IndexOptions::builder()
                    .name("teacher_batch_lookup".to_string())
                    .build(),
            )
            .build();
        self.batches()
            .create_indexes([section_index, batch_name_index], None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create indexes on batches collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created indexes on batches.(teacher, className) and batches.(teacher, batchName)");

        // Unique so concurrent upserts for one student converge on a single record
        let student_index = IndexModel::builder()
            .keys(doc! { "teacher": 1, "studentRegNo": 1 })
            .options(
                IndexOptions::builder()
                    .name("teacher_student_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.reviews()
            .create_index(student_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create student index on reviews collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created unique index on reviews.(teacher, studentRegNo)");

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn teachers(&self) -> Collection<Teacher> {
        self.db.collection("teachers")
    }

    pub fn batches(&self) -> Collection<Batch> {
        self.db.collection("batches")
    }

    pub fn reviews(&self) -> Collection<Review> {
        self.db.collection("reviews")
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    // ------------------------------------------------------------------
    // Teachers
    // ------------------------------------------------------------------

    pub async fn find_teacher_by_fullname(&self, fullname: &str) -> Result<Option<Teacher>, AppError> {
        Ok(self
            .teachers()
            .find_one(doc! { "fullname": fullname }, None)
            .await?)
    }

    /// Inserts a teacher. A taken fullname is a `BadRequest`, matching the
    /// pre-insert existence check in the register handler.
    pub async fn insert_teacher(&self, teacher: &Teacher) -> Result<(), AppError> {
        match self.teachers().insert_one(teacher, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(AppError::bad_request("User already exists")),
            Err(e) => {
                tracing::error!(teacher_id = %teacher.id, "Failed to insert teacher: {}", e);
                Err(AppError::from(e))
            }
        }
    }

    // ------------------------------------------------------------------
    // Batches
    // ------------------------------------------------------------------

    pub async fn insert_batch(&self, batch: &Batch) -> Result<(), AppError> {
        self.batches().insert_one(batch, None).await.map_err(|e| {
            tracing::error!(batch_id = %batch.id, "Failed to insert batch: {}", e);
            AppError::from(e)
        })?;
        Ok(())
    }

    /// Batches owned by `teacher_id`, optionally restricted to one class section.
    pub async fn find_batches(
        &self,
        teacher_id: &str,
        class_name: Option<&str>,
    ) -> Result<Vec<Batch>, AppError> {
        let mut filter = doc! { "teacher": teacher_id };
        if let Some(class_name) = class_name {
            filter.insert("className", class_name);
        }

        let options = FindOptions::builder().sort(doc! { "createdAt": 1 }).build();
        let cursor = self.batches().find(filter, options).await?;
        Ok(cursor.try_collect::<Vec<_>>().await?)
    }

    /// Replaces project title and students of the teacher's batch named
    /// `batch_name`, creating the batch if it does not exist.
    pub async fn upsert_student_info(
        &self,
        teacher_id: &str,
        batch_name: &str,
        project_title: &str,
        students: &[Student],
    ) -> Result<Batch, AppError> {
        let filter = doc! { "teacher": teacher_id, "batchName": batch_name };
        let update = student_info_update(project_title, students)?;

        self.batches()
            .find_one_and_update(filter, update, upsert_returning_new())
            .await?
            .ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!("Upsert returned no batch document"))
            })
    }

    // ------------------------------------------------------------------
    // Reviews
    // ------------------------------------------------------------------

    pub async fn upsert_review(
        &self,
        teacher_id: &str,
        upsert: &ReviewUpsert,
    ) -> Result<Review, AppError> {
        let filter = doc! { "teacher": teacher_id, "studentRegNo": upsert.student_reg_no.as_str() };
        let update = review_update(upsert)?;

        // Two racing upserts may both try to insert; the loser retries as an update.
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .reviews()
                .find_one_and_update(filter.clone(), update.clone(), upsert_returning_new())
                .await
            {
                Ok(Some(review)) => return Ok(review),
                Ok(None) => {
                    return Err(AppError::InternalError(anyhow::anyhow!(
                        "Upsert returned no review document"
                    )))
                }
                Err(e) if attempt < 2 && is_duplicate_key(&e) => {
                    tracing::warn!(
                        student = %upsert.student_reg_no,
                        "Concurrent review insert detected, retrying as update"
                    );
                }
                Err(e) => return Err(AppError::from(e)),
            }
        }
    }

    pub async fn find_reviews(
        &self,
        teacher_id: &str,
        student_reg_no: &str,
    ) -> Result<Vec<Review>, AppError> {
        let filter = doc! { "teacher": teacher_id, "studentRegNo": student_reg_no };
        let cursor = self.reviews().find(filter, None).await?;
        Ok(cursor.try_collect::<Vec<_>>().await?)
    }
}

fn upsert_returning_new() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .upsert(true)
        .return_document(ReturnDocument::After)
        .build()
}

/// Unique-index violation, reported as a write error by inserts and as a
/// command error by `findAndModify`.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(WriteError { code, .. })) => {
            *code == DUPLICATE_KEY
        }
        ErrorKind::Command(CommandError { code, .. }) => *code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Update document for `upsert_student_info`. Filter equality fields
/// (`teacher`, `batchName`) are copied into inserted documents by the server.
fn student_info_update(project_title: &str, students: &[Student]) -> Result<Document, AppError> {
    let now = bson::DateTime::from_chrono(Utc::now());
    Ok(doc! {
        "$set": {
            "projectTitle": project_title,
            "students": bson::to_bson(students)?,
            "updatedAt": now,
        },
        "$setOnInsert": {
            "_id": Uuid::new_v4().to_string(),
            "createdAt": now,
        },
    })
}

/// Update document for `upsert_review`.
fn review_update(upsert: &ReviewUpsert) -> Result<Document, AppError> {
    let now = bson::DateTime::from_chrono(Utc::now());

    let mut set = doc! {
        "submitted": upsert.submitted,
        "updatedAt": now,
    };
    let mut set_on_insert = doc! {
        "_id": Uuid::new_v4().to_string(),
        "createdAt": now,
    };

    match &upsert.reviews {
        Some(reviews) => {
            set.insert("reviews", bson::to_bson(reviews)?);
        }
        None => {
            set_on_insert.insert("reviews", bson::Bson::Array(Vec::new()));
        }
    }
    if let Some(class_name) = &upsert.class_name {
        set.insert("className", class_name.as_str());
    }
    if let Some(batch_name) = &upsert.batch_name {
        set.insert("batchName", batch_name.as_str());
    }

    Ok(doc! {
        "$set": set,
        "$setOnInsert": set_on_insert,
        "$push": { "files": { "$each": bson::to_bson(&upsert.files)? } },
    })
}
