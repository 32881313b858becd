use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::fs;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<(), AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Keys are flat file names; anything that could escape the base
    /// directory is rejected.
    fn resolve(&self, key: &str) -> Result<PathBuf, AppError> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\'])
            && !key.contains('\0');
        if !valid {
            return Err(AppError::bad_request(format!("Invalid storage key: {}", key)));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<(), AppError> {
        let path = self.resolve(key)?;
        fs::write(path, data).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.resolve(key)?;
        if path.exists() {
            fs::remove_file(path).await?;
        }
        Ok(())
    }
}

/// Last timestamp handed out by [`next_upload_millis`].
static LAST_UPLOAD_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Wall-clock millis, bumped so no two uploads in this process share a value.
fn next_upload_millis() -> i64 {
    let now = Utc::now().timestamp_millis();
    let prev = LAST_UPLOAD_MILLIS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    now.max(prev + 1)
}

/// Name an upload is stored under: `<unix-millis>_<original name>`, with
/// directory components dropped and whitespace runs collapsed to `_`.
pub fn stored_file_name(original_name: &str) -> String {
    stored_file_name_at(next_upload_millis(), original_name)
}

fn stored_file_name_at(millis: i64, original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let base = match base {
        "" | "." | ".." => "file",
        other => other,
    };

    let mut sanitized = String::with_capacity(base.len());
    let mut in_whitespace = false;
    for c in base.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                sanitized.push('_');
            }
            in_whitespace = true;
        } else if c.is_control() {
            in_whitespace = false;
        } else {
            sanitized.push(c);
            in_whitespace = false;
        }
    }

    format!("{}_{}", millis, sanitized)
}
