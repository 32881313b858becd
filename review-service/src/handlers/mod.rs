pub mod account;
pub mod batches;
pub mod health;
pub mod reviews;

pub use account::{forgot_password, login, register};
pub use batches::{create_batch, list_batches_for_section, list_student_info, save_student_info};
pub use health::{health_check, metrics_endpoint, readiness_check};
pub use reviews::{list_reviews, save_review, submit_review};
