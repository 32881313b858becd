pub mod database;
pub mod jwt;
pub mod metrics;
pub mod storage;

pub use database::{MongoDb, ReviewUpsert};
pub use jwt::{JwtService, TeacherClaims};
pub use metrics::{get_metrics, init_metrics};
pub use storage::{stored_file_name, LocalStorage, Storage};
