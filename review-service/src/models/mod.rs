pub mod batch;
pub mod review;
pub mod scalar;
pub mod teacher;

pub use batch::{Batch, Student};
pub use review::{FileAttachment, Mark, Review, ReviewItem};
pub use teacher::Teacher;
