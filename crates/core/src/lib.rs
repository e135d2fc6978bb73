#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod policy;
pub mod status;
pub mod time;

pub use error::Error;
pub use status::{LessonStatus, calculate_status, lesson_statuses};
pub use time::Clock;
