pub use job::{report, run_job, JobOutcome};
pub use models::{Model, Task, User};
pub use repository::Repository;
pub use sequence::SequenceOutcome;

pub mod job;
pub mod models;
pub mod repository;
pub mod sequence;
