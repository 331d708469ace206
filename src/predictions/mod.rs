//! Prediction jobs
//!
//! Jobs are created asynchronously on the platform; [`Predictions::wait`]
//! polls until the job reaches a terminal status.

pub mod operations;
pub mod types;

pub use operations::Predictions;
pub use types::{InputValue, JobStatus, PredictionInput, PredictionJob, WaitOptions};
