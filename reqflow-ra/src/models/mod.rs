//! Data models for analysis tasks

pub mod task;

pub use task::{TaskRecord, TaskStatus};
