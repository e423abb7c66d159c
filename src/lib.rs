pub mod config;
pub mod dedup_store;
pub mod matcher;
pub mod models;
pub mod plugins;
pub mod scheduler;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use dedup_store::{DedupStore, NotifiedSet};
pub use scheduler::{CycleOutcome, CycleReport, RunOutcome, Scheduler, SchedulerState};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
