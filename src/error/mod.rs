mod app;
mod config;
mod scan;
mod storage;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use scan::ScanError;
pub use storage::{StorageError, StorageResult};
pub use validation::ValidationError;
