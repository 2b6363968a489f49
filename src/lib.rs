pub mod aggregator;
pub mod config;
pub mod extract;
pub mod fetcher;
pub mod models;
pub mod plugins;
pub mod scheduler;
pub mod utils;
pub mod watcher;

// Re-export commonly used types
pub use config::AppConfig;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
