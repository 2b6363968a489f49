use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),

    #[error("Notification error: {notifier}: {message}")]
    Notification { notifier: String, message: String },

    #[error("A cycle is already in progress")]
    CycleInProgress,
}

/// Failure of a single network request. Aborts the rest of one source's cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("connection to {url} failed: {message}")]
    Connection { url: String, message: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
}

impl FetchError {
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout { url: url.to_string() }
        } else if err.is_connect() {
            FetchError::Connection {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// A candidate block that could not be turned into an order. Only that block is skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("block has neither a heading nor a listing url")]
    Unidentifiable,

    #[error("block has no text content")]
    EmptyBlock,
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
