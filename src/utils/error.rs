use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("File system watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error("Hand-off request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Journal error: {0}")]
    JournalError(#[from] csv::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("File never became ready after {attempts} attempts: {path}")]
    FileNotReadyError { path: String, attempts: u32 },

    #[error("File disappeared while waiting for it: {path}")]
    FileVanishedError { path: String },

    #[error("Consumer '{consumer}' failed: {message}")]
    ConsumerError { consumer: String, message: String },

    #[error("All consumers failed for: {path}")]
    DeliveryError { path: String },
}

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    FileSystem,
    Network,
    Delivery,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl HarnessError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            HarnessError::ConfigValidationError { .. }
            | HarnessError::InvalidConfigValueError { .. }
            | HarnessError::MissingConfigError { .. } => ErrorCategory::Configuration,
            HarnessError::IoError(_)
            | HarnessError::WatchError(_)
            | HarnessError::FileNotReadyError { .. }
            | HarnessError::FileVanishedError { .. } => ErrorCategory::FileSystem,
            HarnessError::HttpError(_) => ErrorCategory::Network,
            HarnessError::ConsumerError { .. } | HarnessError::DeliveryError { .. } => {
                ErrorCategory::Delivery
            }
            HarnessError::JournalError(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 檔案被其他程序拿走了，繼續監看即可
            HarnessError::FileVanishedError { .. } => ErrorSeverity::Low,
            // 重試後可能恢復
            HarnessError::FileNotReadyError { .. }
            | HarnessError::HttpError(_)
            | HarnessError::ConsumerError { .. } => ErrorSeverity::Medium,
            HarnessError::DeliveryError { .. }
            | HarnessError::IoError(_)
            | HarnessError::JournalError(_) => ErrorSeverity::High,
            // 配置或監看器壞掉，整個 harness 無法運作
            HarnessError::ConfigValidationError { .. }
            | HarnessError::InvalidConfigValueError { .. }
            | HarnessError::MissingConfigError { .. }
            | HarnessError::WatchError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            HarnessError::ConfigValidationError { field, .. }
            | HarnessError::InvalidConfigValueError { field, .. }
            | HarnessError::MissingConfigError { field } => {
                format!("Check the '{}' setting in your configuration", field)
            }
            HarnessError::WatchError(_) => {
                "Verify the watch directory exists and is readable".to_string()
            }
            HarnessError::FileNotReadyError { .. } => {
                "Increase readiness.max_attempts or poll_interval_ms, or enable deliver_on_ceiling"
                    .to_string()
            }
            HarnessError::FileVanishedError { .. } => {
                "Another process removed the file first; no action needed".to_string()
            }
            HarnessError::HttpError(_) => {
                "Check that the hand-off endpoint is reachable".to_string()
            }
            HarnessError::ConsumerError { .. } | HarnessError::DeliveryError { .. } => {
                "Check the consumer target (destination folder, command, or endpoint)".to_string()
            }
            HarnessError::IoError(_) => "Check file and directory permissions".to_string(),
            HarnessError::JournalError(_) => "Check the journal path is writable".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            HarnessError::ConfigValidationError { .. }
            | HarnessError::InvalidConfigValueError { .. }
            | HarnessError::MissingConfigError { .. } => {
                format!("Configuration problem: {}", self)
            }
            HarnessError::FileNotReadyError { path, .. } => {
                format!("'{}' was still being written and was not handed off", path)
            }
            HarnessError::FileVanishedError { path } => {
                format!("'{}' disappeared before it could be handed off", path)
            }
            HarnessError::DeliveryError { path } => {
                format!("Every configured consumer refused '{}'", path)
            }
            other => other.to_string(),
        }
    }
}
