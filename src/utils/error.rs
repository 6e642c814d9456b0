use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Remote store request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid store URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Speech recognizer error: {message}")]
    RecognizerError { message: String },

    #[error("Remote write to {path} failed: {message}")]
    RemoteWriteError { path: String, message: String },

    #[error("Schedule error: {message}")]
    ScheduleError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Recognition,
    Storage,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PanelError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PanelError::ConfigError { .. }
            | PanelError::MissingConfigError { .. }
            | PanelError::InvalidConfigValueError { .. }
            | PanelError::ConfigValidationError { .. }
            | PanelError::UrlError(_) => ErrorCategory::Configuration,
            PanelError::HttpError(_) | PanelError::RemoteWriteError { .. } => {
                ErrorCategory::Network
            }
            PanelError::RecognizerError { .. } => ErrorCategory::Recognition,
            PanelError::IoError(_) | PanelError::ScheduleError { .. } => ErrorCategory::Storage,
            PanelError::SerializationError(_) => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Recognition => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Storage => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the panel configuration file and command line flags"
            }
            ErrorCategory::Network => {
                "Check the network connection and the realtime database URL / auth token"
            }
            ErrorCategory::Recognition => "Hold the record button and speak again",
            ErrorCategory::Storage => "Check that the schedule file path is writable",
            ErrorCategory::Data => "The remote database returned unexpected data",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PanelError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            PanelError::MissingConfigError { field } => {
                format!("Required setting '{}' is missing", field)
            }
            PanelError::RemoteWriteError { path, .. } => {
                format!("Could not update {} on the panel database", path)
            }
            PanelError::HttpError(_) => "Could not reach the panel database".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PanelError>;
