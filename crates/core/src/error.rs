//! Error types for ProDoc
//! 
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for ProDoc
#[derive(Error, Debug)]
pub enum ProDocError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("External service failure: {0}")]
    ExternalService(String),

    #[error("Markup error: {0}")]
    Markup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for ProDoc operations
pub type Result<T> = std::result::Result<T, ProDocError>;

/// Coarse classification used when reporting an error to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input; the operation was refused
    Validation,
    /// Input could not be read or decoded
    Parse,
    /// A rasterizer or document assembler failed
    ExternalService,
    /// Local environment problems (files, config, storage)
    Environment,
}

/// Severity of a transient notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl ProDocError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        ProDocError::Validation(message.into())
    }

    /// Shorthand for a parse failure
    pub fn parse(message: impl Into<String>) -> Self {
        ProDocError::Parse(message.into())
    }

    /// Shorthand for a collaborator failure
    pub fn external(message: impl Into<String>) -> Self {
        ProDocError::ExternalService(message.into())
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProDocError::Validation(_) => ErrorKind::Validation,
            ProDocError::Parse(_) | ProDocError::Markup(_) | ProDocError::Json(_) => ErrorKind::Parse,
            ProDocError::ExternalService(_) => ErrorKind::ExternalService,
            _ => ErrorKind::Environment,
        }
    }

    /// Level of the notification raised for this error
    pub fn notify_level(&self) -> NotifyLevel {
        match self.kind() {
            ErrorKind::Validation => NotifyLevel::Warning,
            _ => NotifyLevel::Error,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ProDocError::Validation(msg) => msg.clone(),
            ProDocError::Parse(msg) => format!("Could not read input: {}", msg),
            ProDocError::Markup(msg) => format!("Could not read document markup: {}", msg),
            ProDocError::Json(e) => format!("Invalid JSON: {}", e),
            ProDocError::ExternalService(msg) => format!("Export failed: {}", msg),
            ProDocError::Io(e) => format!("File operation failed: {}", e),
            ProDocError::Storage(msg) => format!("Storage unavailable: {}", msg),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(ProDocError::validation("bad url").kind(), ErrorKind::Validation);
        assert_eq!(ProDocError::validation("bad url").notify_level(), NotifyLevel::Warning);
        assert_eq!(ProDocError::external("boom").notify_level(), NotifyLevel::Error);

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(ProDocError::from(json_err).kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_user_message() {
        let err = ProDocError::validation("Please enter a valid link");
        assert_eq!(err.user_message(), "Please enter a valid link");
    }
}
