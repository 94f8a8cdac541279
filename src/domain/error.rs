use thiserror::Error;

/// Domain-level errors for Retune.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No input audio staged")]
    NoInputStaged,

    #[error("Nothing to submit: enter a prompt or select at least one tag")]
    EmptyPrompt,

    #[error("A transformation run is already in progress")]
    RunInProgress,

    #[error("Transformation service error: {0}")]
    Service(String),

    #[error("HTTP request failed: {0}")]
    HttpRequest(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Playback error: {0}")]
    Playback(String),
}

impl DomainError {
    /// Validation errors are rejected synchronously at the boundary of
    /// `WorkflowController::start`, before any network activity.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::NoInputStaged | DomainError::EmptyPrompt | DomainError::RunInProgress
        )
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for DomainError {
    fn from(err: toml::de::Error) -> Self {
        DomainError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DomainError {
    fn from(err: toml::ser::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}
