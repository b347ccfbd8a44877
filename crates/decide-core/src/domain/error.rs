//! Domain-level error taxonomy for decision routing.

/// Errors produced while validating an issue draft.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("issue text must not be empty")]
    EmptyText,

    #[error("at least one domain tag is required")]
    NoTags,
}

/// Decision routing domain errors.
#[derive(Debug, thiserror::Error)]
pub enum DecideError {
    #[error("invalid issue: {0}")]
    Intake(#[from] IntakeError),

    #[error("decision card action rejected: {0}")]
    CardAction(String),

    #[error("run cache error: {0}")]
    RunCache(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for decision routing domain operations.
pub type Result<T> = std::result::Result<T, DecideError>;
