//! Error types for grove

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GroveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Group already exists: {0}")]
    DuplicateGroup(String),

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Group is readonly: {0}")]
    ReadonlyGroup(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    #[error("Persistence failure in provider {provider}: {message}")]
    Persistence { provider: String, message: String },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

impl GroveError {
    /// Wrap a provider-level failure so the boundary can tell which backend broke.
    pub fn persistence(provider: &str, err: impl std::fmt::Display) -> Self {
        Self::Persistence {
            provider: provider.to_string(),
            message: err.to_string(),
        }
    }

    /// Short machine-readable code used in robot output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Database(_) => "database",
            Self::Serialization(_) => "serialization",
            Self::Config(_) | Self::MissingConfig(_) => "config",
            Self::GroupNotFound(_) | Self::ProviderNotFound(_) => "not_found",
            Self::DuplicateGroup(_) => "duplicate_identity",
            Self::InvalidMove(_) | Self::ReadonlyGroup(_) => "structural_violation",
            Self::InvalidResource(_) => "invalid_resource",
            Self::Persistence { .. } => "persistence_failure",
            Self::ValidationFailed(_) => "validation_failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, GroveError>;
