/// Convenience result type used across voidgrind.
pub type VoidResult<T> = Result<T, VoidError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// Per-artifact problems are not errors at this level; they surface as
/// [`crate::ArtifactOutcome`] values so a batch keeps going.
#[derive(thiserror::Error, Debug)]
pub enum VoidError {
    /// Invalid user-provided configuration or data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unrecoverable failure while preparing a run.
    #[error("startup error: {0}")]
    Startup(String),

    /// A persisted record has a shape the migrator cannot repair.
    #[error("schema error: {0}")]
    Schema(String),

    /// Errors when serializing or deserializing records.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VoidError {
    /// Build a [`VoidError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`VoidError::Startup`] value.
    pub fn startup(msg: impl Into<String>) -> Self {
        Self::Startup(msg.into())
    }

    /// Build a [`VoidError::Schema`] value.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Build a [`VoidError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for VoidError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
