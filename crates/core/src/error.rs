//! Engine error model.

use thiserror::Error;

/// Result type used across the document engine.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-level error.
///
/// Keep this focused on deterministic failures of the assembly engine
/// (configuration, formatting, rendering, readiness). I/O and parser failures
/// of collaborators belong to the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A layout slot or template is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A field value was missing or could not be coerced to its expected type.
    #[error("format error: {0}")]
    Format(String),

    /// A template page could not be stamped or merged.
    #[error("render error: {0}")]
    Render(String),

    /// A batch was started before both datasets were loaded.
    #[error("not ready: {0}")]
    NotReady(String),
}

impl EngineError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady(msg.into())
    }

    /// Stable short code, used in logs and failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Configuration(_) => "configuration",
            EngineError::Format(_) => "format",
            EngineError::Render(_) => "render",
            EngineError::NotReady(_) => "not_ready",
        }
    }
}
