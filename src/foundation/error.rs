/// Convenience result type used across frameir.
pub type FrameIrResult<T> = Result<T, FrameIrError>;

/// Top-level error taxonomy used at the crate boundaries.
///
/// The optimizer itself is total over well-formed frames and never produces one of these; they
/// originate from the pipeline (validation) and JSON entry points (serde).
#[derive(thiserror::Error, Debug)]
pub enum FrameIrError {
    /// A frame failed structural validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing frames or options.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FrameIrError {
    /// Build a [`FrameIrError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FrameIrError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
