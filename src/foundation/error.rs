/// Convenience result type used across the crate.
pub type PixelMathResult<T> = Result<T, PixelMathError>;

/// Top-level error type.
///
/// Compilation errors surface before any worker thread is spawned; evaluation errors are raised by
/// a worker and re-raised once after all workers have joined.
#[derive(thiserror::Error, Debug)]
pub enum PixelMathError {
    /// Malformed expression trees, unknown symbols, missing images, bad channel indices.
    #[error("compile error: {0}")]
    Compile(String),

    /// Error raised while evaluating pixels.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Allocation or thread-pool failures.
    #[error("resource error: {0}")]
    Resource(String),

    /// Internal consistency failure (a bug in the compiler passes, not a user error).
    #[error("internal error: {0}")]
    Internal(String),

    /// Execution stopped through the abort flag.
    #[error("execution cancelled")]
    Cancelled,

    /// Job or tree (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Any other error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PixelMathError {
    /// Build a [`PixelMathError::Compile`].
    pub fn compile(msg: impl Into<String>) -> Self {
        Self::Compile(msg.into())
    }

    /// Build a [`PixelMathError::Evaluation`].
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`PixelMathError::Resource`].
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`PixelMathError::Internal`].
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Build a [`PixelMathError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for PixelMathError {
    fn from(err: serde_json::Error) -> Self {
        Self::serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
