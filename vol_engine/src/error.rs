/// error.rs — Engine error type
///
/// Every fallible engine routine returns `Result<T>`; the pipeline binaries
/// wrap these in `anyhow` with context.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("singular matrix in {0}")]
    Singular(&'static str),

    #[error("optimization failed: {0}")]
    Optimization(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Reject series shorter than `needed`.
pub(crate) fn require_len(data: &[f64], needed: usize) -> Result<()> {
    if data.len() < needed {
        return Err(EngineError::InsufficientData { needed, got: data.len() });
    }
    Ok(())
}

/// Reject NaN / ±inf anywhere in the series.
pub(crate) fn require_finite(data: &[f64], what: &str) -> Result<()> {
    if let Some(i) = data.iter().position(|v| !v.is_finite()) {
        return Err(EngineError::InvalidInput(format!(
            "{what} contains a non-finite value at index {i}"
        )));
    }
    Ok(())
}
