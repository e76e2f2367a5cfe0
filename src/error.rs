/*
 * Error Module
 *
 * Errors raised while building a simulation. Once a simulation exists, a tick
 * cannot fail: cell overflow is counted, not raised.
 */

use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, FlockError>;

#[derive(Debug, Error)]
pub enum FlockError {
    /// A configuration value or combination of values that would silently
    /// produce wrong results (e.g. a search window smaller than the radius).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The grid, agent buffer or staging buffer could not be allocated.
    #[error("failed to allocate {what} ({requested} elements)")]
    AllocationFailure { what: &'static str, requested: usize },

    /// A caller-supplied agent snapshot violates the world invariants.
    #[error("invalid agent state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl FlockError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        FlockError::InvalidConfig(msg.into())
    }
}

/// Reserve exactly `len` elements, mapping failure to `AllocationFailure`.
pub(crate) fn try_alloc<T: Clone>(what: &'static str, len: usize, fill: T) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| FlockError::AllocationFailure { what, requested: len })?;
    buffer.resize(len, fill);
    Ok(buffer)
}
