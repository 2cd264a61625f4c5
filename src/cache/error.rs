//! Cache operation error types
//!
//! Producer failures are carried as the caller's exact error behind an
//! `Arc`, so one failed production can fan out to every coalesced waiter
//! while staying downcastable to the concrete type.

use std::error::Error;
use std::sync::Arc;

/// Errors surfaced by coordinator operations.
///
/// Once argument validation has passed there is no cache-layer failure
/// mode of its own: the only runtime errors a caller can see come from
/// its producer (`Production`) or from the host tearing the production
/// task down (`ProductionCancelled`).
#[derive(Debug, Clone)]
pub enum CacheOperationError {
    /// Empty key, or options that violate `stale_after <= expire_after`.
    /// Raised synchronously, before any producer is invoked.
    InvalidArgument(String),
    /// Rejected configuration passed to the builder.
    InvalidConfiguration(String),
    /// The caller-supplied producer failed on a cold path (miss or
    /// expired read). Carries the producer's exact error.
    Production(Arc<dyn Error + Send + Sync>),
    /// The production task was cancelled or panicked before settling.
    /// The key remains absent from the store.
    ProductionCancelled,
    /// The coordinator has been shut down and no longer serves reads.
    ShuttingDown,
}

impl CacheOperationError {
    /// Construct a `Production` error from a producer failure.
    pub fn production<E: Error + Send + Sync + 'static>(err: E) -> Self {
        CacheOperationError::Production(Arc::new(err))
    }

    /// The producer's error, if this is a cold-path production failure.
    pub fn producer_error(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match self {
            CacheOperationError::Production(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl std::fmt::Display for CacheOperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheOperationError::InvalidArgument(msg) => {
                write!(f, "Invalid argument: {}", msg)
            }
            CacheOperationError::InvalidConfiguration(msg) => {
                write!(f, "Invalid configuration: {}", msg)
            }
            CacheOperationError::Production(err) => write!(f, "Producer failed: {}", err),
            CacheOperationError::ProductionCancelled => {
                write!(f, "Production task cancelled before completion")
            }
            CacheOperationError::ShuttingDown => write!(f, "Coordinator is shutting down"),
        }
    }
}

impl Error for CacheOperationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CacheOperationError::Production(err) => {
                Some(err.as_ref() as &(dyn Error + 'static))
            }
            _ => None,
        }
    }
}
