//! Errors surfaced by the crop pipeline and the background engine.

use thiserror::Error;

use crate::decode::{BackoffError, DecodeError};

/// Failure of a crop or load request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CropError {
    /// The source is unreadable or not a valid image. Never retried.
    #[error("Failed to decode image: {0}")]
    DecodeFailure(String),

    /// Memory backoff reached its bound without a successful allocation.
    #[error("Out of memory after {attempts} attempts")]
    OutOfMemoryExhausted { attempts: u32 },

    /// Degenerate request rejected before any decode work.
    #[error("Invalid crop geometry: {0}")]
    InvalidGeometry(String),

    /// Superseded by a newer request of the same kind.
    #[error("Request cancelled")]
    Cancelled,

    /// The OS refused to start the background worker thread.
    #[error("Failed to start worker thread: {0}")]
    WorkerSpawn(String),
}

impl From<DecodeError> for CropError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::ResourceExhausted => CropError::OutOfMemoryExhausted { attempts: 1 },
            other => CropError::DecodeFailure(other.to_string()),
        }
    }
}

impl From<BackoffError> for CropError {
    fn from(err: BackoffError) -> Self {
        match err {
            BackoffError::Exhausted { attempts, .. } => CropError::OutOfMemoryExhausted { attempts },
            BackoffError::Decode(e) => e.into(),
            BackoffError::Cancelled => CropError::Cancelled,
        }
    }
}
