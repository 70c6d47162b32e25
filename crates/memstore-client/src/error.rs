//! Error types for store operations.

use std::time::Duration;
use thiserror::Error;

/// Comprehensive error type for all store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Request throttled by backend: {message}")]
    Throttled { message: String },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Backend error ({code}): {message}")]
    Backend { code: String, message: String },

    #[error("Batch receipt not found or expired: {receipt}")]
    ReceiptExpired { receipt: String },

    #[error("Value too large: {size} bytes (max: {max_size})")]
    ValueTooLarge { size: usize, max_size: usize },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl StoreError {
    /// Check if error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable { .. } => true,
            Self::Throttled { .. } => true,
            Self::Timeout { .. } => true,
            Self::Backend { .. } => true, // Backend-supplied faults are usually transient
            Self::ReceiptExpired { .. } => false,
            Self::ValueTooLarge { .. } => false,
            Self::Serialization(_) => false,
            Self::Validation(_) => false,
        }
    }

    /// Check if error should be retried
    pub fn should_retry(&self) -> bool {
        self.is_transient()
    }

    /// Get suggested retry delay
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Unavailable { .. } => Some(Duration::from_secs(5)),
            Self::Throttled { .. } => Some(Duration::from_secs(1)),
            Self::Timeout { .. } => Some(Duration::from_secs(1)),
            _ => None,
        }
    }
}

/// Errors during value serialization/deserialization
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("Value encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Value decoding failed: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
