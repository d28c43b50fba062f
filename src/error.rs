//! Error handling for the reconstruction worker
//!
//! Every failure that can occur while handling a job is a variant here, so the
//! job handler boundary can convert any of them into a structured error
//! response instead of letting it reach the host runtime.

use thiserror::Error;

/// Result type alias for worker operations
pub type Result<T> = std::result::Result<T, WorkerError>;

/// Main error type for worker operations
#[derive(Error, Debug)]
pub enum WorkerError {
    // Job validation
    #[error("Invalid job: {reason}")]
    Validation { reason: String },

    // Cold-start configuration
    #[error("Missing credential: environment variable {variable} is required to download checkpoints")]
    MissingCredential { variable: String },

    // Checkpoint download / relocation
    #[error("Checkpoint bootstrap failed: {reason}")]
    Bootstrap { reason: String },

    // Model loading
    #[error("Model initialization failed: {reason}")]
    Initialization { reason: String },

    // Asset fetching
    #[error("Asset not found: {path}")]
    AssetNotFound { path: String },

    #[error("Failed to fetch {url}: HTTP {status}")]
    AssetFetch { url: String, status: u16 },

    #[error("Failed to fetch {url}: {reason}")]
    AssetTransport { url: String, reason: String },

    #[error("Failed to decode asset: {reason}")]
    AssetDecode { reason: String },

    // Inference
    #[error("Inference failed: {reason}")]
    Inference { reason: String },

    // Output encoding
    #[error("Unsupported output format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Export to {format} failed: {reason}")]
    Export { format: String, reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            WorkerError::Validation { .. } => "VALIDATION_ERROR",
            WorkerError::MissingCredential { .. } => "MISSING_CREDENTIAL",
            WorkerError::Bootstrap { .. } => "BOOTSTRAP_FAILED",
            WorkerError::Initialization { .. } => "INITIALIZATION_ERROR",
            WorkerError::AssetNotFound { .. } => "ASSET_NOT_FOUND",
            WorkerError::AssetFetch { .. } => "ASSET_FETCH_FAILED",
            WorkerError::AssetTransport { .. } => "ASSET_TRANSPORT_FAILED",
            WorkerError::AssetDecode { .. } => "ASSET_DECODE_FAILED",
            WorkerError::Inference { .. } => "INFERENCE_ERROR",
            WorkerError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            WorkerError::Export { .. } => "EXPORT_FAILED",
            WorkerError::Io(_) => "IO_ERROR",
            WorkerError::Json(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether a later job may succeed without operator action.
    ///
    /// `MissingCredential` needs the environment fixed; `Inference` is not
    /// retried automatically. Transient failures (network, filesystem, model
    /// load) are retryable on the next job.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WorkerError::Bootstrap { .. }
                | WorkerError::Initialization { .. }
                | WorkerError::AssetFetch { .. }
                | WorkerError::AssetTransport { .. }
                | WorkerError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = WorkerError::Validation {
            reason: "missing 'image_url'".to_string(),
        };
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err = WorkerError::AssetFetch {
            url: "http://x/img.png".to_string(),
            status: 404,
        };
        assert_eq!(err.error_code(), "ASSET_FETCH_FAILED");
    }

    #[test]
    fn test_retryability() {
        let err = WorkerError::Initialization {
            reason: "weights corrupt".to_string(),
        };
        assert!(err.is_retryable());

        let err = WorkerError::MissingCredential {
            variable: "HF_TOKEN".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_fetch_error_surfaces_status() {
        let err = WorkerError::AssetFetch {
            url: "http://x/img.png".to_string(),
            status: 503,
        };
        assert!(err.to_string().contains("503"));
    }
}
