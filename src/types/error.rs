use anyhow::Error;
use thiserror::Error;

/// Application-level error types for blobrm-rs.
///
/// These represent the fatal failure classes of a deletion run: the request
/// source could not be read, the configuration is invalid, or a storage
/// account's client could not be constructed. Per-item and per-chunk
/// deletion failures are never raised as errors; they are recorded in the
/// run's [`DeletionSummary`](crate::types::DeletionSummary).
///
/// ## Exit Codes
///
/// Each variant maps to an exit code (via `exit_code()`):
/// - 0: Non-error conditions (Cancelled)
/// - 1: General errors (Source, AccountSetup)
/// - 2: Configuration errors (InvalidConfig)
/// - 3: Partial failure (some blobs deleted, some failed)
#[derive(Error, Debug, PartialEq)]
pub enum BlobRmError {
    /// The request source could not be read at all.
    #[error("Request source error: {0}")]
    Source(String),

    /// Configuration error (non-retryable).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Client construction failed for one storage account.
    /// Aborts the entire run; accounts are not processed independently here.
    #[error("Client setup failed for storage account '{account}': {message}")]
    AccountSetup { account: String, message: String },

    /// Partial failure during deletion.
    #[error("Partial failure: {succeeded} deleted, {failed} failed")]
    PartialFailure { succeeded: u64, failed: u64 },

    /// Operation cancelled by user.
    #[error("Operation cancelled by user")]
    Cancelled,
}

impl BlobRmError {
    /// Get the appropriate process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            BlobRmError::Cancelled => 0,
            BlobRmError::InvalidConfig(_) => 2,
            BlobRmError::PartialFailure { .. } => 3,
            _ => 1,
        }
    }
}

/// Check if an anyhow::Error wraps a cancellation error.
pub fn is_cancelled_error(e: &Error) -> bool {
    if let Some(err) = e.downcast_ref::<BlobRmError>() {
        return *err == BlobRmError::Cancelled;
    }
    false
}

/// Extract the exit code from an anyhow::Error, defaulting to 1.
pub fn exit_code_from_error(e: &Error) -> i32 {
    if let Some(err) = e.downcast_ref::<BlobRmError>() {
        return err.exit_code();
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn is_cancelled_error_test() {
        assert!(is_cancelled_error(&anyhow!(BlobRmError::Cancelled)));
    }

    #[test]
    fn is_cancelled_error_false_for_other_errors() {
        assert!(!is_cancelled_error(&anyhow!(BlobRmError::Source(
            "test".to_string()
        ))));
        assert!(!is_cancelled_error(&anyhow!("generic error")));
    }

    #[test]
    fn exit_code_cancelled() {
        assert_eq!(BlobRmError::Cancelled.exit_code(), 0);
    }

    #[test]
    fn exit_code_invalid_config() {
        assert_eq!(BlobRmError::InvalidConfig("bad".to_string()).exit_code(), 2);
    }

    #[test]
    fn exit_code_partial_failure() {
        assert_eq!(
            BlobRmError::PartialFailure {
                succeeded: 90,
                failed: 10
            }
            .exit_code(),
            3
        );
    }

    #[test]
    fn exit_code_source_and_setup() {
        assert_eq!(BlobRmError::Source("missing file".to_string()).exit_code(), 1);
        assert_eq!(
            BlobRmError::AccountSetup {
                account: "account1".to_string(),
                message: "bad endpoint".to_string()
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn error_display_messages() {
        assert_eq!(
            BlobRmError::Source("file not found".to_string()).to_string(),
            "Request source error: file not found"
        );
        assert_eq!(
            BlobRmError::InvalidConfig("batch size".to_string()).to_string(),
            "Invalid configuration: batch size"
        );
        assert_eq!(
            BlobRmError::AccountSetup {
                account: "account1".to_string(),
                message: "invalid endpoint".to_string()
            }
            .to_string(),
            "Client setup failed for storage account 'account1': invalid endpoint"
        );
        assert_eq!(
            BlobRmError::PartialFailure {
                succeeded: 95,
                failed: 5
            }
            .to_string(),
            "Partial failure: 95 deleted, 5 failed"
        );
        assert_eq!(
            BlobRmError::Cancelled.to_string(),
            "Operation cancelled by user"
        );
    }

    #[test]
    fn exit_code_from_anyhow_error() {
        assert_eq!(exit_code_from_error(&anyhow!(BlobRmError::Cancelled)), 0);
        assert_eq!(
            exit_code_from_error(&anyhow!(BlobRmError::InvalidConfig("x".to_string()))),
            2
        );
        assert_eq!(
            exit_code_from_error(&anyhow!(BlobRmError::PartialFailure {
                succeeded: 1,
                failed: 1
            })),
            3
        );
        assert_eq!(exit_code_from_error(&anyhow!("unknown error")), 1);
    }
}
