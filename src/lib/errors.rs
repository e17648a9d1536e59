//! Custom error types for fgalign operations.

use thiserror::Error;

/// Result type alias for fgalign operations
pub type Result<T> = std::result::Result<T, FgalignError>;

/// Error type for fgalign operations
#[derive(Error, Debug)]
pub enum FgalignError {
    /// The work queue no longer accepts submissions (finalized or poisoned)
    #[error("work queue is closed to new submissions")]
    QueueClosed,

    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "BAM", "FASTA")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// Required reference sequence not found
    #[error("Reference sequence '{ref_name}' not found")]
    ReferenceNotFound {
        /// The reference sequence name
        ref_name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_closed_message() {
        let err = FgalignError::QueueClosed;
        assert_eq!(err.to_string(), "work queue is closed to new submissions");
    }

    #[test]
    fn test_invalid_parameter_message() {
        let err = FgalignError::InvalidParameter {
            parameter: "min-concordance".to_string(),
            reason: "must be between 0 and 1".to_string(),
        };
        assert!(err.to_string().contains("min-concordance"));
        assert!(err.to_string().contains("between 0 and 1"));
    }

    #[test]
    fn test_invalid_file_format_message() {
        let err = FgalignError::InvalidFileFormat {
            file_type: "BAM".to_string(),
            path: "/tmp/missing.bam".to_string(),
            reason: "File does not exist".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("BAM"));
        assert!(msg.contains("/tmp/missing.bam"));
    }
}
