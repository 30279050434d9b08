//! Error types for the QPT workspace
//!
//! Gantree: L0_Foundation → Errors
//!
//! One error enum shared by every crate. Core estimation failures
//! (`Domain`, `Fit`, `DimensionMismatch`) are never retried; only the
//! job layer produces transient errors.

// Error variant fields are self-documenting via error messages
#![allow(missing_docs)]

use thiserror::Error;

/// Main error type
/// Gantree: QptError // enum
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QptError {
    // ========================================================================
    // Estimation Errors
    // ========================================================================
    /// Degenerate input to resampling or fitting (e.g. a zero-count circuit)
    /// Gantree: Domain(String) // 정의역 오류
    #[error("Domain error: {0}")]
    Domain(String),

    /// Ill-posed tomography fit (informationally incomplete circuit set)
    /// Gantree: Fit(String) // 피팅 실패
    #[error("Fit error: {0}")]
    Fit(String),

    /// Qubit-count or width mismatch between two inputs
    /// Gantree: DimensionMismatch{{expected,found}} // 차원 불일치
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Matrix is not a valid unitary
    #[error("Invalid unitary: {0}")]
    InvalidUnitary(String),

    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Probability value out of range [0, 1]
    #[error("Invalid probability {0}: must be in range [0, 1]")]
    InvalidProbability(f64),

    /// Qubit index out of range
    #[error("Qubit {qubit} out of range: max is {max}")]
    QubitOutOfRange { qubit: usize, max: usize },

    /// Invalid bitstring format
    #[error("Invalid bitstring '{0}': must contain only '0' and '1'")]
    InvalidBitstring(String),

    /// Invalid basis character
    #[error("Invalid basis '{0}': must be X, Y, or Z")]
    InvalidBasis(String),

    /// Invalid preparation state label
    #[error("Invalid preparation state '{0}'")]
    InvalidPreparation(String),

    // ========================================================================
    // Circuit Errors
    // ========================================================================
    /// Empty circuit
    #[error("Circuit is empty")]
    EmptyCircuit,

    /// Gate on non-existent qubit
    #[error("Gate references qubit {qubit} but circuit has only {num_qubits} qubits")]
    GateQubitMismatch { qubit: usize, num_qubits: usize },

    /// Measurement into non-existent classical bit
    #[error("Measurement targets clbit {clbit} but circuit has only {num_clbits} clbits")]
    ClbitOutOfRange { clbit: usize, num_clbits: usize },

    /// Gate repeats a qubit operand
    #[error("Gate '{gate}' repeats qubit {qubit}")]
    DuplicateQubit { gate: String, qubit: usize },

    /// Invalid QASM format
    #[error("Invalid QASM: {0}")]
    InvalidQasm(String),

    // ========================================================================
    // Backend / Job Errors
    // ========================================================================
    /// Backend execution error
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Shots out of range
    #[error("Shots {0} out of range [{1}, {2}]")]
    ShotsOutOfRange(u64, u64, u64),

    /// Job id unknown to the runner
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Job finished unsuccessfully
    #[error("Job {job_id} failed: {reason}")]
    JobFailed { job_id: String, reason: String },

    /// Job did not finish in time
    #[error("Job {job_id} timed out after {seconds} seconds")]
    JobTimeout { job_id: String, seconds: u64 },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(String),

    /// File I/O error
    #[error("File error: {0}")]
    FileError(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type alias for QPT operations
/// Gantree: QptResult<T> // type alias
pub type QptResult<T> = Result<T, QptError>;

// ============================================================================
// Error Conversion Helpers
// ============================================================================

impl From<serde_json::Error> for QptError {
    fn from(err: serde_json::Error) -> Self {
        QptError::JsonError(err.to_string())
    }
}

impl From<std::io::Error> for QptError {
    fn from(err: std::io::Error) -> Self {
        QptError::FileError(err.to_string())
    }
}

// ============================================================================
// Error Helpers
// ============================================================================

impl QptError {
    /// Check if the error may succeed on retry (job layer only)
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            QptError::JobTimeout { .. } | QptError::BackendError(_)
        )
    }

    /// Check if error is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            QptError::InvalidProbability(_)
                | QptError::QubitOutOfRange { .. }
                | QptError::InvalidBitstring(_)
                | QptError::InvalidBasis(_)
                | QptError::InvalidPreparation(_)
                | QptError::Config(_)
        )
    }

    /// Check if error is a circuit error
    pub fn is_circuit_error(&self) -> bool {
        matches!(
            self,
            QptError::EmptyCircuit
                | QptError::GateQubitMismatch { .. }
                | QptError::ClbitOutOfRange { .. }
                | QptError::DuplicateQubit { .. }
                | QptError::InvalidQasm(_)
        )
    }

    /// Check if error aborts a fidelity estimate
    pub fn is_estimation_error(&self) -> bool {
        matches!(
            self,
            QptError::Domain(_) | QptError::Fit(_) | QptError::DimensionMismatch { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QptError::DimensionMismatch {
            expected: 3,
            found: 2,
        };
        assert!(err.to_string().contains("expected 3"));
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn test_estimation_errors_not_transient() {
        assert!(!QptError::Domain("zero counts".into()).is_transient());
        assert!(!QptError::Fit("rank deficient".into()).is_transient());
        assert!(QptError::JobTimeout {
            job_id: "job".into(),
            seconds: 10
        }
        .is_transient());
    }

    #[test]
    fn test_classification() {
        assert!(QptError::Fit("x".into()).is_estimation_error());
        assert!(QptError::InvalidBitstring("01a".into()).is_validation_error());
        assert!(QptError::EmptyCircuit.is_circuit_error());
        assert!(!QptError::BackendError("test".into()).is_validation_error());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: QptError = io.into();
        assert!(matches!(err, QptError::FileError(_)));
    }
}
