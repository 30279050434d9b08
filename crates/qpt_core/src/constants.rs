//! Constants for QPT
//!
//! Gantree: L0_Foundation → Constants
//!
//! Statistical thresholds, tomography sizes, job-layer limits and
//! gate-search parameters.

// ============================================================================
// Statistics Constants
// Gantree: stats // 통계 상수
// ============================================================================

pub mod stats {
    //! Statistical constants for confidence intervals

    /// Z critical value for 90% confidence
    pub const Z_CRIT_90: f64 = 1.645;

    /// Z critical value for 95% confidence
    /// Gantree: Z_CRIT_95: f64 = 1.960
    pub const Z_CRIT_95: f64 = 1.960;

    /// Z critical value for 99% confidence
    pub const Z_CRIT_99: f64 = 2.575;

    /// Default number of shots per tomography circuit
    /// Gantree: DEFAULT_SHOTS: u64 = 8192
    pub const DEFAULT_SHOTS: u64 = 8192;

    /// Minimum shots accepted by the simulator
    pub const MIN_SHOTS: u64 = 1;

    /// Maximum shots accepted by the simulator
    pub const MAX_SHOTS: u64 = 100_000;

    /// Default number of Monte Carlo trials
    pub const DEFAULT_TRIALS: usize = 100;

    /// Get z-critical value for a given two-sided confidence level
    pub fn z_critical(confidence: f64) -> f64 {
        if confidence >= 0.99 {
            Z_CRIT_99
        } else if confidence >= 0.95 {
            Z_CRIT_95
        } else {
            Z_CRIT_90
        }
    }
}

// ============================================================================
// Tomography Constants
// Gantree: tomography // 토모그래피 상수
// ============================================================================

pub mod tomography {
    //! Sizes of the process-tomography circuit family

    /// Number of qubits of a Toffoli gate
    pub const TOFFOLI_QUBITS: usize = 3;

    /// Preparation states per qubit in the minimal basis
    pub const PREP_STATES_MINIMAL: usize = 4;

    /// Preparation states per qubit in the overcomplete basis
    pub const PREP_STATES_OVERCOMPLETE: usize = 6;

    /// Measurement bases per qubit
    pub const MEAS_BASES: usize = 3;

    /// Largest target register supported by the dense fitter
    pub const MAX_TARGET_QUBITS: usize = 5;

    /// Numerical tolerance for unitarity and CP checks
    pub const TOLERANCE: f64 = 1e-9;

    /// Number of circuits for `k` target qubits and a prep basis size
    pub fn circuit_count(k: usize, prep_states: usize) -> usize {
        prep_states.pow(k as u32) * MEAS_BASES.pow(k as u32)
    }
}

// ============================================================================
// Job Constants
// Gantree: job // 작업 상수
// ============================================================================

pub mod job {
    //! Job-layer limits

    /// Maximum circuits per submitted job before the batch is split
    pub const MAX_CIRCUITS_PER_JOB: usize = 300;

    /// Default polling interval (milliseconds)
    pub const DEFAULT_POLL_MS: u64 = 50;

    /// Default retrieval timeout (seconds)
    pub const DEFAULT_TIMEOUT_S: u64 = 600;
}

// ============================================================================
// Gate Search Constants
// Gantree: search // 탐색 상수
// ============================================================================

pub mod search {
    //! Toffoli decomposition search parameters

    /// Distance below which a structure is reported
    pub const DISTANCE_THRESHOLD: f64 = 0.01;

    /// Structures explored per rank
    pub const STRUCTURES_PER_RANK: usize = 16;

    /// Default multi-qubit layers
    pub const DEFAULT_LAYERS: usize = 6;

    /// Default optimizer restarts per structure
    pub const DEFAULT_RESTARTS: usize = 20;

    /// Parameters of one U3 layer over `n` qubits
    pub const fn layer_params(n: usize) -> usize {
        3 * n
    }

    /// Total parameters for `n` qubits and `layers` multi-qubit layers
    pub const fn num_params(n: usize, layers: usize) -> usize {
        3 * n * (layers + 1)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_z_critical() {
        assert_eq!(stats::z_critical(0.95), stats::Z_CRIT_95);
        assert_eq!(stats::z_critical(0.99), stats::Z_CRIT_99);
        assert_eq!(stats::z_critical(0.9), stats::Z_CRIT_90);
    }

    #[test]
    fn test_circuit_count() {
        assert_eq!(tomography::circuit_count(3, 4), 1728);
        assert_eq!(tomography::circuit_count(1, 6), 18);
    }

    #[test]
    fn test_search_params() {
        assert_eq!(search::num_params(3, 6), 63);
        assert_eq!(search::layer_params(3), 9);
    }
}
