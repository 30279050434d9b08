//! Backend execution types and traits
//!
//! Gantree: L2_Backend → BackendTrait
//!
//! Defines the interface for quantum backend execution.

use qpt_core::{Circuit, Counts, QptResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of circuit execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement counts (bitstring -> count)
    pub counts: Counts,

    /// Number of shots executed
    pub shots: u64,

    /// Execution metadata
    pub metadata: ExecutionMetadata,
}

/// Execution metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Backend name
    pub backend: String,

    /// Name of the executed circuit, as submitted
    pub circuit_name: Option<String>,

    /// Job ID (if applicable)
    pub job_id: Option<String>,

    /// Execution time in milliseconds
    pub execution_time_ms: Option<u64>,

    /// Whether simulation was used
    pub simulated: bool,

    /// Seed used (if any)
    pub seed: Option<u64>,
}

impl ExecutionResult {
    /// Create new execution result
    pub fn new(counts: Counts, shots: u64, backend: &str) -> Self {
        Self {
            counts,
            shots,
            metadata: ExecutionMetadata {
                backend: backend.to_string(),
                simulated: true,
                ..Default::default()
            },
        }
    }

    /// Attach the executed circuit's name
    pub fn with_circuit_name(mut self, name: Option<&str>) -> Self {
        self.metadata.circuit_name = name.map(str::to_string);
        self
    }

    /// Get total count (should equal shots)
    pub fn total_counts(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Get probability of a specific bitstring
    pub fn probability(&self, bitstring: &str) -> f64 {
        let total = self.total_counts();
        if total == 0 {
            return 0.0;
        }
        let count = self.counts.get(bitstring).copied().unwrap_or(0);
        count as f64 / total as f64
    }

    /// Get most frequent bitstring
    pub fn most_frequent(&self) -> Option<(&String, u64)> {
        self.counts
            .iter()
            .max_by_key(|(_, &count)| count)
            .map(|(bs, &count)| (bs, count))
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExecutionResult(circuit={}, shots={}, unique={})",
            self.metadata.circuit_name.as_deref().unwrap_or("-"),
            self.shots,
            self.counts.len()
        )
    }
}

/// Quantum backend trait
/// Gantree: BackendTrait // 백엔드 인터페이스
pub trait Backend: Send + Sync {
    /// Get backend name
    fn name(&self) -> &str;

    /// Get number of qubits
    fn num_qubits(&self) -> usize;

    /// Execute a circuit
    /// Gantree: execute(circuit, shots) -> Result<ExecutionResult>
    fn execute(&self, circuit: &Circuit, shots: u64) -> QptResult<ExecutionResult>;

    /// Execute multiple circuits (batch), results in submission order
    fn execute_batch(&self, circuits: &[Circuit], shots: u64) -> QptResult<Vec<ExecutionResult>> {
        circuits.iter().map(|c| self.execute(c, shots)).collect()
    }

    /// Check if backend is simulator
    fn is_simulator(&self) -> bool {
        true
    }

    /// Get maximum shots per execution
    fn max_shots(&self) -> u64 {
        qpt_core::stats::MAX_SHOTS
    }
}

// ============================================================================
// Tests
// ============================================================================
