//! Gate fidelity against a target unitary
//!
//! Gantree: L3_Tomography → FidelityEvaluator
//!
//! `F_pro = Tr(R_Uᵀ R_E) / d²` and `F_avg = (d·F_pro + 1) / (d + 1)`, both
//! clamped to [0, 1] since an unconstrained fit may overshoot slightly.

use crate::process::ProcessMatrix;
use qpt_core::{
    circuit_unitary, is_unitary, toffoli_matrix, CMatrix, Circuit, QptError, QptResult, QubitId,
};

// ============================================================================
// Target Unitary
// ============================================================================

/// Validated ideal operation
/// Gantree: TargetUnitary // 목표 유니터리
#[derive(Debug, Clone, PartialEq)]
pub struct TargetUnitary {
    num_qubits: usize,
    matrix: CMatrix,
}

impl TargetUnitary {
    /// Toffoli with controls on local qubits 0 and 1, target on 2
    pub fn toffoli() -> Self {
        Self {
            num_qubits: 3,
            matrix: toffoli_matrix(),
        }
    }

    /// Validate a square, power-of-two, unitary matrix
    pub fn from_matrix(matrix: CMatrix) -> QptResult<Self> {
        let dim = matrix.nrows();
        if matrix.ncols() != dim {
            return Err(QptError::InvalidUnitary(format!(
                "matrix is {}x{}, not square",
                dim,
                matrix.ncols()
            )));
        }
        if dim < 2 || !dim.is_power_of_two() {
            return Err(QptError::InvalidUnitary(format!(
                "dimension {} is not a power of two",
                dim
            )));
        }
        if !is_unitary(&matrix) {
            return Err(QptError::InvalidUnitary("U†U differs from I".into()));
        }
        Ok(Self {
            num_qubits: dim.trailing_zeros() as usize,
            matrix,
        })
    }

    /// Unitary of a gate-level circuit restricted to `qubits`
    pub fn from_circuit(circuit: &Circuit, qubits: &[QubitId]) -> QptResult<Self> {
        Self::from_matrix(circuit_unitary(circuit, qubits)?)
    }

    /// Number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Dimension d = 2^n
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// Matrix
    pub fn matrix(&self) -> &CMatrix {
        &self.matrix
    }

    /// Pauli transfer matrix of the unitary channel
    pub fn ptm(&self) -> QptResult<ProcessMatrix> {
        ProcessMatrix::from_unitary(&self.matrix)
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Fidelity evaluator with the target PTM cached
/// Gantree: FidelityEvaluator // 충실도 평가기
#[derive(Debug, Clone)]
pub struct FidelityEvaluator {
    target: TargetUnitary,
    target_ptm: ProcessMatrix,
}

impl FidelityEvaluator {
    /// Build the evaluator for a target
    pub fn new(target: TargetUnitary) -> QptResult<Self> {
        let target_ptm = target.ptm()?;
        Ok(Self { target, target_ptm })
    }

    /// Target unitary
    pub fn target(&self) -> &TargetUnitary {
        &self.target
    }

    /// Process (entanglement) fidelity
    /// Gantree: process_fidelity(channel) -> Result<f64> // 프로세스 충실도
    pub fn process_fidelity(&self, channel: &ProcessMatrix) -> QptResult<f64> {
        if channel.num_qubits() != self.target.num_qubits() {
            return Err(QptError::DimensionMismatch {
                expected: self.target.num_qubits(),
                found: channel.num_qubits(),
            });
        }
        Ok(self.target_ptm.overlap(channel)?.clamp(0.0, 1.0))
    }

    /// Average gate fidelity
    /// Gantree: average_gate_fidelity(channel) -> Result<f64> // 평균 게이트 충실도
    pub fn average_gate_fidelity(&self, channel: &ProcessMatrix) -> QptResult<f64> {
        let d = self.target.dim() as f64;
        let f_pro = self.process_fidelity(channel)?;
        Ok(((d * f_pro + 1.0) / (d + 1.0)).clamp(0.0, 1.0))
    }
}

/// Average gate fidelity of `channel` against `target`
pub fn average_gate_fidelity(channel: &ProcessMatrix, target: &TargetUnitary) -> QptResult<f64> {
    FidelityEvaluator::new(target.clone())?.average_gate_fidelity(channel)
}

/// Process fidelity of `channel` against `target`
pub fn process_fidelity(channel: &ProcessMatrix, target: &TargetUnitary) -> QptResult<f64> {
    FidelityEvaluator::new(target.clone())?.process_fidelity(channel)
}

// ============================================================================
// Tests
// ============================================================================
