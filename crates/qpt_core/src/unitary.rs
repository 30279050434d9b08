//! Dense unitaries of gates and circuits
//!
//! Gantree: L1_Circuit → Unitary
//!
//! Register convention: qubit `k` of an n-qubit register is bit `k` of the
//! basis-state index, so the state label printed with qubit 0 rightmost is
//! the binary form of the index.

use crate::circuit::Circuit;
use crate::constants::tomography::TOLERANCE;
use crate::error::{QptError, QptResult};
use crate::gate::Gate;
use crate::types::QubitId;
use nalgebra::DMatrix;
use num_complex::Complex64;

/// Complex square matrix used for unitaries, states and channels
pub type CMatrix = DMatrix<Complex64>;

/// Embed a local k-qubit operator acting on `operands` into an n-qubit register
/// Gantree: embed(local, operands, n) -> CMatrix // 레지스터 확장
pub fn embed(local: &CMatrix, operands: &[QubitId], n: usize) -> QptResult<CMatrix> {
    let k = operands.len();
    if local.nrows() != 1 << k || local.ncols() != 1 << k {
        return Err(QptError::DimensionMismatch {
            expected: 1 << k,
            found: local.nrows(),
        });
    }
    if let Some(&q) = operands.iter().find(|&&q| q >= n) {
        return Err(QptError::QubitOutOfRange { qubit: q, max: n });
    }

    let dim = 1usize << n;
    let op_mask: usize = operands.iter().map(|&q| 1usize << q).sum();
    let local_index = |i: usize| -> usize {
        operands
            .iter()
            .enumerate()
            .map(|(bit, &q)| ((i >> q) & 1) << bit)
            .sum()
    };

    let mut full = CMatrix::zeros(dim, dim);
    for col in 0..dim {
        let rest = col & !op_mask;
        let lc = local_index(col);
        for lr in 0..(1usize << k) {
            let row = operands
                .iter()
                .enumerate()
                .fold(rest, |acc, (bit, &q)| acc | (((lr >> bit) & 1) << q));
            full[(row, col)] = local[(lr, lc)];
        }
    }
    Ok(full)
}

/// Full-register unitary of a single gate
pub fn gate_unitary(gate: &Gate, n: usize) -> QptResult<CMatrix> {
    let local = gate.matrix().ok_or_else(|| {
        QptError::InvalidUnitary(format!("'{}' is not a unitary operation", gate.name()))
    })?;
    embed(&local, &gate.qubits(), n)
}

/// Unitary of a circuit restricted to `qubits` (qubits[j] becomes local qubit j)
///
/// Barriers are ignored. Measurements, and gates on qubits outside the list,
/// are rejected.
/// Gantree: circuit_unitary(circuit, qubits) -> CMatrix // 회로 유니터리
pub fn circuit_unitary(circuit: &Circuit, qubits: &[QubitId]) -> QptResult<CMatrix> {
    let n = qubits.len();
    let mut map = vec![usize::MAX; circuit.num_qubits()];
    for (local, &q) in qubits.iter().enumerate() {
        let slot = map.get_mut(q).ok_or(QptError::QubitOutOfRange {
            qubit: q,
            max: circuit.num_qubits(),
        })?;
        *slot = local;
    }

    let mut u = CMatrix::identity(1 << n, 1 << n);
    for gate in circuit.gates().iter().filter(|g| !g.is_barrier()) {
        if let Some(&q) = gate.qubits().iter().find(|&&q| map[q] == usize::MAX) {
            return Err(QptError::InvalidUnitary(format!(
                "'{}' acts on qubit {} outside the target register",
                gate.name(),
                q
            )));
        }
        let local_gate = gate.remap(&map);
        u = gate_unitary(&local_gate, n)? * u;
    }
    Ok(u)
}

/// Toffoli matrix with controls on qubits 0 and 1, target on qubit 2
pub fn toffoli_matrix() -> CMatrix {
    Gate::Ccx(0, 1, 2)
        .matrix()
        .unwrap_or_else(|| CMatrix::identity(8, 8))
}

/// Check U†U = I within tolerance
pub fn is_unitary(m: &CMatrix) -> bool {
    if m.nrows() != m.ncols() {
        return false;
    }
    let id = CMatrix::identity(m.nrows(), m.ncols());
    (m.adjoint() * m - id).norm() < TOLERANCE.sqrt()
}

/// |Tr(A†B)| / d, equal to 1 iff A and B agree up to global phase
pub fn phase_insensitive_overlap(a: &CMatrix, b: &CMatrix) -> f64 {
    let d = a.nrows() as f64;
    (a.adjoint() * b).trace().norm() / d
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CircuitBuilder;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_embed_x_on_qubit_one() {
        let u = gate_unitary(&Gate::X(1), 2).unwrap();
        // |00⟩ → |10⟩ (index 0 → 2)
        assert_abs_diff_eq!(u[(2, 0)].re, 1.0);
        assert_abs_diff_eq!(u[(0, 0)].re, 0.0);
    }

    #[test]
    fn test_cnot_reversed_operands() {
        // control 1, target 0: |10⟩ (index 2) → |11⟩ (index 3)
        let u = gate_unitary(&Gate::Cnot(1, 0), 2).unwrap();
        assert_abs_diff_eq!(u[(3, 2)].re, 1.0);
        assert_abs_diff_eq!(u[(1, 1)].re, 1.0);
    }

    #[test]
    fn test_canonical_decompositions_equal_toffoli() {
        let target = toffoli_matrix();
        for circuit in [
            CircuitBuilder::new(3).canonical_full_toffoli([0, 1, 2]).build(),
            CircuitBuilder::new(3).canonical_linear_toffoli([0, 1, 2]).build(),
        ] {
            let u = circuit_unitary(&circuit, &[0, 1, 2]).unwrap();
            assert!(is_unitary(&u));
            assert_abs_diff_eq!(phase_insensitive_overlap(&target, &u), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_restricted_register() {
        let circuit = CircuitBuilder::new(5).ccx(2, 3, 4).barrier().build();
        let u = circuit_unitary(&circuit, &[2, 3, 4]).unwrap();
        assert!((u - toffoli_matrix()).norm() < 1e-12);
    }

    #[test]
    fn test_outside_register_rejected() {
        let circuit = CircuitBuilder::new(3).h(0).cx(0, 2).build();
        assert!(matches!(
            circuit_unitary(&circuit, &[0, 1]),
            Err(QptError::InvalidUnitary(_))
        ));
        let measured = CircuitBuilder::new(1).measure(0, 0).build();
        assert!(circuit_unitary(&measured, &[0]).is_err());
    }
}
