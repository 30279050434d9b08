//! Quantum gate definitions for QPT
//!
//! Gantree: L1_Circuit → Gate
//!
//! Gate enum covering the tomography preparation/measurement gates,
//! the H/T/CX Toffoli decompositions and the U3 layers of the
//! decomposition search. Every unitary gate knows its local matrix.
//!
//! Local matrix convention: operand `k` of the gate is bit `k` of the
//! local basis index (operand 0 least significant).

use crate::types::{Angle, Basis, ClbitId, QubitId};
use nalgebra::DMatrix;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};
use std::fmt;

/// Quantum gate enumeration
/// Gantree: Gate // 게이트 enum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    // ========================================================================
    // Single-Qubit Gates (Non-Parameterized)
    // ========================================================================
    /// Hadamard gate
    /// Gantree: H(QubitId) // 하다마드
    H(QubitId),

    /// Pauli-X gate (NOT)
    X(QubitId),

    /// Pauli-Y gate
    Y(QubitId),

    /// Pauli-Z gate
    Z(QubitId),

    /// S gate (sqrt(Z))
    S(QubitId),

    /// S-dagger gate
    Sdg(QubitId),

    /// T gate (fourth root of Z)
    T(QubitId),

    /// T-dagger gate
    Tdg(QubitId),

    /// SX gate (sqrt(X))
    Sx(QubitId),

    /// Identity gate
    Id(QubitId),

    // ========================================================================
    // Single-Qubit Parameterized Gates
    // ========================================================================
    /// Rotation around X-axis
    Rx(QubitId, Angle),

    /// Rotation around Y-axis
    Ry(QubitId, Angle),

    /// Rotation around Z-axis
    Rz(QubitId, Angle),

    /// General single-qubit rotation U3(θ, φ, λ)
    /// Gantree: U(QubitId, θ, φ, λ) // 범용 회전
    U(QubitId, Angle, Angle, Angle),

    /// Phase gate P(λ) = diag(1, e^{iλ})
    P(QubitId, Angle),

    // ========================================================================
    // Multi-Qubit Gates
    // ========================================================================
    /// Controlled-NOT (control, target)
    /// Gantree: CNOT(QubitId, QubitId) // ctrl, tgt
    Cnot(QubitId, QubitId),

    /// Controlled-Z
    Cz(QubitId, QubitId),

    /// SWAP gate
    Swap(QubitId, QubitId),

    /// Toffoli (control, control, target)
    /// Gantree: CCX(QubitId, QubitId, QubitId) // 토폴리
    Ccx(QubitId, QubitId, QubitId),

    // ========================================================================
    // Measurement and Control
    // ========================================================================
    /// Measure a qubit into a classical bit
    /// Gantree: Measure(QubitId, ClbitId) // 측정
    Measure(QubitId, ClbitId),

    /// Barrier (no-op for simulation)
    Barrier(Vec<QubitId>),
}

impl Gate {
    // ========================================================================
    // Gate Properties
    // ========================================================================

    /// Get qubits involved in this gate, in operand order
    /// Gantree: qubits(&self) -> Vec<QubitId> // 관련 큐비트
    pub fn qubits(&self) -> Vec<QubitId> {
        match self {
            Gate::H(q)
            | Gate::X(q)
            | Gate::Y(q)
            | Gate::Z(q)
            | Gate::S(q)
            | Gate::Sdg(q)
            | Gate::T(q)
            | Gate::Tdg(q)
            | Gate::Sx(q)
            | Gate::Id(q)
            | Gate::Rx(q, _)
            | Gate::Ry(q, _)
            | Gate::Rz(q, _)
            | Gate::U(q, _, _, _)
            | Gate::P(q, _)
            | Gate::Measure(q, _) => vec![*q],

            Gate::Cnot(a, b) | Gate::Cz(a, b) | Gate::Swap(a, b) => vec![*a, *b],

            Gate::Ccx(c1, c2, t) => vec![*c1, *c2, *t],

            Gate::Barrier(qs) => qs.clone(),
        }
    }

    /// Check if gate is single-qubit unitary
    pub fn is_single_qubit(&self) -> bool {
        self.is_unitary() && self.qubits().len() == 1
    }

    /// Check if gate is two-qubit
    pub fn is_two_qubit(&self) -> bool {
        matches!(self, Gate::Cnot(_, _) | Gate::Cz(_, _) | Gate::Swap(_, _))
    }

    /// Check if gate acts unitarily (everything except measure/barrier)
    pub fn is_unitary(&self) -> bool {
        !matches!(self, Gate::Measure(_, _) | Gate::Barrier(_))
    }

    /// Check if gate is measurement
    pub fn is_measurement(&self) -> bool {
        matches!(self, Gate::Measure(_, _))
    }

    /// Check if gate is a barrier
    pub fn is_barrier(&self) -> bool {
        matches!(self, Gate::Barrier(_))
    }

    /// Get gate name (OpenQASM mnemonic)
    pub fn name(&self) -> &'static str {
        match self {
            Gate::H(_) => "h",
            Gate::X(_) => "x",
            Gate::Y(_) => "y",
            Gate::Z(_) => "z",
            Gate::S(_) => "s",
            Gate::Sdg(_) => "sdg",
            Gate::T(_) => "t",
            Gate::Tdg(_) => "tdg",
            Gate::Sx(_) => "sx",
            Gate::Id(_) => "id",
            Gate::Rx(_, _) => "rx",
            Gate::Ry(_, _) => "ry",
            Gate::Rz(_, _) => "rz",
            Gate::U(_, _, _, _) => "u3",
            Gate::P(_, _) => "p",
            Gate::Cnot(_, _) => "cx",
            Gate::Cz(_, _) => "cz",
            Gate::Swap(_, _) => "swap",
            Gate::Ccx(_, _, _) => "ccx",
            Gate::Measure(_, _) => "measure",
            Gate::Barrier(_) => "barrier",
        }
    }

    /// Convert to OpenQASM 2.0 string
    /// Gantree: to_qasm(&self) -> String // QASM 변환
    pub fn to_qasm(&self) -> String {
        match self {
            Gate::Rx(q, a) | Gate::Ry(q, a) | Gate::Rz(q, a) | Gate::P(q, a) => {
                format!("{}({}) q[{}];", self.name(), a, q)
            }
            Gate::U(q, theta, phi, lambda) => {
                format!("u3({},{},{}) q[{}];", theta, phi, lambda, q)
            }
            Gate::Measure(q, c) => format!("measure q[{}] -> c[{}];", q, c),
            Gate::Barrier(qs) => {
                if qs.is_empty() {
                    "barrier q;".to_string()
                } else {
                    let qubits: Vec<String> = qs.iter().map(|q| format!("q[{}]", q)).collect();
                    format!("barrier {};", qubits.join(","))
                }
            }
            _ => {
                let qubits: Vec<String> =
                    self.qubits().iter().map(|q| format!("q[{}]", q)).collect();
                format!("{} {};", self.name(), qubits.join(","))
            }
        }
    }

    /// Same gate acting on remapped qubits (`map[old] = new`)
    pub fn remap(&self, map: &[QubitId]) -> Gate {
        let m = |q: &QubitId| map.get(*q).copied().unwrap_or(*q);
        match self {
            Gate::H(q) => Gate::H(m(q)),
            Gate::X(q) => Gate::X(m(q)),
            Gate::Y(q) => Gate::Y(m(q)),
            Gate::Z(q) => Gate::Z(m(q)),
            Gate::S(q) => Gate::S(m(q)),
            Gate::Sdg(q) => Gate::Sdg(m(q)),
            Gate::T(q) => Gate::T(m(q)),
            Gate::Tdg(q) => Gate::Tdg(m(q)),
            Gate::Sx(q) => Gate::Sx(m(q)),
            Gate::Id(q) => Gate::Id(m(q)),
            Gate::Rx(q, a) => Gate::Rx(m(q), *a),
            Gate::Ry(q, a) => Gate::Ry(m(q), *a),
            Gate::Rz(q, a) => Gate::Rz(m(q), *a),
            Gate::U(q, t, p, l) => Gate::U(m(q), *t, *p, *l),
            Gate::P(q, a) => Gate::P(m(q), *a),
            Gate::Cnot(a, b) => Gate::Cnot(m(a), m(b)),
            Gate::Cz(a, b) => Gate::Cz(m(a), m(b)),
            Gate::Swap(a, b) => Gate::Swap(m(a), m(b)),
            Gate::Ccx(a, b, c) => Gate::Ccx(m(a), m(b), m(c)),
            Gate::Measure(q, c) => Gate::Measure(m(q), *c),
            Gate::Barrier(qs) => Gate::Barrier(qs.iter().map(m).collect()),
        }
    }

    // ========================================================================
    // Matrices
    // ========================================================================

    /// Local unitary matrix (2^k × 2^k for k operands)
    ///
    /// `None` for measurement and barrier.
    /// Gantree: matrix(&self) -> Option<DMatrix<C64>> // 국소 행렬
    pub fn matrix(&self) -> Option<DMatrix<Complex64>> {
        let c = |re: f64, im: f64| Complex64::new(re, im);
        let one = c(1.0, 0.0);
        let zero = c(0.0, 0.0);
        let m2 = |a, b, cc, d| DMatrix::from_row_slice(2, 2, &[a, b, cc, d]);

        let mat = match self {
            Gate::H(_) => m2(
                c(FRAC_1_SQRT_2, 0.0),
                c(FRAC_1_SQRT_2, 0.0),
                c(FRAC_1_SQRT_2, 0.0),
                c(-FRAC_1_SQRT_2, 0.0),
            ),
            Gate::X(_) => m2(zero, one, one, zero),
            Gate::Y(_) => m2(zero, c(0.0, -1.0), c(0.0, 1.0), zero),
            Gate::Z(_) => m2(one, zero, zero, -one),
            Gate::S(_) => m2(one, zero, zero, c(0.0, 1.0)),
            Gate::Sdg(_) => m2(one, zero, zero, c(0.0, -1.0)),
            Gate::T(_) => m2(one, zero, zero, Complex64::from_polar(1.0, FRAC_PI_4)),
            Gate::Tdg(_) => m2(one, zero, zero, Complex64::from_polar(1.0, -FRAC_PI_4)),
            Gate::Sx(_) => m2(c(0.5, 0.5), c(0.5, -0.5), c(0.5, -0.5), c(0.5, 0.5)),
            Gate::Id(_) => DMatrix::identity(2, 2),
            Gate::Rx(_, theta) => {
                let (s, co) = (theta / 2.0).sin_cos();
                m2(c(co, 0.0), c(0.0, -s), c(0.0, -s), c(co, 0.0))
            }
            Gate::Ry(_, theta) => {
                let (s, co) = (theta / 2.0).sin_cos();
                m2(c(co, 0.0), c(-s, 0.0), c(s, 0.0), c(co, 0.0))
            }
            Gate::Rz(_, theta) => m2(
                Complex64::from_polar(1.0, -theta / 2.0),
                zero,
                zero,
                Complex64::from_polar(1.0, theta / 2.0),
            ),
            Gate::U(_, theta, phi, lambda) => u3_matrix(*theta, *phi, *lambda),
            Gate::P(_, lambda) => m2(one, zero, zero, Complex64::from_polar(1.0, *lambda)),
            Gate::Cnot(_, _) => permutation_matrix(4, |i| if i & 1 == 1 { i ^ 2 } else { i }),
            Gate::Cz(_, _) => {
                let mut m = DMatrix::identity(4, 4);
                m[(3, 3)] = -one;
                m
            }
            Gate::Swap(_, _) => permutation_matrix(4, |i| ((i & 1) << 1) | ((i >> 1) & 1)),
            Gate::Ccx(_, _, _) => permutation_matrix(8, |i| if i & 3 == 3 { i ^ 4 } else { i }),
            Gate::Measure(_, _) | Gate::Barrier(_) => return None,
        };
        Some(mat)
    }

    // ========================================================================
    // Basis Helpers
    // ========================================================================

    /// Basis-change gates applied before a Z measurement
    /// X basis: H
    /// Y basis: Sdg, H
    /// Z basis: (none)
    pub fn basis_transform(qubit: QubitId, basis: Basis) -> Vec<Gate> {
        match basis {
            Basis::X => vec![Gate::H(qubit)],
            Basis::Y => vec![Gate::Sdg(qubit), Gate::H(qubit)],
            Basis::Z => vec![],
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_qasm())
    }
}

/// U3(θ, φ, λ) matrix
pub fn u3_matrix(theta: f64, phi: f64, lambda: f64) -> DMatrix<Complex64> {
    let (s, c) = (theta / 2.0).sin_cos();
    DMatrix::from_row_slice(
        2,
        2,
        &[
            Complex64::new(c, 0.0),
            -Complex64::from_polar(s, lambda),
            Complex64::from_polar(s, phi),
            Complex64::from_polar(c, phi + lambda),
        ],
    )
}

/// Permutation matrix with `|i⟩ → |f(i)⟩`
fn permutation_matrix(dim: usize, f: impl Fn(usize) -> usize) -> DMatrix<Complex64> {
    let mut m = DMatrix::zeros(dim, dim);
    for i in 0..dim {
        m[(f(i), i)] = Complex64::new(1.0, 0.0);
    }
    m
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn is_unitary(m: &DMatrix<Complex64>) -> bool {
        let prod = m.adjoint() * m;
        let id = DMatrix::<Complex64>::identity(m.nrows(), m.ncols());
        (prod - id).norm() < 1e-12
    }

    #[test]
    fn test_gate_qubits() {
        assert_eq!(Gate::H(0).qubits(), vec![0]);
        assert_eq!(Gate::Cnot(0, 1).qubits(), vec![0, 1]);
        assert_eq!(Gate::Ccx(0, 1, 2).qubits(), vec![0, 1, 2]);
        assert_eq!(Gate::Measure(2, 0).qubits(), vec![2]);
    }

    #[test]
    fn test_gate_classification() {
        assert!(Gate::H(0).is_single_qubit());
        assert!(Gate::Cnot(0, 1).is_two_qubit());
        assert!(!Gate::Measure(0, 0).is_unitary());
        assert!(!Gate::Barrier(vec![0]).is_single_qubit());
    }

    #[test]
    fn test_gate_to_qasm() {
        assert_eq!(Gate::H(0).to_qasm(), "h q[0];");
        assert_eq!(Gate::Cnot(0, 1).to_qasm(), "cx q[0],q[1];");
        assert_eq!(Gate::Ccx(0, 1, 2).to_qasm(), "ccx q[0],q[1],q[2];");
        assert_eq!(Gate::Measure(2, 1).to_qasm(), "measure q[2] -> c[1];");
        assert_eq!(Gate::Rz(0, 0.5).to_qasm(), "rz(0.5) q[0];");
    }

    #[test]
    fn test_all_matrices_unitary() {
        let gates = [
            Gate::H(0),
            Gate::Y(0),
            Gate::S(0),
            Gate::T(0),
            Gate::Tdg(0),
            Gate::Sx(0),
            Gate::Rx(0, 0.3),
            Gate::Ry(0, 1.1),
            Gate::Rz(0, -0.7),
            Gate::U(0, 0.4, 1.2, -2.0),
            Gate::Cnot(0, 1),
            Gate::Cz(0, 1),
            Gate::Swap(0, 1),
            Gate::Ccx(0, 1, 2),
        ];
        for g in &gates {
            let m = g.matrix().unwrap();
            assert_eq!(m.nrows(), 1 << g.qubits().len());
            assert!(is_unitary(&m), "{} not unitary", g.name());
        }
        assert!(Gate::Measure(0, 0).matrix().is_none());
    }

    #[test]
    fn test_cnot_flips_target_when_control_set() {
        let m = Gate::Cnot(0, 1).matrix().unwrap();
        // local index = control + 2*target
        assert_abs_diff_eq!(m[(3, 1)].re, 1.0);
        assert_abs_diff_eq!(m[(1, 3)].re, 1.0);
        assert_abs_diff_eq!(m[(0, 0)].re, 1.0);
        assert_abs_diff_eq!(m[(2, 2)].re, 1.0);
    }

    #[test]
    fn test_u3_special_cases() {
        // U3(π/2, 0, π) = H
        let u = u3_matrix(std::f64::consts::PI / 2.0, 0.0, std::f64::consts::PI);
        let h = Gate::H(0).matrix().unwrap();
        assert!((u - h).norm() < 1e-12);
    }

    #[test]
    fn test_basis_transform() {
        assert_eq!(Gate::basis_transform(0, Basis::X), vec![Gate::H(0)]);
        assert_eq!(
            Gate::basis_transform(1, Basis::Y),
            vec![Gate::Sdg(1), Gate::H(1)]
        );
        assert!(Gate::basis_transform(0, Basis::Z).is_empty());
    }

    #[test]
    fn test_remap() {
        let g = Gate::Ccx(0, 1, 2).remap(&[4, 5, 6]);
        assert_eq!(g, Gate::Ccx(4, 5, 6));
    }
}
