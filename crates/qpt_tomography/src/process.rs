//! Process matrices
//!
//! Gantree: L3_Tomography → ProcessMatrix
//!
//! A channel on n qubits is stored as its real Pauli transfer matrix
//! `R[P,Q] = Tr(P E(Q)) / d`, d = 2^n. The Choi matrix
//! `Λ = (1/d) Σ R[P,Q] Qᵀ⊗P` (input factor first) is used for the
//! complete-positivity check and projection.

use crate::pauli::{Monomial, PauliString};
use nalgebra::{DMatrix, SymmetricEigen};
use num_complex::Complex64;
use qpt_core::tomography::{MAX_TARGET_QUBITS, TOLERANCE};
use qpt_core::{CMatrix, QptError, QptResult};

/// Reconstructed or ideal quantum channel
/// Gantree: ProcessMatrix // 프로세스 행렬 (PTM)
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessMatrix {
    num_qubits: usize,
    ptm: DMatrix<f64>,
}

impl ProcessMatrix {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create from a 4^n × 4^n Pauli transfer matrix
    pub fn new(num_qubits: usize, ptm: DMatrix<f64>) -> QptResult<Self> {
        if num_qubits > MAX_TARGET_QUBITS {
            return Err(QptError::Config(format!(
                "{} qubits exceeds the limit of {}",
                num_qubits, MAX_TARGET_QUBITS
            )));
        }
        let n = 1usize << (2 * num_qubits);
        if ptm.nrows() != n || ptm.ncols() != n {
            return Err(QptError::DimensionMismatch {
                expected: n,
                found: ptm.nrows(),
            });
        }
        Ok(Self { num_qubits, ptm })
    }

    /// Identity channel
    pub fn identity(num_qubits: usize) -> Self {
        let n = 1usize << (2 * num_qubits);
        Self {
            num_qubits,
            ptm: DMatrix::identity(n, n),
        }
    }

    /// Depolarizing channel `ρ → (1-p)ρ + p·I/d`
    pub fn depolarizing(num_qubits: usize, p: f64) -> Self {
        let mut ptm = Self::identity(num_qubits).ptm * (1.0 - p);
        ptm[(0, 0)] = 1.0;
        Self { num_qubits, ptm }
    }

    /// Unitary channel `ρ → UρU†`
    /// Gantree: from_unitary(U) -> Result<Self> // 유니터리 PTM
    pub fn from_unitary(u: &CMatrix) -> QptResult<Self> {
        let num_qubits = register_size(u.nrows())?;
        let dim = u.nrows();
        let n = dim * dim;
        let paulis: Vec<Monomial> = (0..n)
            .map(|i| PauliString::from_index(i, num_qubits).monomial())
            .collect();

        let mut ptm = DMatrix::zeros(n, n);
        for (qi, q) in paulis.iter().enumerate() {
            // M = U Q U†
            let m = u * monomial_matrix(q, dim) * u.adjoint();
            for (pi, p) in paulis.iter().enumerate() {
                // Tr(P M) = Σ_k P[k⊕x, k] M[k, k⊕x]
                let tr: Complex64 = (0..dim)
                    .map(|k| {
                        let (row, phase) = p.apply(k);
                        phase * m[(k, row)]
                    })
                    .sum();
                ptm[(pi, qi)] = tr.re / dim as f64;
            }
        }
        Ok(Self { num_qubits, ptm })
    }

    /// Channel from a Choi matrix
    pub fn from_choi(num_qubits: usize, choi: &CMatrix) -> QptResult<Self> {
        let dim = 1usize << num_qubits;
        let n = dim * dim;
        if choi.nrows() != n || choi.ncols() != n {
            return Err(QptError::DimensionMismatch {
                expected: n,
                found: choi.nrows(),
            });
        }
        let paulis: Vec<(Monomial, f64)> = (0..n)
            .map(|i| {
                let p = PauliString::from_index(i, num_qubits);
                (p.monomial(), transpose_sign(&p))
            })
            .collect();

        // R[P,Q] = Re Tr((Qᵀ⊗P) Λ) / d
        let mut ptm = DMatrix::zeros(n, n);
        for (qi, (q, q_sign)) in paulis.iter().enumerate() {
            for (pi, (p, _)) in paulis.iter().enumerate() {
                let mut tr = Complex64::new(0.0, 0.0);
                for col in 0..n {
                    let (a, b) = (col / dim, col % dim);
                    let (ra, pa) = q.apply(a);
                    let (rb, pb) = p.apply(b);
                    // (Qᵀ⊗P)[row, col] with row = (ra, rb); Qᵀ = ±Q entrywise
                    let entry = pa * pb * *q_sign;
                    tr += entry * choi[(col, ra * dim + rb)];
                }
                ptm[(pi, qi)] = tr.re / dim as f64;
            }
        }
        Ok(Self { num_qubits, ptm })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Hilbert space dimension d
    pub fn dim(&self) -> usize {
        1 << self.num_qubits
    }

    /// Pauli transfer matrix
    pub fn ptm(&self) -> &DMatrix<f64> {
        &self.ptm
    }

    /// Entry R[P,Q]
    pub fn get(&self, p: usize, q: usize) -> f64 {
        self.ptm[(p, q)]
    }

    /// Process fidelity against another channel, Tr(Aᵀ B)/d²
    pub fn overlap(&self, other: &ProcessMatrix) -> QptResult<f64> {
        if self.num_qubits != other.num_qubits {
            return Err(QptError::DimensionMismatch {
                expected: self.num_qubits,
                found: other.num_qubits,
            });
        }
        let d2 = (self.dim() * self.dim()) as f64;
        Ok(self.ptm.dot(&other.ptm) / d2)
    }

    // ========================================================================
    // Physicality
    // ========================================================================

    /// First row equals (1, 0, …, 0)
    pub fn is_trace_preserving(&self, tol: f64) -> bool {
        self.ptm
            .row(0)
            .iter()
            .enumerate()
            .all(|(i, &v)| (v - if i == 0 { 1.0 } else { 0.0 }).abs() <= tol)
    }

    /// Choi matrix `Λ = (1/d) Σ R[P,Q] Qᵀ⊗P`, trace d
    /// Gantree: choi() -> CMatrix // Choi 행렬
    pub fn choi(&self) -> CMatrix {
        let dim = self.dim();
        let n = dim * dim;
        let paulis: Vec<(Monomial, f64)> = (0..n)
            .map(|i| {
                let p = PauliString::from_index(i, self.num_qubits);
                (p.monomial(), transpose_sign(&p))
            })
            .collect();

        let mut choi = CMatrix::zeros(n, n);
        for (qi, (q, q_sign)) in paulis.iter().enumerate() {
            for (pi, (p, _)) in paulis.iter().enumerate() {
                let r = self.ptm[(pi, qi)];
                if r == 0.0 {
                    continue;
                }
                let scale = r * q_sign / dim as f64;
                for a in 0..dim {
                    let (ra, pa) = q.apply(a);
                    for b in 0..dim {
                        let (rb, pb) = p.apply(b);
                        choi[(ra * dim + rb, a * dim + b)] += pa * pb * scale;
                    }
                }
            }
        }
        choi
    }

    /// Eigenvalues of the Choi matrix, ascending
    pub fn choi_eigenvalues(&self) -> Vec<f64> {
        let mut values: Vec<f64> = SymmetricEigen::new(hermitian_part(&self.choi()))
            .eigenvalues
            .iter()
            .copied()
            .collect();
        values.sort_by(f64::total_cmp);
        values
    }

    /// Choi matrix is positive semidefinite within `tol`
    pub fn is_completely_positive(&self, tol: f64) -> bool {
        self.choi_eigenvalues().first().map_or(true, |&v| v >= -tol)
    }

    /// Nearest CP channel by eigenvalue clipping, trace rescaled to d
    /// Gantree: project_cp() -> Result<Self> // CP 투영
    pub fn project_cp(&self) -> QptResult<Self> {
        let mut eig = SymmetricEigen::new(hermitian_part(&self.choi()));
        let mut clipped = false;
        for v in eig.eigenvalues.iter_mut() {
            if *v < 0.0 {
                *v = 0.0;
                clipped = true;
            }
        }
        if !clipped {
            return Ok(self.clone());
        }

        let trace: f64 = eig.eigenvalues.iter().sum();
        if trace <= TOLERANCE {
            return Err(QptError::Fit(
                "CP projection left no positive Choi eigenvalues".into(),
            ));
        }
        let scale = self.dim() as f64 / trace;
        eig.eigenvalues.iter_mut().for_each(|v| *v *= scale);
        Self::from_choi(self.num_qubits, &eig.recompose())
    }
}

/// Sign s with Pᵀ = s·P (Yᵀ = -Y)
fn transpose_sign(p: &PauliString) -> f64 {
    if p.num_y() % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

fn monomial_matrix(m: &Monomial, dim: usize) -> CMatrix {
    let mut mat = CMatrix::zeros(dim, dim);
    for j in 0..dim {
        let (row, phase) = m.apply(j);
        mat[(row, j)] = phase;
    }
    mat
}

fn hermitian_part(m: &CMatrix) -> CMatrix {
    (m + m.adjoint()) * Complex64::new(0.5, 0.0)
}

fn register_size(dim: usize) -> QptResult<usize> {
    if dim == 0 || !dim.is_power_of_two() {
        return Err(QptError::InvalidUnitary(format!(
            "dimension {} is not a power of two",
            dim
        )));
    }
    Ok(dim.trailing_zeros() as usize)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qpt_core::{toffoli_matrix, Gate};

    fn assert_matrix_eq(a: &DMatrix<f64>, b: &DMatrix<f64>) {
        assert_eq!(a.shape(), b.shape());
        assert!((a - b).norm() < 1e-9, "matrices differ by {}", (a - b).norm());
    }

    #[test]
    fn test_identity_unitary_ptm() {
        let id = ProcessMatrix::from_unitary(&CMatrix::identity(4, 4)).unwrap();
        assert_matrix_eq(id.ptm(), ProcessMatrix::identity(2).ptm());
    }

    #[test]
    fn test_hadamard_ptm_swaps_x_and_z() {
        let h = Gate::H(0).matrix().unwrap();
        let r = ProcessMatrix::from_unitary(&h).unwrap();
        assert_abs_diff_eq!(r.get(0, 0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.get(3, 1), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.get(1, 3), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.get(2, 2), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_toffoli_ptm_is_orthogonal_permutation() {
        let r = ProcessMatrix::from_unitary(&toffoli_matrix()).unwrap();
        assert!(r.is_trace_preserving(1e-12));
        let rrt = r.ptm() * r.ptm().transpose();
        assert_matrix_eq(&rrt, &DMatrix::identity(64, 64));
        assert_abs_diff_eq!(r.overlap(&r).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_choi_roundtrip_and_trace() {
        let r = ProcessMatrix::from_unitary(&Gate::Cnot(0, 1).matrix().unwrap()).unwrap();
        let choi = r.choi();
        assert_abs_diff_eq!(choi.trace().re, 4.0, epsilon = 1e-12);
        let back = ProcessMatrix::from_choi(2, &choi).unwrap();
        assert_matrix_eq(back.ptm(), r.ptm());
    }

    #[test]
    fn test_unitary_choi_is_rank_one() {
        let r = ProcessMatrix::from_unitary(&Gate::S(0).matrix().unwrap()).unwrap();
        let eig = r.choi_eigenvalues();
        assert_abs_diff_eq!(eig[3], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(eig[0], 0.0, epsilon = 1e-9);
        assert!(r.is_completely_positive(1e-9));
    }

    #[test]
    fn test_project_cp_fixes_overshoot() {
        // Flipping the sign of the Z→Z entry of the identity gives a non-CP map
        let mut ptm = DMatrix::identity(4, 4);
        ptm[(1, 1)] = 1.0;
        ptm[(2, 2)] = 1.0;
        ptm[(3, 3)] = -1.0;
        let bad = ProcessMatrix::new(1, ptm).unwrap();
        assert!(!bad.is_completely_positive(1e-9));

        let fixed = bad.project_cp().unwrap();
        assert!(fixed.is_completely_positive(1e-9));
        assert_abs_diff_eq!(fixed.choi().trace().re, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_project_cp_keeps_physical_channel() {
        let depol = ProcessMatrix::depolarizing(1, 0.3);
        assert!(depol.is_completely_positive(1e-12));
        assert_eq!(depol.project_cp().unwrap(), depol);
    }

    #[test]
    fn test_dimension_checks() {
        assert!(ProcessMatrix::new(1, DMatrix::zeros(3, 3)).is_err());
        assert!(matches!(
            ProcessMatrix::new(40, DMatrix::zeros(1, 1)),
            Err(QptError::Config(_))
        ));
        assert!(ProcessMatrix::from_unitary(&CMatrix::identity(3, 3)).is_err());
        let a = ProcessMatrix::identity(1);
        let b = ProcessMatrix::identity(2);
        assert!(matches!(
            a.overlap(&b),
            Err(QptError::DimensionMismatch { .. })
        ));
    }
}
