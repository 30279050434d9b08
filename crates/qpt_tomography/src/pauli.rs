//! Pauli strings
//!
//! Gantree: L3_Tomography → Pauli
//!
//! An n-qubit Pauli string is indexed little-endian in base 4 with
//! I=0, X=1, Y=2, Z=3 (local qubit k is digit k). Every Pauli string maps
//! basis state |j⟩ to a phase times |j ⊕ x⟩, which is what the PTM and Choi
//! computations use instead of dense matrices.

use num_complex::Complex64;
use qpt_core::{Basis, CMatrix, QptError, QptResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Single-qubit Pauli operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pauli {
    /// Identity
    I,
    /// Pauli X
    X,
    /// Pauli Y
    Y,
    /// Pauli Z
    Z,
}

impl Pauli {
    /// All four in index order
    pub const ALL: [Pauli; 4] = [Pauli::I, Pauli::X, Pauli::Y, Pauli::Z];

    /// Base-4 digit
    pub fn index(&self) -> usize {
        match self {
            Pauli::I => 0,
            Pauli::X => 1,
            Pauli::Y => 2,
            Pauli::Z => 3,
        }
    }

    /// Pauli measured by a measurement basis
    pub fn from_basis(basis: Basis) -> Self {
        match basis {
            Basis::X => Pauli::X,
            Basis::Y => Pauli::Y,
            Basis::Z => Pauli::Z,
        }
    }

    /// Character form
    pub fn to_char(&self) -> char {
        match self {
            Pauli::I => 'I',
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }
}

/// n-qubit Pauli string
/// Gantree: PauliString // 파울리 문자열
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PauliString {
    /// paulis[k] acts on local qubit k
    paulis: Vec<Pauli>,
}

impl PauliString {
    /// Create from per-qubit operators
    pub fn new(paulis: Vec<Pauli>) -> Self {
        Self { paulis }
    }

    /// Decode a base-4 index
    pub fn from_index(index: usize, num_qubits: usize) -> Self {
        let paulis = (0..num_qubits)
            .map(|k| Pauli::ALL[(index >> (2 * k)) & 3])
            .collect();
        Self { paulis }
    }

    /// Base-4 index
    pub fn index(&self) -> usize {
        self.paulis
            .iter()
            .enumerate()
            .map(|(k, p)| p.index() << (2 * k))
            .sum()
    }

    /// Number of qubits
    pub fn num_qubits(&self) -> usize {
        self.paulis.len()
    }

    /// Operator on qubit k
    pub fn get(&self, k: usize) -> Option<Pauli> {
        self.paulis.get(k).copied()
    }

    /// Qubits carrying a non-identity operator
    pub fn support(&self) -> Vec<usize> {
        self.paulis
            .iter()
            .enumerate()
            .filter(|(_, p)| **p != Pauli::I)
            .map(|(k, _)| k)
            .collect()
    }

    /// Number of non-identity factors
    pub fn weight(&self) -> usize {
        self.support().len()
    }

    /// Bit mask of X or Y factors
    pub fn x_mask(&self) -> usize {
        self.mask(|p| matches!(p, Pauli::X | Pauli::Y))
    }

    /// Bit mask of Z or Y factors
    pub fn z_mask(&self) -> usize {
        self.mask(|p| matches!(p, Pauli::Z | Pauli::Y))
    }

    /// Number of Y factors
    pub fn num_y(&self) -> usize {
        self.paulis.iter().filter(|&&p| p == Pauli::Y).count()
    }

    fn mask(&self, pred: impl Fn(Pauli) -> bool) -> usize {
        self.paulis
            .iter()
            .enumerate()
            .filter(|(_, &p)| pred(p))
            .map(|(k, _)| 1usize << k)
            .sum()
    }

    /// Check every non-identity factor is the Pauli measured on that qubit
    pub fn is_measured_by(&self, bases: &[Basis]) -> bool {
        self.paulis
            .iter()
            .zip(bases)
            .all(|(&p, &b)| p == Pauli::I || p == Pauli::from_basis(b))
    }

    /// Action on a basis state: P|j⟩ = phase · |row⟩
    pub fn apply(&self, j: usize) -> (usize, Complex64) {
        self.monomial().apply(j)
    }

    /// Precomputed masks for repeated application
    pub fn monomial(&self) -> Monomial {
        Monomial {
            x_mask: self.x_mask(),
            z_mask: self.z_mask(),
            y_phase: i_power(self.num_y()),
        }
    }

    /// Dense 2^n × 2^n matrix
    pub fn matrix(&self) -> CMatrix {
        let dim = 1usize << self.num_qubits();
        let m = self.monomial();
        let mut mat = CMatrix::zeros(dim, dim);
        for j in 0..dim {
            let (row, phase) = m.apply(j);
            mat[(row, j)] = phase;
        }
        mat
    }

    /// Parse from characters, qubit 0 first
    pub fn parse(s: &str) -> QptResult<Self> {
        let paulis = s
            .chars()
            .map(|c| match c.to_ascii_uppercase() {
                'I' => Ok(Pauli::I),
                'X' => Ok(Pauli::X),
                'Y' => Ok(Pauli::Y),
                'Z' => Ok(Pauli::Z),
                _ => Err(QptError::InvalidBasis(s.to_string())),
            })
            .collect::<QptResult<Vec<_>>>()?;
        Ok(Self { paulis })
    }
}

impl fmt::Display for PauliString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.paulis {
            write!(f, "{}", p.to_char())?;
        }
        Ok(())
    }
}

/// Pauli string as a signed permutation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Monomial {
    x_mask: usize,
    z_mask: usize,
    y_phase: Complex64,
}

impl Monomial {
    /// P|j⟩ = i^{nY} (-1)^{|z ∧ j|} |j ⊕ x⟩
    #[inline]
    pub fn apply(&self, j: usize) -> (usize, Complex64) {
        let sign = if (self.z_mask & j).count_ones() % 2 == 0 {
            1.0
        } else {
            -1.0
        };
        (j ^ self.x_mask, self.y_phase * sign)
    }
}

fn i_power(n: usize) -> Complex64 {
    match n % 4 {
        0 => Complex64::new(1.0, 0.0),
        1 => Complex64::new(0.0, 1.0),
        2 => Complex64::new(-1.0, 0.0),
        _ => Complex64::new(0.0, -1.0),
    }
}

// ============================================================================
// Tests
// ============================================================================
