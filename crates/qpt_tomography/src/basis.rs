//! Preparation and measurement bases
//!
//! Gantree: L3_Tomography → Basis
//!
//! Single-qubit preparation states are Pauli eigenstates prepared from |0⟩.
//! A preparation basis fixes which states are used and, through its design
//! matrix, how the preparation side of the fit is inverted.

use nalgebra::DMatrix;
use qpt_core::{tomography, Basis, Gate, QptError, QptResult, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Preparation State
// ============================================================================

/// Single-qubit preparation state
/// Gantree: PrepState // 준비 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrepState {
    /// |0⟩
    Zp,
    /// |1⟩
    Zm,
    /// |+⟩
    Xp,
    /// |-⟩
    Xm,
    /// |+i⟩
    Yp,
    /// |-i⟩
    Ym,
}

impl PrepState {
    /// Short name
    pub fn as_str(&self) -> &'static str {
        match self {
            PrepState::Zp => "Zp",
            PrepState::Zm => "Zm",
            PrepState::Xp => "Xp",
            PrepState::Xm => "Xm",
            PrepState::Yp => "Yp",
            PrepState::Ym => "Ym",
        }
    }

    /// Gates preparing this state from |0⟩
    /// Gantree: gates(qubit) -> Vec<Gate> // 준비 게이트
    pub fn gates(&self, qubit: QubitId) -> Vec<Gate> {
        match self {
            PrepState::Zp => vec![],
            PrepState::Zm => vec![Gate::X(qubit)],
            PrepState::Xp => vec![Gate::H(qubit)],
            PrepState::Xm => vec![Gate::X(qubit), Gate::H(qubit)],
            PrepState::Yp => vec![Gate::H(qubit), Gate::S(qubit)],
            PrepState::Ym => vec![Gate::X(qubit), Gate::H(qubit), Gate::S(qubit)],
        }
    }

    /// Pauli expectations (⟨I⟩, ⟨X⟩, ⟨Y⟩, ⟨Z⟩) of the state
    pub fn pauli_vector(&self) -> [f64; 4] {
        match self {
            PrepState::Zp => [1.0, 0.0, 0.0, 1.0],
            PrepState::Zm => [1.0, 0.0, 0.0, -1.0],
            PrepState::Xp => [1.0, 1.0, 0.0, 0.0],
            PrepState::Xm => [1.0, -1.0, 0.0, 0.0],
            PrepState::Yp => [1.0, 0.0, 1.0, 0.0],
            PrepState::Ym => [1.0, 0.0, -1.0, 0.0],
        }
    }
}

impl fmt::Display for PrepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PrepState {
    type Err = QptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Zp" => Ok(PrepState::Zp),
            "Zm" => Ok(PrepState::Zm),
            "Xp" => Ok(PrepState::Xp),
            "Xm" => Ok(PrepState::Xm),
            "Yp" => Ok(PrepState::Yp),
            "Ym" => Ok(PrepState::Ym),
            other => Err(QptError::InvalidPreparation(other.to_string())),
        }
    }
}

// ============================================================================
// Preparation Basis
// ============================================================================

/// Set of preparation states used per qubit
/// Gantree: PrepBasis // 준비 기저
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrepBasis {
    /// Zp, Zm, Xp, Yp (informationally complete, exactly invertible)
    #[default]
    Minimal,
    /// All six Pauli eigenstates
    Overcomplete,
}

impl PrepBasis {
    /// States in generation order
    pub fn states(&self) -> &'static [PrepState] {
        match self {
            PrepBasis::Minimal => &[PrepState::Zp, PrepState::Zm, PrepState::Xp, PrepState::Yp],
            PrepBasis::Overcomplete => &[
                PrepState::Zp,
                PrepState::Zm,
                PrepState::Xp,
                PrepState::Xm,
                PrepState::Yp,
                PrepState::Ym,
            ],
        }
    }

    /// Number of states per qubit
    pub fn len(&self) -> usize {
        self.states().len()
    }

    /// Always false; every basis has states
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Position of a state in this basis
    pub fn position(&self, state: PrepState) -> Option<usize> {
        self.states().iter().position(|&s| s == state)
    }

    /// Design matrix A (states × 4), row s = Pauli vector of state s
    pub fn design_matrix(&self) -> DMatrix<f64> {
        let states = self.states();
        DMatrix::from_fn(states.len(), 4, |s, q| states[s].pauli_vector()[q])
    }

    /// Least-squares inverse (AᵀA)⁻¹Aᵀ of the design matrix (4 × states)
    /// Gantree: inverse_design() -> DMatrix // 준비 측 역행렬
    pub fn inverse_design(&self) -> QptResult<DMatrix<f64>> {
        let a = self.design_matrix();
        let ata = a.transpose() * &a;
        let inv = ata.try_inverse().ok_or_else(|| {
            QptError::Fit(format!("{:?} preparation design is singular", self))
        })?;
        Ok(inv * a.transpose())
    }
}

// ============================================================================
// Tomography Basis
// ============================================================================

/// Preparation basis paired with Pauli measurement bases
/// Gantree: TomographyBasis // 토모그래피 기저
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TomographyBasis {
    /// Preparation side
    pub prep: PrepBasis,
}

impl TomographyBasis {
    /// Four-state preparation, Pauli measurements
    pub fn minimal() -> Self {
        Self {
            prep: PrepBasis::Minimal,
        }
    }

    /// Six-state preparation, Pauli measurements
    pub fn overcomplete() -> Self {
        Self {
            prep: PrepBasis::Overcomplete,
        }
    }

    /// Measurement bases in generation order
    pub fn meas_bases(&self) -> &'static [Basis] {
        &Basis::ALL
    }

    /// Number of circuits for `k` target qubits
    pub fn circuit_count(&self, k: usize) -> usize {
        tomography::circuit_count(k, self.prep.len())
    }
}

// ============================================================================
// Tests
// ============================================================================
