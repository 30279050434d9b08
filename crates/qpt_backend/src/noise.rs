//! Noise model for the simulator backend
//!
//! Gantree: L2_Backend → NoiseModel
//!
//! Depolarizing gate errors by gate arity, plus symmetric readout error.
//! A k-qubit gate with error `p` is followed by
//! `ρ → (1-p)ρ + p · Tr_ops(ρ) ⊗ I/2^k` on its operands, so `p = 1`
//! fully randomizes the qubits the gate touches.

use qpt_core::{QptError, QptResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gate and readout noise
/// Gantree: NoiseModel // 노이즈 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseModel {
    /// Gantree: gate_error_1q: f64 // 1Q 탈분극
    gate_error_1q: f64,

    /// Gantree: gate_error_2q: f64 // 2Q 탈분극
    gate_error_2q: f64,

    /// Gantree: gate_error_3q: f64 // 3Q 탈분극
    gate_error_3q: f64,

    /// Gantree: readout_error: f64 // 측정 에러
    readout_error: f64,
}

impl NoiseModel {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a new noise model with validation
    pub fn new(
        gate_error_1q: f64,
        gate_error_2q: f64,
        gate_error_3q: f64,
        readout_error: f64,
    ) -> QptResult<Self> {
        let model = Self {
            gate_error_1q,
            gate_error_2q,
            gate_error_3q,
            readout_error,
        };
        model.validate()?;
        Ok(model)
    }

    /// Create ideal (noiseless) model
    /// Gantree: ideal() -> Self // 이상적
    pub fn ideal() -> Self {
        Self {
            gate_error_1q: 0.0,
            gate_error_2q: 0.0,
            gate_error_3q: 0.0,
            readout_error: 0.0,
        }
    }

    /// Typical superconducting device figures
    pub fn ibm_typical() -> Self {
        Self {
            gate_error_1q: 0.0003,
            gate_error_2q: 0.01,
            gate_error_3q: 0.05,
            readout_error: 0.01,
        }
    }

    /// Same depolarizing probability after every gate, ideal readout
    /// Gantree: from_depol(p) -> Result<Self> // 균일 탈분극
    pub fn from_depol(p_depol: f64) -> QptResult<Self> {
        Self::new(p_depol, p_depol, p_depol, 0.0)
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    /// Set single-qubit gate error
    pub fn with_gate_error_1q(mut self, error: f64) -> Self {
        self.gate_error_1q = error;
        self
    }

    /// Set two-qubit gate error
    pub fn with_gate_error_2q(mut self, error: f64) -> Self {
        self.gate_error_2q = error;
        self
    }

    /// Set three-qubit gate error
    pub fn with_gate_error_3q(mut self, error: f64) -> Self {
        self.gate_error_3q = error;
        self
    }

    /// Set readout error
    pub fn with_readout_error(mut self, error: f64) -> Self {
        self.readout_error = error;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Single-qubit gate error
    pub fn gate_error_1q(&self) -> f64 {
        self.gate_error_1q
    }

    /// Two-qubit gate error
    pub fn gate_error_2q(&self) -> f64 {
        self.gate_error_2q
    }

    /// Three-qubit gate error
    pub fn gate_error_3q(&self) -> f64 {
        self.gate_error_3q
    }

    /// Readout bit-flip probability
    pub fn readout_error(&self) -> f64 {
        self.readout_error
    }

    /// Depolarizing probability for a gate of the given arity
    pub fn gate_error(&self, arity: usize) -> f64 {
        match arity {
            0 => 0.0,
            1 => self.gate_error_1q,
            2 => self.gate_error_2q,
            _ => self.gate_error_3q,
        }
    }

    /// Check if every error rate is zero
    pub fn is_ideal(&self) -> bool {
        self.gate_error_1q == 0.0
            && self.gate_error_2q == 0.0
            && self.gate_error_3q == 0.0
            && self.readout_error == 0.0
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate all rates lie in [0, 1]
    pub fn validate(&self) -> QptResult<()> {
        for (label, value) in [
            ("1Q gate error", self.gate_error_1q),
            ("2Q gate error", self.gate_error_2q),
            ("3Q gate error", self.gate_error_3q),
            ("Readout error", self.readout_error),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(QptError::Config(format!(
                    "{} must be in [0,1]: {}",
                    label, value
                )));
            }
        }
        Ok(())
    }
}

impl Default for NoiseModel {
    fn default() -> Self {
        Self::ideal()
    }
}

impl fmt::Display for NoiseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NoiseModel(1Q={:.4}, 2Q={:.4}, 3Q={:.4}, RO={:.4})",
            self.gate_error_1q, self.gate_error_2q, self.gate_error_3q, self.readout_error
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
