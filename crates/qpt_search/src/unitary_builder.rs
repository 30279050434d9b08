//! Parameterized circuit unitaries
//!
//! Gantree: L5_Search → UnitaryBuilder
//!
//! A structure of L instructions is realised as
//! `U3 layer 0, mq[0], U3 layer 1, ..., mq[L-1], U3 layer L`, giving
//! `3·n·(L+1)` angles.

use crate::structure::{InstructionDict, MqInstruction};
use qpt_core::{
    circuit_unitary, search, Angle, CMatrix, Circuit, CircuitBuilder, QptError, QptResult,
    QubitId,
};
use serde::{Deserialize, Serialize};

/// Builds the unitary of one structure for a parameter vector
/// Gantree: UnitaryBuilder // 유니터리 빌더
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitaryBuilder {
    num_qubits: usize,
    structure: Vec<usize>,
    instructions: Vec<MqInstruction>,
}

impl UnitaryBuilder {
    /// Resolve `structure` against `dict` on an `num_qubits` register
    pub fn new(num_qubits: usize, structure: &[usize], dict: &InstructionDict) -> QptResult<Self> {
        if num_qubits == 0 {
            return Err(QptError::Config("search register is empty".to_string()));
        }
        let instructions = dict.resolve(structure)?;
        if let Some(bad) = instructions
            .iter()
            .find(|i| i.control.max(i.target) >= num_qubits)
        {
            return Err(QptError::QubitOutOfRange {
                qubit: bad.control.max(bad.target),
                max: num_qubits,
            });
        }
        Ok(Self {
            num_qubits,
            structure: structure.to_vec(),
            instructions,
        })
    }

    /// Register size
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Instruction indices
    pub fn structure(&self) -> &[usize] {
        &self.structure
    }

    /// Multi-qubit instruction count
    pub fn num_layers(&self) -> usize {
        self.instructions.len()
    }

    /// Angles per U3 layer
    pub fn layer_params(&self) -> usize {
        search::layer_params(self.num_qubits)
    }

    /// Total angle count
    pub fn num_params(&self) -> usize {
        search::num_params(self.num_qubits, self.num_layers())
    }

    /// Unitary dimension
    pub fn dim(&self) -> usize {
        1 << self.num_qubits
    }

    /// Circuit for `params`
    /// Gantree: build_circuit(params) -> Circuit // 회로 구성
    pub fn build_circuit(&self, params: &[Angle]) -> QptResult<Circuit> {
        if params.len() != self.num_params() {
            return Err(QptError::Config(format!(
                "expected {} parameters, got {}",
                self.num_params(),
                params.len()
            )));
        }

        let layers: Vec<&[Angle]> = params.chunks_exact(self.layer_params()).collect();
        let mut builder = CircuitBuilder::with_name(self.num_qubits, self.name());
        for (layer, ins) in layers.iter().zip(&self.instructions) {
            builder = builder.u3_layer(layer).cx(ins.control, ins.target);
        }
        if let Some(last) = layers.last() {
            builder = builder.u3_layer(last);
        }
        builder.try_build()
    }

    /// Unitary for `params`, instructions applied in circuit order
    /// Gantree: build_unitary(params) -> CMatrix // 유니터리 생성
    pub fn build_unitary(&self, params: &[Angle]) -> QptResult<CMatrix> {
        let circuit = self.build_circuit(params)?;
        let qubits: Vec<QubitId> = (0..self.num_qubits).collect();
        circuit_unitary(&circuit, &qubits)
    }

    fn name(&self) -> String {
        let names: Vec<String> = self.instructions.iter().map(|i| i.to_string()).collect();
        format!("search_{}", names.join("_"))
    }
}

// ============================================================================
// Parameter Mask
// ============================================================================

/// Which angles the optimizer may move, and the values of the rest
/// Gantree: ParameterMask // 매개변수 고정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMask {
    free: Vec<bool>,
    fixed_values: Vec<f64>,
}

impl ParameterMask {
    /// Every angle free
    pub fn all_free(len: usize) -> Self {
        Self {
            free: vec![true; len],
            fixed_values: vec![0.0; len],
        }
    }

    /// First and last U3 layers pinned to zero
    /// Gantree: edge_layers_fixed(n,layers) -> Self // 양끝 레이어 고정
    pub fn edge_layers_fixed(num_qubits: usize, layers: usize) -> Self {
        let len = search::num_params(num_qubits, layers);
        let edge = search::layer_params(num_qubits).min(len);
        let mut mask = Self::all_free(len);
        for i in (0..edge).chain(len - edge..len) {
            mask.free[i] = false;
        }
        mask
    }

    /// Pin `index` to `value`
    pub fn with_fixed(mut self, index: usize, value: f64) -> QptResult<Self> {
        let len = self.len();
        let slot = self.free.get_mut(index).ok_or_else(|| {
            QptError::Config(format!("parameter {} out of range for {}", index, len))
        })?;
        *slot = false;
        self.fixed_values[index] = value;
        Ok(self)
    }

    /// Parameter count
    pub fn len(&self) -> usize {
        self.free.len()
    }

    /// True for a zero-length mask
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Whether `index` may move
    pub fn is_free(&self, index: usize) -> bool {
        self.free.get(index).copied().unwrap_or(false)
    }

    /// Indices the optimizer may move
    pub fn free_indices(&self) -> Vec<usize> {
        (0..self.len()).filter(|&i| self.free[i]).collect()
    }

    /// Number of free angles
    pub fn num_free(&self) -> usize {
        self.free.iter().filter(|&&f| f).count()
    }

    /// Overwrite pinned entries of `params`
    pub fn apply(&self, params: &mut [f64]) {
        for ((p, &free), &value) in params.iter_mut().zip(&self.free).zip(&self.fixed_values) {
            if !free {
                *p = value;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qpt_core::{gate_unitary, is_unitary, Gate};

    #[test]
    fn test_param_count() {
        let ub = UnitaryBuilder::new(3, &[0, 1, 2, 0, 1, 2], &InstructionDict::toffoli()).unwrap();
        assert_eq!(ub.num_params(), 63);
        assert_eq!(ub.num_layers(), 6);
        assert_eq!(ub.dim(), 8);
    }

    #[test]
    fn test_zero_angles_give_cx_product() {
        let ub = UnitaryBuilder::new(3, &[0, 2], &InstructionDict::toffoli()).unwrap();
        let u = ub.build_unitary(&vec![0.0; ub.num_params()]).unwrap();

        // CX01 applied first, so it is the rightmost factor
        let expected = gate_unitary(&Gate::Cnot(1, 2), 3).unwrap()
            * gate_unitary(&Gate::Cnot(0, 1), 3).unwrap();
        assert_abs_diff_eq!((u - expected).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_random_angles_unitary() {
        let ub = UnitaryBuilder::new(3, &[1, 0, 2], &InstructionDict::toffoli()).unwrap();
        let params: Vec<f64> = (0..ub.num_params()).map(|i| 0.1 * i as f64).collect();
        assert!(is_unitary(&ub.build_unitary(&params).unwrap()));

        let circuit = ub.build_circuit(&params).unwrap();
        // 4 U3 layers of 3 gates plus 3 CX
        assert_eq!(circuit.gates().len(), 15);
    }

    #[test]
    fn test_rejects_bad_input() {
        let dict = InstructionDict::toffoli();
        let ub = UnitaryBuilder::new(3, &[0], &dict).unwrap();
        assert!(ub.build_unitary(&[0.0; 3]).is_err());
        assert!(UnitaryBuilder::new(2, &[1], &dict).is_err());
        assert!(UnitaryBuilder::new(3, &[5], &dict).is_err());
    }

    #[test]
    fn test_edge_mask() {
        let mask = ParameterMask::edge_layers_fixed(3, 6);
        assert_eq!(mask.len(), 63);
        assert_eq!(mask.num_free(), 45);
        assert!(!mask.is_free(0) && !mask.is_free(8));
        assert!(mask.is_free(9) && mask.is_free(53));
        assert!(!mask.is_free(54) && !mask.is_free(62));
        assert_eq!(mask.free_indices().first(), Some(&9));
    }

    #[test]
    fn test_mask_apply() {
        let mask = ParameterMask::all_free(4).with_fixed(1, 0.5).unwrap();
        let mut params = vec![1.0; 4];
        mask.apply(&mut params);
        assert_eq!(params, vec![1.0, 0.5, 1.0, 1.0]);
        assert!(ParameterMask::all_free(2).with_fixed(2, 0.0).is_err());
    }
}
