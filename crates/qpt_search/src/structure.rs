//! Circuit structures for decomposition search
//!
//! Gantree: L5_Search → Structure
//!
//! A structure is the ordered list of multi-qubit instructions placed
//! between U3 layers. Entries index into an [`InstructionDict`].

use qpt_core::{search, Gate, QptError, QptResult, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered multi-qubit instruction indices, first applied first
pub type Structure = Vec<usize>;

/// Multi-qubit instruction between U3 layers
/// Gantree: MqInstruction // 다중 큐비트 명령
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MqInstruction {
    /// Control qubit
    pub control: QubitId,
    /// Target qubit
    pub target: QubitId,
}

impl MqInstruction {
    /// CX with control 0, target 1
    pub const CX01: Self = Self::cx(0, 1);
    /// CX with control 0, target 2
    pub const CX02: Self = Self::cx(0, 2);
    /// CX with control 1, target 2
    pub const CX12: Self = Self::cx(1, 2);

    /// CX instruction
    pub const fn cx(control: QubitId, target: QubitId) -> Self {
        Self { control, target }
    }

    /// Gate form
    pub fn gate(&self) -> Gate {
        Gate::Cnot(self.control, self.target)
    }
}

impl fmt::Display for MqInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CX{}{}", self.control, self.target)
    }
}

/// Index → instruction dictionary
/// Gantree: InstructionDict // 명령 사전
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionDict {
    instructions: Vec<MqInstruction>,
}

impl InstructionDict {
    /// Dictionary from an ordered instruction list
    pub fn new(instructions: Vec<MqInstruction>) -> QptResult<Self> {
        if instructions.is_empty() {
            return Err(QptError::Config(
                "instruction dictionary is empty".to_string(),
            ));
        }
        if let Some(bad) = instructions.iter().find(|i| i.control == i.target) {
            return Err(QptError::Config(format!(
                "{} acts twice on one qubit",
                bad
            )));
        }
        Ok(Self { instructions })
    }

    /// {0: CX01, 1: CX02, 2: CX12}
    pub fn toffoli() -> Self {
        Self {
            instructions: vec![MqInstruction::CX01, MqInstruction::CX02, MqInstruction::CX12],
        }
    }

    /// Number of instructions
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Always false for a constructed dictionary
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction at `index`
    pub fn get(&self, index: usize) -> Option<MqInstruction> {
        self.instructions.get(index).copied()
    }

    /// Smallest register every instruction fits in
    pub fn min_qubits(&self) -> usize {
        self.instructions
            .iter()
            .map(|i| i.control.max(i.target) + 1)
            .max()
            .unwrap_or(0)
    }

    /// Resolve a structure, rejecting unknown indices
    pub fn resolve(&self, structure: &[usize]) -> QptResult<Vec<MqInstruction>> {
        structure
            .iter()
            .map(|&idx| {
                self.get(idx).ok_or_else(|| {
                    QptError::Config(format!(
                        "instruction index {} not in dictionary of {}",
                        idx,
                        self.len()
                    ))
                })
            })
            .collect()
    }
}

impl Default for InstructionDict {
    fn default() -> Self {
        Self::toffoli()
    }
}

// ============================================================================
// Enumeration
// ============================================================================

/// All `num_mq^layers` structures of length `layers`
///
/// Built recursively as `[ins] + shorter` for every shorter structure and
/// every instruction, so the first entry varies fastest.
/// Gantree: generate_circuit_structures(num_mq,layers) -> Vec<Structure> // 구조 열거
pub fn generate_circuit_structures(num_mq: usize, layers: usize) -> Vec<Structure> {
    if layers == 0 {
        return vec![Vec::new()];
    }
    let shorter = generate_circuit_structures(num_mq, layers - 1);
    let mut structures = Vec::with_capacity(shorter.len() * num_mq);
    for tail in &shorter {
        for ins in 0..num_mq {
            let mut s = Vec::with_capacity(layers);
            s.push(ins);
            s.extend_from_slice(tail);
            structures.push(s);
        }
    }
    structures
}

/// Index range explored by `rank`, clamped to `total`
pub fn rank_range(total: usize, rank: usize, per_rank: usize) -> std::ops::Range<usize> {
    let start = rank.saturating_mul(per_rank).min(total);
    let stop = rank.saturating_add(1).saturating_mul(per_rank).min(total);
    start..stop
}

/// Structures explored by `rank` with the default partition of 16
pub fn rank_slice(structures: &[Structure], rank: usize) -> &[Structure] {
    &structures[rank_range(structures.len(), rank, search::STRUCTURES_PER_RANK)]
}

/// Ranks needed to cover `total` structures
pub fn num_ranks(total: usize, per_rank: usize) -> usize {
    if per_rank == 0 {
        0
    } else {
        total.div_ceil(per_rank)
    }
}

/// Concatenated instruction digits, e.g. "012012"
pub fn structure_digits(structure: &[usize]) -> String {
    structure.iter().map(|i| i.to_string()).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_count() {
        assert_eq!(generate_circuit_structures(3, 0), vec![Vec::<usize>::new()]);
        assert_eq!(generate_circuit_structures(3, 2).len(), 9);
        assert_eq!(generate_circuit_structures(3, 6).len(), 729);
        assert!(generate_circuit_structures(3, 6).iter().all(|s| s.len() == 6));
    }

    #[test]
    fn test_first_entry_varies_fastest() {
        let s = generate_circuit_structures(3, 2);
        assert_eq!(s[0], vec![0, 0]);
        assert_eq!(s[1], vec![1, 0]);
        assert_eq!(s[2], vec![2, 0]);
        assert_eq!(s[3], vec![0, 1]);
        assert_eq!(s[8], vec![2, 2]);
    }

    #[test]
    fn test_rank_slices() {
        let s = generate_circuit_structures(3, 6);
        assert_eq!(rank_slice(&s, 0).len(), 16);
        assert_eq!(rank_slice(&s, 1)[0], s[16]);
        // 729 = 45 * 16 + 9
        assert_eq!(rank_slice(&s, 45).len(), 9);
        assert!(rank_slice(&s, 46).is_empty());
        assert_eq!(num_ranks(s.len(), 16), 46);
    }

    #[test]
    fn test_dictionary() {
        let dict = InstructionDict::toffoli();
        assert_eq!(dict.len(), 3);
        assert_eq!(dict.get(2), Some(MqInstruction::CX12));
        assert_eq!(dict.min_qubits(), 3);
        assert_eq!(dict.get(1).unwrap().gate(), Gate::Cnot(0, 2));
        assert!(dict.resolve(&[0, 3]).is_err());
        assert!(InstructionDict::new(vec![]).is_err());
        assert!(InstructionDict::new(vec![MqInstruction::cx(1, 1)]).is_err());
    }

    #[test]
    fn test_digits() {
        assert_eq!(structure_digits(&[0, 1, 2, 2, 1, 0]), "012210");
        assert_eq!(MqInstruction::CX02.to_string(), "CX02");
    }
}
