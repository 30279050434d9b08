//! # QPT Search
//!
//! Search for short CX structures that reproduce a Toffoli up to global
//! phase, with optimized U3 angles between the CX layers.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qpt_search // L5: Decomposition Search
//!     Structure // 구조 열거
//!         generate_circuit_structures() - num_mq^L, 첫 항목이 가장 빠르게 변함
//!         rank_slice() - [16r, 16(r+1))
//!     UnitaryBuilder // U3 / CX / ... / U3
//!     ParameterMask // 양끝 U3 레이어 고정
//!     unitary_distance() // 1 − |Tr(U_t†U)|/d
//!     ParameterOptimizer // 최적화기 인터페이스
//!         CoordinateSearch - ±step, decay, restarts
//!     SearchDriver // 랭크 단위 실행
//!     SearchArtifact // out_full_{digits}.txt
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qpt_search::prelude::*;
//!
//! let config = SearchConfig::toffoli().with_seed(1).with_output_dir("out");
//! let driver = SearchDriver::toffoli(config).unwrap();
//! for artifact in driver.run_rank(0).unwrap() {
//!     println!("{:?}: {:.3e}", artifact.structure, artifact.distance);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Structure enumeration (Gantree: L5_Search → Structure)
pub mod structure;

/// Parameterized unitaries (Gantree: L5_Search → UnitaryBuilder)
pub mod unitary_builder;

/// Unitary distance (Gantree: L5_Search → Distance)
pub mod distance;

/// Optimizers (Gantree: L5_Search → ParameterOptimizer)
pub mod optimizer;

/// Result files (Gantree: L5_Search → SearchArtifact)
pub mod artifact;

/// Driver (Gantree: L5_Search → SearchDriver)
pub mod driver;

// ============================================================================
// Re-exports
// ============================================================================

pub use artifact::SearchArtifact;
pub use distance::unitary_distance;
pub use driver::{SearchConfig, SearchDriver};
pub use optimizer::{CoordinateSearch, OptimizationOutcome, ParameterOptimizer, SearchProblem};
pub use structure::{
    generate_circuit_structures, num_ranks, rank_range, rank_slice, structure_digits,
    InstructionDict, MqInstruction, Structure,
};
pub use unitary_builder::{ParameterMask, UnitaryBuilder};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases

    pub use crate::artifact::SearchArtifact;
    pub use crate::distance::unitary_distance;
    pub use crate::driver::{SearchConfig, SearchDriver};
    pub use crate::optimizer::{CoordinateSearch, ParameterOptimizer, SearchProblem};
    pub use crate::structure::{generate_circuit_structures, InstructionDict, MqInstruction};
    pub use crate::unitary_builder::{ParameterMask, UnitaryBuilder};
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use super::OptimizationOutcome;
    use qpt_core::{gate_unitary, CircuitBuilder, CMatrix, Gate, QptResult};
    use std::fs;

    /// Returns all-zero angles, so the unitary is the bare CX product
    struct ZeroAngles;

    impl ParameterOptimizer for ZeroAngles {
        fn name(&self) -> &str {
            "zero_angles"
        }

        fn optimize(
            &self,
            problem: &SearchProblem,
            _restarts: usize,
        ) -> QptResult<OptimizationOutcome> {
            let params = vec![0.0; problem.mask().len()];
            let value = problem.objective(&params)?;
            Ok(OptimizationOutcome {
                params,
                value,
                evaluations: 1,
            })
        }
    }

    fn cx(c: usize, t: usize) -> CMatrix {
        gate_unitary(&Gate::Cnot(c, t), 3).unwrap()
    }

    #[test]
    fn test_artifacts_only_for_matching_structures() {
        let dir = std::env::temp_dir().join(format!("qpt_search_{}", std::process::id()));
        // CX01 then CX02; the two commute, so "10" matches as well
        let target = cx(0, 2) * cx(0, 1);
        let config = SearchConfig::toffoli()
            .with_layers(2)
            .with_seed(3)
            .with_output_dir(&dir);
        let driver =
            SearchDriver::new(config, InstructionDict::toffoli(), target, ZeroAngles).unwrap();

        let artifacts = driver.run_rank(0).unwrap();
        assert_eq!(artifacts.len(), 9);
        assert!(artifacts.iter().all(|a| a.rank == 0 && a.params.len() == 27));

        let mut written: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        written.sort();
        assert_eq!(written, vec!["out_full_01.txt", "out_full_10.txt"]);

        let text = fs::read_to_string(dir.join("out_full_01.txt")).unwrap();
        assert!(text.starts_with("PyQuOpt Results\n==========\nRank 0 Computation\n"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_rank_partition_covers_enumeration() {
        let config = SearchConfig::toffoli()
            .with_layers(3)
            .with_structures_per_rank(4)
            .with_seed(9)
            .with_parallel(false);
        let driver = SearchDriver::new(
            config,
            InstructionDict::toffoli(),
            CMatrix::identity(8, 8),
            ZeroAngles,
        )
        .unwrap();
        assert_eq!(driver.num_ranks(), 7);

        let all = driver.run_all().unwrap();
        assert_eq!(all.len(), 27);
        let structures: Vec<Vec<usize>> = all.iter().map(|a| a.structure.clone()).collect();
        assert_eq!(structures, generate_circuit_structures(3, 3));
        assert_eq!(all[26].rank, 6);
        // No product of three CX gates is the identity
        assert!(all.iter().all(|a| !a.is_accepted()));
    }

    #[test]
    fn test_single_layer_cannot_reach_toffoli() {
        let config = SearchConfig::toffoli().with_layers(1).with_restarts(2).with_seed(5);
        let driver = SearchDriver::toffoli(config).unwrap();

        let artifacts = driver.run_rank(0).unwrap();
        assert_eq!(artifacts.len(), 3);
        assert!(artifacts.iter().all(|a| !a.is_accepted()));
        // Edge layers pinned to zero: each candidate is a bare CX
        assert!(artifacts.iter().all(|a| a.params.iter().all(|&p| p == 0.0)));
    }

    #[test]
    fn test_canonical_decomposition_is_within_threshold() {
        let circuit = CircuitBuilder::new(3)
            .canonical_full_toffoli([0, 1, 2])
            .build();
        let u = qpt_core::circuit_unitary(&circuit, &[0, 1, 2]).unwrap();
        let distance = unitary_distance(&qpt_core::toffoli_matrix(), &u).unwrap();
        assert!(distance < 1e-12);
    }

    #[test]
    fn test_coordinate_search_recovers_middle_layer() {
        // [0, 0]: CX01, U3 layer, CX01 with only the middle layer free
        let dict = InstructionDict::toffoli();
        let builder = UnitaryBuilder::new(3, &[0, 0], &dict).unwrap();
        let mut truth = vec![0.0; builder.num_params()];
        truth[9] = 0.8;
        let target = builder.build_unitary(&truth).unwrap();

        let mut mask = ParameterMask::edge_layers_fixed(3, 2);
        for i in 10..18 {
            mask = mask.with_fixed(i, 0.0).unwrap();
        }
        let problem = SearchProblem::new(builder, target, mask).unwrap().with_seed(21);
        let outcome = CoordinateSearch::default().optimize(&problem, 3).unwrap();
        assert!(outcome.value < 1e-9, "{}", outcome.value);
    }
}
