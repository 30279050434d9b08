//! # QPT Tomography
//!
//! Process tomography circuits, channel reconstruction and gate fidelity.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qpt_tomography // L3: Tomography
//!     Basis // 준비/측정 기저
//!     Pauli // 파울리 문자열
//!     Generator // 토모그래피 회로 생성
//!     Result // 라벨 + 카운트 페어링
//!     ProcessMatrix // PTM, Choi, CP 투영
//!     ChannelFitter // 최소제곱 채널 복원
//!     FidelityEvaluator // 평균 게이트 충실도
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qpt_tomography::prelude::*;
//!
//! let target = TargetUnitary::toffoli();
//! let evaluator = FidelityEvaluator::new(target.clone()).unwrap();
//! let channel = target.ptm().unwrap();
//! assert!((evaluator.average_gate_fidelity(&channel).unwrap() - 1.0).abs() < 1e-9);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Preparation and measurement bases (Gantree: L3_Tomography → Basis)
pub mod basis;

/// Pauli strings (Gantree: L3_Tomography → Pauli)
pub mod pauli;

/// Circuit generation (Gantree: L3_Tomography → Generator)
pub mod generator;

/// Labels and paired results (Gantree: L3_Tomography → Result)
pub mod result;

/// Process matrices (Gantree: L3_Tomography → ProcessMatrix)
pub mod process;

/// Channel fitting (Gantree: L3_Tomography → ChannelFitter)
pub mod fitter;

/// Fidelity evaluation (Gantree: L3_Tomography → FidelityEvaluator)
pub mod fidelity;

// ============================================================================
// Re-exports
// ============================================================================

pub use basis::{PrepBasis, PrepState, TomographyBasis};
pub use fidelity::{average_gate_fidelity, process_fidelity, FidelityEvaluator, TargetUnitary};
pub use fitter::{fit_channel, ChannelFitter, FitMethod};
pub use generator::{process_tomography_circuits, TomographyCircuit};
pub use pauli::{Pauli, PauliString};
pub use process::ProcessMatrix;
pub use result::{TomographyLabel, TomographyRecord, TomographyResult};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases

    pub use crate::basis::{PrepBasis, PrepState, TomographyBasis};
    pub use crate::fidelity::{average_gate_fidelity, FidelityEvaluator, TargetUnitary};
    pub use crate::fitter::{ChannelFitter, FitMethod};
    pub use crate::generator::{process_tomography_circuits, TomographyCircuit};
    pub use crate::process::ProcessMatrix;
    pub use crate::result::{TomographyLabel, TomographyRecord, TomographyResult};
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
    use super::generator::{circuits, labels};
    use super::prelude::*;
    use qpt_backend::{wait_for_results, JobRunner, LocalJobRunner, SimulatorBackend};
    use qpt_core::CircuitBuilder;
    use std::time::Duration;

    #[test]
    fn test_cnot_tomography_through_job_runner() {
        let circuit = CircuitBuilder::new(2).cnot(0, 1).build();
        let family =
            process_tomography_circuits(&circuit, &[0, 1], TomographyBasis::minimal()).unwrap();

        let runner = LocalJobRunner::new(SimulatorBackend::ideal(2).with_seed(17))
            .with_max_circuits_per_job(50);
        let id = runner.submit(&circuits(&family), 4000, "cnot_qpt").unwrap();
        let results =
            wait_for_results(&runner, &id, Duration::from_secs(30), Duration::from_millis(1))
                .unwrap();

        let data = TomographyResult::from_execution(&labels(&family), &results).unwrap();
        assert_eq!(data.len(), 144);

        let channel = ChannelFitter::new(2, PrepBasis::Minimal)
            .unwrap()
            .fit(&data)
            .unwrap();
        let target = TargetUnitary::from_circuit(&circuit, &[0, 1]).unwrap();
        let f = average_gate_fidelity(&channel, &target).unwrap();
        assert!(f > 0.97, "fidelity {}", f);
        assert!(f <= 1.0);
    }

    #[test]
    fn test_noisy_channel_scores_below_ideal() {
        let circuit = CircuitBuilder::new(1).h(0).build();
        let family =
            process_tomography_circuits(&circuit, &[0], TomographyBasis::overcomplete()).unwrap();
        let backend = SimulatorBackend::from_depol(1, 0.2).unwrap();

        let records = family
            .iter()
            .map(|tc| {
                let (probs, _) = backend.probabilities(&tc.circuit).unwrap();
                let counts = [("0", probs[0]), ("1", probs[1])]
                    .into_iter()
                    .map(|(k, p)| (k.to_string(), (p * 1e6).round() as u64))
                    .collect();
                TomographyRecord {
                    label: tc.label.clone(),
                    counts,
                }
            })
            .collect();
        let data = TomographyResult::new(1, records).unwrap();

        let channel = ChannelFitter::new(1, PrepBasis::Overcomplete)
            .unwrap()
            .fit(&data)
            .unwrap();
        let target = TargetUnitary::from_circuit(&circuit, &[0]).unwrap();
        let f = average_gate_fidelity(&channel, &target).unwrap();
        assert!(f < 0.95 && f > 0.5, "fidelity {}", f);
        assert!(channel.is_trace_preserving(1e-9));
    }
}
