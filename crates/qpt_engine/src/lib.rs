//! # QPT Engine
//!
//! Monte Carlo fidelity estimation over process tomography data.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qpt_engine // L4: Estimation
//!     FidelityConfig // 추정 설정
//!         targets, prep_basis, shots, trials, seed
//!         validate(), load()/save()
//!     Resampler // 다항 재표본
//!     MonteCarloEstimator // 오차 막대
//!         estimate() - N회 재표본 → 피팅 → 충실도
//!         direct_fidelity() - 원자료 피팅
//!     Pipeline // 단계별 실행
//!         generate() → submit() → retrieve() → mitigate() → estimate()
//!         estimate_from_job() - 기존 작업 재분석
//!     Reporter // 결과 리포팅
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qpt_engine::prelude::*;
//! use qpt_backend::{LocalJobRunner, SimulatorBackend};
//! use qpt_core::CircuitBuilder;
//!
//! let circuit = CircuitBuilder::new(3).canonical_full_toffoli([0, 1, 2]).build();
//! let runner = LocalJobRunner::new(SimulatorBackend::from_depol(3, 0.01).unwrap());
//! let config = FidelityConfig::default_toffoli().with_trials(20).with_seed(7);
//!
//! let mut pipeline = Pipeline::toffoli(config, runner, circuit);
//! let run = pipeline.run().unwrap();
//! println!("{}", Reporter::report(&run, ReportFormat::Text));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Configuration (Gantree: L4_Engine → FidelityConfig)
pub mod config;

/// Count resampling (Gantree: L4_Engine → Resampler)
pub mod resample;

/// Monte Carlo estimator (Gantree: L4_Engine → MonteCarloEstimator)
pub mod estimator;

/// Staged pipeline (Gantree: L4_Engine → Pipeline)
pub mod pipeline;

/// Reporting (Gantree: L4_Engine → Reporter)
pub mod report;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::FidelityConfig;
pub use estimator::{FidelityEstimate, MonteCarloEstimator};
pub use pipeline::{FidelityRun, Pipeline, PipelineStage, PipelineState};
pub use report::{ReportFormat, Reporter};
pub use resample::{resample, resample_counts, Resampler};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases

    pub use crate::config::FidelityConfig;
    pub use crate::estimator::{FidelityEstimate, MonteCarloEstimator};
    pub use crate::pipeline::{FidelityRun, Pipeline, PipelineStage};
    pub use crate::report::{ReportFormat, Reporter};
    pub use crate::resample::Resampler;
    pub use qpt_tomography::{FitMethod, PrepBasis, TargetUnitary, TomographyResult};
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
    use approx::assert_abs_diff_eq;
    use qpt_backend::{LocalJobRunner, SimulatorBackend};
    use qpt_core::{sample_counts, CircuitBuilder, QptError};
    use qpt_tomography::{process_tomography_circuits, TomographyBasis, TomographyRecord};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_noiseless_toffoli_end_to_end() {
        let circuit = CircuitBuilder::new(3)
            .canonical_full_toffoli([0, 1, 2])
            .build();
        let runner = LocalJobRunner::new(SimulatorBackend::ideal(3).with_seed(2023));
        let config = FidelityConfig::default_toffoli()
            .with_trials(50)
            .with_seed(11)
            .with_poll_ms(1);

        let mut pipeline = Pipeline::toffoli(config, runner, circuit);
        let run = pipeline.run().unwrap();

        assert_eq!(run.num_circuits, 1728);
        assert_eq!(run.total_shots, 1728 * 8192);
        assert_eq!(runner_chunks(&pipeline, &run.job_id), 6);
        assert!(run.estimate.mean > 0.99, "{}", run.estimate);
        assert!(run.estimate.error_bound < 0.01, "{}", run.estimate);
        assert!(run.direct_fidelity > 0.99);
    }

    fn runner_chunks(
        pipeline: &Pipeline<LocalJobRunner<SimulatorBackend>>,
        job_id: &str,
    ) -> usize {
        pipeline.runner().chunk_count(job_id).unwrap()
    }

    #[test]
    fn test_fully_depolarized_toffoli_hits_floor() {
        let circuit = CircuitBuilder::new(3).ccx(0, 1, 2).build();
        let backend = SimulatorBackend::from_depol(3, 1.0).unwrap();
        let family =
            process_tomography_circuits(&circuit, &[0, 1, 2], TomographyBasis::minimal()).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let records = family
            .iter()
            .map(|tc| {
                let (probs, width) = backend.probabilities(&tc.circuit).unwrap();
                TomographyRecord {
                    label: tc.label.clone(),
                    counts: sample_counts(&mut rng, &probs, width, 8192).unwrap(),
                }
            })
            .collect();
        let data = TomographyResult::new(3, records).unwrap();

        let estimate = MonteCarloEstimator::new(TargetUnitary::toffoli(), 20)
            .unwrap()
            .with_seed(4)
            .with_parallel(true)
            .estimate(&data)
            .unwrap();
        assert_abs_diff_eq!(estimate.mean, 0.125, epsilon = 0.03);
    }

    #[test]
    fn test_missing_circuit_fails_fit() {
        let circuit = CircuitBuilder::new(1).x(0).build();
        let runner = LocalJobRunner::new(SimulatorBackend::ideal(1).with_seed(1));
        let config = FidelityConfig::quick(1).with_trials(2).with_poll_ms(1);
        let target = TargetUnitary::from_circuit(&circuit, &[0]).unwrap();

        let mut pipeline = Pipeline::new(config, runner, circuit, target.clone());
        pipeline.submit().unwrap();
        let data = pipeline.mitigate().unwrap().clone();
        let estimator = MonteCarloEstimator::new(target, 2).unwrap();

        assert!(estimator.estimate(&data).is_ok());
        assert!(matches!(
            estimator.estimate(&data.without(0)),
            Err(QptError::Fit(_))
        ));
    }
}
