//! Monte Carlo fidelity estimation
//!
//! Gantree: L4_Engine → MonteCarloEstimator
//!
//! Each trial resamples every histogram, refits the channel and scores it
//! against the target. The estimate is the trial mean with a half-width of
//! `z · pstdev` (population standard deviation, denominator N).
//!
//! Trial i draws from `ChaCha8Rng::seed_from_u64(seeds[i])`, where the
//! seeds come from one master stream. A fixed seed therefore gives the same
//! estimate whether trials run sequentially or on the rayon pool.

use crate::config::FidelityConfig;
use crate::resample::resample;
use qpt_core::{stats, QptError, QptResult};
use qpt_tomography::{
    ChannelFitter, FidelityEvaluator, FitMethod, PrepBasis, TargetUnitary, TomographyResult,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Estimate
// ============================================================================

/// Fidelity with a symmetric confidence half-width
/// Gantree: FidelityEstimate // 충실도 추정치
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FidelityEstimate {
    /// Mean over trials
    pub mean: f64,

    /// `confidence_z` times the population standard deviation
    pub error_bound: f64,

    /// Per-trial fidelities in trial order
    pub trials: Vec<f64>,

    /// Critical value used for the bound
    pub confidence_z: f64,
}

impl FidelityEstimate {
    /// Summarize trial fidelities
    pub fn from_trials(trials: Vec<f64>, confidence_z: f64) -> QptResult<Self> {
        if trials.is_empty() {
            return Err(QptError::Config("at least one trial is required".into()));
        }
        let n = trials.len() as f64;
        let mean = trials.iter().sum::<f64>() / n;
        let variance = trials.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / n;
        Ok(Self {
            mean,
            error_bound: confidence_z * variance.sqrt(),
            trials,
            confidence_z,
        })
    }

    /// Number of trials
    pub fn num_trials(&self) -> usize {
        self.trials.len()
    }

    /// Population standard deviation of the trials
    pub fn std_dev(&self) -> f64 {
        if self.confidence_z > 0.0 {
            self.error_bound / self.confidence_z
        } else {
            0.0
        }
    }

    /// `(mean - bound, mean + bound)`
    pub fn interval(&self) -> (f64, f64) {
        (self.mean - self.error_bound, self.mean + self.error_bound)
    }

    /// Check if `value` lies inside the interval
    pub fn contains(&self, value: f64) -> bool {
        let (lo, hi) = self.interval();
        (lo..=hi).contains(&value)
    }
}

impl fmt::Display for FidelityEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.4} ± {:.4} (z={}, N={})",
            self.mean,
            self.error_bound,
            self.confidence_z,
            self.trials.len()
        )
    }
}

// ============================================================================
// Estimator
// ============================================================================

/// Monte Carlo error-bar estimator
/// Gantree: MonteCarloEstimator // 몬테카를로 추정기
#[derive(Debug, Clone)]
pub struct MonteCarloEstimator {
    fitter: ChannelFitter,
    evaluator: FidelityEvaluator,
    trials: usize,
    confidence_z: f64,
    seed: Option<u64>,
    parallel: bool,
}

impl MonteCarloEstimator {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Estimator with the four-state basis, least squares, 95% bound
    pub fn new(target: TargetUnitary, trials: usize) -> QptResult<Self> {
        Ok(Self {
            fitter: ChannelFitter::new(target.num_qubits(), PrepBasis::Minimal)?,
            evaluator: FidelityEvaluator::new(target)?,
            trials,
            confidence_z: stats::Z_CRIT_95,
            seed: None,
            parallel: false,
        })
    }

    /// Estimator following a validated configuration
    pub fn from_config(target: TargetUnitary, config: &FidelityConfig) -> QptResult<Self> {
        config.validate()?;
        if target.num_qubits() != config.num_qubits() {
            return Err(QptError::DimensionMismatch {
                expected: config.num_qubits(),
                found: target.num_qubits(),
            });
        }
        let mut estimator = Self::new(target, config.trials)?
            .with_prep_basis(config.prep_basis)?
            .with_fit_method(config.fit_method)
            .with_confidence_z(config.confidence_z)
            .with_parallel(config.parallel);
        estimator.seed = config.seed;
        Ok(estimator)
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    /// Set preparation basis of the fitted data
    pub fn with_prep_basis(mut self, prep_basis: PrepBasis) -> QptResult<Self> {
        let method = self.fitter.method();
        self.fitter = ChannelFitter::new(self.fitter.num_qubits(), prep_basis)?.with_method(method);
        Ok(self)
    }

    /// Set fit method
    pub fn with_fit_method(mut self, method: FitMethod) -> Self {
        self.fitter = self.fitter.with_method(method);
        self
    }

    /// Set trial count
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Set critical value
    pub fn with_confidence_z(mut self, z: f64) -> Self {
        self.confidence_z = z;
        self
    }

    /// Set master seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Run trials on the rayon pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Trial count
    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Target unitary
    pub fn target(&self) -> &TargetUnitary {
        self.evaluator.target()
    }

    /// Channel fitter
    pub fn fitter(&self) -> &ChannelFitter {
        &self.fitter
    }

    // ========================================================================
    // Estimation
    // ========================================================================

    /// Fidelity of the unresampled data
    /// Gantree: direct_fidelity(data) -> Result<f64> // 직접 충실도
    pub fn direct_fidelity(&self, data: &TomographyResult) -> QptResult<f64> {
        self.check_dimensions(data)?;
        let channel = self.fitter.fit(data)?;
        self.evaluator.average_gate_fidelity(&channel)
    }

    /// One resample → fit → evaluate trial
    pub fn run_trial(&self, data: &TomographyResult, seed: u64) -> QptResult<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let resampled = resample(&mut rng, data)?;
        let channel = self.fitter.fit(&resampled)?;
        self.evaluator.average_gate_fidelity(&channel)
    }

    /// Per-trial seeds drawn from the master stream
    pub fn trial_seeds(&self) -> Vec<u64> {
        let mut master = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        (0..self.trials).map(|_| master.gen::<u64>()).collect()
    }

    /// Mean fidelity and error bound over all trials
    ///
    /// The first failing trial aborts the estimate.
    /// Gantree: estimate(data) -> Result<FidelityEstimate> // 오차 막대 추정
    pub fn estimate(&self, data: &TomographyResult) -> QptResult<FidelityEstimate> {
        if self.trials == 0 {
            return Err(QptError::Config("trials must be > 0".into()));
        }
        if !self.confidence_z.is_finite() || self.confidence_z <= 0.0 {
            return Err(QptError::Config(format!(
                "confidence_z must be positive, got {}",
                self.confidence_z
            )));
        }
        self.check_dimensions(data)?;

        let seeds = self.trial_seeds();
        let trial = |(i, &seed): (usize, &u64)| -> QptResult<f64> {
            let fidelity = self.run_trial(data, seed)?;
            log::debug!("Trial {}: {}", i, fidelity);
            Ok(fidelity)
        };

        let fidelities = if self.parallel {
            seeds.par_iter().enumerate().map(trial).collect::<QptResult<Vec<f64>>>()?
        } else {
            seeds.iter().enumerate().map(trial).collect::<QptResult<Vec<f64>>>()?
        };

        let estimate = FidelityEstimate::from_trials(fidelities, self.confidence_z)?;
        log::info!(
            "fidelity {:.6} ± {:.6} over {} trials ({} circuits)",
            estimate.mean,
            estimate.error_bound,
            estimate.num_trials(),
            data.len()
        );
        Ok(estimate)
    }

    fn check_dimensions(&self, data: &TomographyResult) -> QptResult<()> {
        let expected = self.target().num_qubits();
        if data.num_qubits() != expected {
            return Err(QptError::DimensionMismatch {
                expected,
                found: data.num_qubits(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qpt_backend::SimulatorBackend;
    use qpt_core::{sample_counts, Circuit, CircuitBuilder};
    use qpt_tomography::{process_tomography_circuits, TomographyBasis, TomographyRecord};

    fn synthesize(
        circuit: &Circuit,
        backend: &SimulatorBackend,
        shots: u64,
        seed: u64,
    ) -> TomographyResult {
        let targets: Vec<usize> = (0..circuit.num_qubits()).collect();
        let family =
            process_tomography_circuits(circuit, &targets, TomographyBasis::minimal()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let records = family
            .iter()
            .map(|tc| {
                let (probs, width) = backend.probabilities(&tc.circuit).unwrap();
                TomographyRecord {
                    label: tc.label.clone(),
                    counts: sample_counts(&mut rng, &probs, width, shots).unwrap(),
                }
            })
            .collect();
        TomographyResult::new(targets.len(), records).unwrap()
    }

    fn noisy_hadamard() -> (TomographyResult, TargetUnitary) {
        let circuit = CircuitBuilder::new(1).h(0).build();
        let backend = SimulatorBackend::from_depol(1, 0.1).unwrap();
        let data = synthesize(&circuit, &backend, 4096, 21);
        let target = TargetUnitary::from_circuit(&circuit, &[0]).unwrap();
        (data, target)
    }

    #[test]
    fn test_single_trial_has_zero_bound() {
        let (data, target) = noisy_hadamard();
        let estimate = MonteCarloEstimator::new(target, 1)
            .unwrap()
            .with_seed(1)
            .estimate(&data)
            .unwrap();
        assert_eq!(estimate.num_trials(), 1);
        assert_eq!(estimate.error_bound, 0.0);
        assert_eq!(estimate.mean, estimate.trials[0]);
    }

    #[test]
    fn test_zero_trials_is_config_error() {
        let (data, target) = noisy_hadamard();
        let estimator = MonteCarloEstimator::new(target, 0).unwrap();
        assert!(matches!(
            estimator.estimate(&data),
            Err(QptError::Config(_))
        ));
        assert!(FidelityEstimate::from_trials(vec![], 1.96).is_err());
    }

    #[test]
    fn test_mean_tracks_direct_fit() {
        let (data, target) = noisy_hadamard();
        let estimator = MonteCarloEstimator::new(target, 1000)
            .unwrap()
            .with_seed(2024)
            .with_parallel(true);
        let direct = estimator.direct_fidelity(&data).unwrap();
        let estimate = estimator.estimate(&data).unwrap();

        assert!(direct < 0.99 && direct > 0.8, "direct {}", direct);
        assert_abs_diff_eq!(estimate.mean, direct, epsilon = 0.005);
        assert!(estimate.error_bound > 0.0);
        assert!(estimate.trials.iter().all(|f| (0.0..=1.0).contains(f)));
    }

    #[test]
    fn test_seed_determinism_and_parallel_agreement() {
        let (data, target) = noisy_hadamard();
        let sequential = MonteCarloEstimator::new(target, 40)
            .unwrap()
            .with_seed(77)
            .with_parallel(false);
        let parallel = sequential.clone().with_parallel(true);

        let a = sequential.estimate(&data).unwrap();
        let b = sequential.estimate(&data).unwrap();
        let c = parallel.estimate(&data).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);

        let d = sequential.with_seed(78).estimate(&data).unwrap();
        assert_ne!(a.trials, d.trials);
    }

    #[test]
    fn test_dimension_mismatch() {
        let (data, _) = noisy_hadamard();
        let estimator = MonteCarloEstimator::new(TargetUnitary::toffoli(), 3).unwrap();
        assert!(matches!(
            estimator.estimate(&data),
            Err(QptError::DimensionMismatch {
                expected: 3,
                found: 1
            })
        ));
    }

    #[test]
    fn test_failing_trial_aborts() {
        let (data, target) = noisy_hadamard();
        let broken = data
            .map_counts(|r| {
                if r.label.to_string() == "(Xp)-Y" {
                    Ok(r.counts.keys().map(|k| (k.clone(), 0)).collect())
                } else {
                    Ok(r.counts.clone())
                }
            })
            .unwrap();
        let estimator = MonteCarloEstimator::new(target, 5).unwrap().with_seed(3);
        assert!(matches!(
            estimator.estimate(&broken),
            Err(QptError::Domain(_))
        ));
    }

    #[test]
    fn test_estimate_summary() {
        let estimate = FidelityEstimate::from_trials(vec![0.9, 0.8, 0.7], 2.0).unwrap();
        assert_abs_diff_eq!(estimate.mean, 0.8, epsilon = 1e-12);
        let pstdev = (0.02f64 / 3.0).sqrt();
        assert_abs_diff_eq!(estimate.error_bound, 2.0 * pstdev, epsilon = 1e-12);
        assert_abs_diff_eq!(estimate.std_dev(), pstdev, epsilon = 1e-12);
        assert!(estimate.contains(0.75));
        assert!(!estimate.contains(0.5));
        assert!(estimate.to_string().starts_with("0.8000 ±"));
    }

    #[test]
    fn test_from_config() {
        let config = FidelityConfig::quick(1).with_trials(3);
        let estimator =
            MonteCarloEstimator::from_config(TargetUnitary::toffoli(), &config);
        assert!(matches!(
            estimator,
            Err(QptError::DimensionMismatch { .. })
        ));

        let (data, target) = noisy_hadamard();
        let estimator = MonteCarloEstimator::from_config(target, &config).unwrap();
        assert_eq!(estimator.trials(), 3);
        let a = estimator.estimate(&data).unwrap();
        let b = estimator.estimate(&data).unwrap();
        assert_eq!(a, b);
    }
}
