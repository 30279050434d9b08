//! Fidelity estimation configuration
//!
//! Gantree: L4_Engine → FidelityConfig
//!
//! One serializable configuration covering tomography, job execution and
//! Monte Carlo estimation.

use qpt_core::{job, stats, tomography, QptError, QptResult, QubitId};
use qpt_tomography::{FitMethod, PrepBasis, TomographyBasis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Unified fidelity-estimation configuration
/// Gantree: FidelityConfig // 충실도 추정 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FidelityConfig {
    // ========================================================================
    // Tomography Parameters
    // ========================================================================
    /// Target qubits, local qubit j first
    pub targets: Vec<QubitId>,

    /// Preparation basis
    pub prep_basis: PrepBasis,

    /// Channel fit method
    pub fit_method: FitMethod,

    // ========================================================================
    // Execution Parameters
    // ========================================================================
    /// Shots per tomography circuit
    pub shots: u64,

    /// Job name
    pub job_name: String,

    /// Chunk size for batched submission
    pub max_circuits_per_job: usize,

    /// Job timeout in seconds
    pub timeout_s: u64,

    /// Status poll interval in milliseconds
    pub poll_ms: u64,

    /// Apply readout mitigation before estimation
    pub mitigate: bool,

    // ========================================================================
    // Estimation Parameters
    // ========================================================================
    /// Monte Carlo trials
    pub trials: usize,

    /// Critical value for the error bound
    pub confidence_z: f64,

    /// Master seed; `None` draws from entropy
    pub seed: Option<u64>,

    /// Run trials on the rayon pool
    pub parallel: bool,
}

impl FidelityConfig {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Three-qubit Toffoli characterization with 100 trials
    pub fn default_toffoli() -> Self {
        Self {
            targets: (0..tomography::TOFFOLI_QUBITS).collect(),
            prep_basis: PrepBasis::Minimal,
            fit_method: FitMethod::Lstsq,
            shots: stats::DEFAULT_SHOTS,
            job_name: "toffoli_qpt".to_string(),
            max_circuits_per_job: job::MAX_CIRCUITS_PER_JOB,
            timeout_s: job::DEFAULT_TIMEOUT_S,
            poll_ms: job::DEFAULT_POLL_MS,
            mitigate: false,
            trials: stats::DEFAULT_TRIALS,
            confidence_z: stats::Z_CRIT_95,
            seed: None,
            parallel: true,
        }
    }

    /// Fewer shots and trials, fixed seed
    pub fn quick(num_qubits: usize) -> Self {
        Self {
            targets: (0..num_qubits).collect(),
            shots: 2048,
            trials: 20,
            seed: Some(42),
            job_name: "quick_qpt".to_string(),
            ..Self::default_toffoli()
        }
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    /// Set target qubits
    pub fn with_targets(mut self, targets: Vec<QubitId>) -> Self {
        self.targets = targets;
        self
    }

    /// Set preparation basis
    pub fn with_prep_basis(mut self, prep_basis: PrepBasis) -> Self {
        self.prep_basis = prep_basis;
        self
    }

    /// Set fit method
    pub fn with_fit_method(mut self, method: FitMethod) -> Self {
        self.fit_method = method;
        self
    }

    /// Set shots
    pub fn with_shots(mut self, shots: u64) -> Self {
        self.shots = shots;
        self
    }

    /// Set job name
    pub fn with_job_name(mut self, name: impl Into<String>) -> Self {
        self.job_name = name.into();
        self
    }

    /// Set chunk size
    pub fn with_max_circuits_per_job(mut self, max: usize) -> Self {
        self.max_circuits_per_job = max;
        self
    }

    /// Set job timeout
    pub fn with_timeout_s(mut self, seconds: u64) -> Self {
        self.timeout_s = seconds;
        self
    }

    /// Set poll interval
    pub fn with_poll_ms(mut self, ms: u64) -> Self {
        self.poll_ms = ms;
        self
    }

    /// Enable readout mitigation
    pub fn with_mitigation(mut self, enabled: bool) -> Self {
        self.mitigate = enabled;
        self
    }

    /// Set trials
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Set critical value
    pub fn with_confidence_z(mut self, z: f64) -> Self {
        self.confidence_z = z;
        self
    }

    /// Set seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enable parallel trials
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// Number of target qubits
    pub fn num_qubits(&self) -> usize {
        self.targets.len()
    }

    /// Tomography basis
    pub fn tomography_basis(&self) -> TomographyBasis {
        TomographyBasis {
            prep: self.prep_basis,
        }
    }

    /// Circuits in the tomography family
    pub fn circuit_count(&self) -> usize {
        self.tomography_basis().circuit_count(self.num_qubits())
    }

    /// Job timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_s)
    }

    /// Poll interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate configuration
    pub fn validate(&self) -> QptResult<()> {
        if self.targets.is_empty() {
            return Err(QptError::Config("targets must not be empty".into()));
        }
        if self.targets.len() > tomography::MAX_TARGET_QUBITS {
            return Err(QptError::Config(format!(
                "{} targets exceeds the limit of {}",
                self.targets.len(),
                tomography::MAX_TARGET_QUBITS
            )));
        }
        if self.trials == 0 {
            return Err(QptError::Config("trials must be > 0".into()));
        }
        if self.shots < stats::MIN_SHOTS || self.shots > stats::MAX_SHOTS {
            return Err(QptError::Config(format!(
                "shots must be in [{}, {}], got {}",
                stats::MIN_SHOTS,
                stats::MAX_SHOTS,
                self.shots
            )));
        }
        if !self.confidence_z.is_finite() || self.confidence_z <= 0.0 {
            return Err(QptError::Config(format!(
                "confidence_z must be positive, got {}",
                self.confidence_z
            )));
        }
        if self.max_circuits_per_job == 0 {
            return Err(QptError::Config("max_circuits_per_job must be > 0".into()));
        }
        if self.job_name.trim().is_empty() {
            return Err(QptError::Config("job_name must not be empty".into()));
        }
        Ok(())
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> QptResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate JSON
    pub fn from_json(json: &str) -> QptResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> QptResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| QptError::FileError(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_json(&content)?;
        log::info!("loaded fidelity config from {}", path.display());
        Ok(config)
    }

    /// Save as a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> QptResult<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)
            .map_err(|e| QptError::FileError(format!("{}: {}", path.display(), e)))
    }
}

impl Default for FidelityConfig {
    fn default() -> Self {
        Self::default_toffoli()
    }
}

impl fmt::Display for FidelityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FidelityConfig({}Q {:?}, {:?}, shots={}, trials={}, z={})",
            self.num_qubits(),
            self.targets,
            self.prep_basis,
            self.shots,
            self.trials,
            self.confidence_z
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
