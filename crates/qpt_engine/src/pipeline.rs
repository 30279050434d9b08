//! Pipeline for staged fidelity estimation
//!
//! Gantree: L4_Engine → Pipeline
//!
//! generate → submit → retrieve → mitigate → estimate, with every
//! intermediate kept in the pipeline state.

use crate::config::FidelityConfig;
use crate::estimator::{FidelityEstimate, MonteCarloEstimator};
use qpt_backend::{wait_for_results, JobRunner, MeasurementFilter, TensoredMeasFilter};
use qpt_core::{Circuit, QptError, QptResult};
use qpt_tomography::generator::{circuits, labels};
use qpt_tomography::{
    process_tomography_circuits, TargetUnitary, TomographyCircuit, TomographyResult,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    /// Initial state
    Initial,
    /// Tomography circuits generated
    Generated,
    /// Job submitted
    Submitted,
    /// Raw counts retrieved
    Retrieved,
    /// Counts mitigated (or passed through)
    Mitigated,
    /// Estimate computed
    Estimated,
}

/// Pipeline state holding intermediate results
#[derive(Debug, Clone)]
pub struct PipelineState {
    /// Current stage
    pub stage: PipelineStage,

    /// Configuration
    pub config: FidelityConfig,

    /// Generated tomography circuits
    pub circuits: Option<Vec<TomographyCircuit>>,

    /// Submitted job id
    pub job_id: Option<String>,

    /// Retrieved counts
    pub raw: Option<TomographyResult>,

    /// Counts handed to the estimator
    pub data: Option<TomographyResult>,

    /// Fidelity estimate
    pub estimate: Option<FidelityEstimate>,
}

impl PipelineState {
    /// Create new pipeline state
    pub fn new(config: FidelityConfig) -> Self {
        Self {
            stage: PipelineStage::Initial,
            config,
            circuits: None,
            job_id: None,
            raw: None,
            data: None,
            estimate: None,
        }
    }

    /// Check if circuits are generated
    pub fn is_generated(&self) -> bool {
        self.circuits.is_some()
    }

    /// Check if a job was submitted
    pub fn is_submitted(&self) -> bool {
        self.job_id.is_some()
    }

    /// Check if counts were retrieved
    pub fn is_retrieved(&self) -> bool {
        self.raw.is_some()
    }

    /// Check if estimated
    pub fn is_estimated(&self) -> bool {
        self.estimate.is_some()
    }
}

/// Summary of one full run
/// Gantree: FidelityRun // 실행 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FidelityRun {
    /// Job name
    pub job_name: String,

    /// Job id the counts came from
    pub job_id: String,

    /// Target qubits
    pub num_qubits: usize,

    /// Tomography circuits
    pub num_circuits: usize,

    /// Total shots over all circuits
    pub total_shots: u64,

    /// Readout mitigation applied
    pub mitigated: bool,

    /// Fidelity of the unresampled fit
    pub direct_fidelity: f64,

    /// Monte Carlo estimate
    pub estimate: FidelityEstimate,

    /// Wall time of the run
    pub elapsed_ms: u64,
}

/// Staged fidelity-estimation pipeline
/// Gantree: Pipeline // 단계별 실행
pub struct Pipeline<R: JobRunner> {
    state: PipelineState,
    runner: R,
    circuit: Circuit,
    target: TargetUnitary,
    filter: Option<Box<dyn MeasurementFilter>>,
}

impl<R: JobRunner> Pipeline<R> {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create pipeline characterizing `circuit` against `target`
    pub fn new(
        config: FidelityConfig,
        runner: R,
        circuit: Circuit,
        target: TargetUnitary,
    ) -> Self {
        Self {
            state: PipelineState::new(config),
            runner,
            circuit,
            target,
            filter: None,
        }
    }

    /// Create pipeline characterizing `circuit` against the Toffoli
    pub fn toffoli(config: FidelityConfig, runner: R, circuit: Circuit) -> Self {
        Self::new(config, runner, circuit, TargetUnitary::toffoli())
    }

    /// Use a pre-calibrated readout filter
    pub fn with_filter(mut self, filter: impl MeasurementFilter + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self.state.config.mitigate = true;
        self
    }

    // ========================================================================
    // Stage Accessors
    // ========================================================================

    /// Get current stage
    pub fn stage(&self) -> PipelineStage {
        self.state.stage
    }

    /// Get current state
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Get configuration
    pub fn config(&self) -> &FidelityConfig {
        &self.state.config
    }

    /// Get job runner
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Get target unitary
    pub fn target(&self) -> &TargetUnitary {
        &self.target
    }

    // ========================================================================
    // Pipeline Stages
    // ========================================================================

    /// Stage 1: generate tomography circuits
    pub fn generate(&mut self) -> QptResult<&[TomographyCircuit]> {
        let config = &self.state.config;
        config.validate()?;
        if self.target.num_qubits() != config.num_qubits() {
            return Err(QptError::DimensionMismatch {
                expected: config.num_qubits(),
                found: self.target.num_qubits(),
            });
        }

        let family = process_tomography_circuits(
            &self.circuit,
            &config.targets,
            config.tomography_basis(),
        )?;
        log::info!(
            "pipeline: generated {} tomography circuits on {:?}",
            family.len(),
            config.targets
        );

        self.state.stage = PipelineStage::Generated;
        Ok(self.state.circuits.insert(family).as_slice())
    }

    /// Stage 2: submit the family as one job
    pub fn submit(&mut self) -> QptResult<&str> {
        let batch = circuits(self.generated()?);
        let config = &self.state.config;
        let job_id = self
            .runner
            .submit(&batch, config.shots, &config.job_name)?;
        log::info!("pipeline: submitted {} as {}", config.job_name, job_id);

        self.state.raw = None;
        self.state.data = None;
        self.state.estimate = None;
        self.state.stage = PipelineStage::Submitted;
        Ok(self.state.job_id.insert(job_id).as_str())
    }

    /// Stage 3: wait for the job and pair its results with the labels
    pub fn retrieve(&mut self) -> QptResult<&TomographyResult> {
        let job_id = self
            .state
            .job_id
            .clone()
            .ok_or_else(|| QptError::Config("no job has been submitted".into()))?;
        let family_labels = labels(self.generated()?);

        let config = &self.state.config;
        let results = wait_for_results(
            &self.runner,
            &job_id,
            config.timeout(),
            config.poll_interval(),
        )?;
        let raw = TomographyResult::from_execution(&family_labels, &results)?;
        log::info!(
            "pipeline: retrieved {} results ({} shots) from {}",
            raw.len(),
            raw.total_shots(),
            job_id
        );

        self.state.data = None;
        self.state.estimate = None;
        self.state.stage = PipelineStage::Retrieved;
        Ok(&*self.state.raw.insert(raw))
    }

    /// Calibrate a tensored readout filter on the target qubits
    pub fn calibrate(&mut self) -> QptResult<()> {
        let config = &self.state.config;
        let cal = TensoredMeasFilter::calibration_circuits_on(
            self.circuit.num_qubits(),
            &config.targets,
        )?;
        let name = format!("{}_cal", config.job_name);
        let job_id = self.runner.submit(&cal, config.shots, &name)?;
        let results = wait_for_results(
            &self.runner,
            &job_id,
            config.timeout(),
            config.poll_interval(),
        )?;
        if results.len() != 2 {
            return Err(QptError::DimensionMismatch {
                expected: 2,
                found: results.len(),
            });
        }

        let filter = TensoredMeasFilter::from_calibration(
            config.num_qubits(),
            &results[0].counts,
            &results[1].counts,
        )?;
        log::info!("pipeline: calibrated readout rates {:?}", filter.rates());
        self.filter = Some(Box::new(filter));
        Ok(())
    }

    /// Stage 4: apply the readout filter when mitigation is enabled
    pub fn mitigate(&mut self) -> QptResult<&TomographyResult> {
        if self.state.raw.is_none() {
            self.retrieve()?;
        }
        if self.state.config.mitigate && self.filter.is_none() {
            self.calibrate()?;
        }

        let raw = self
            .state
            .raw
            .as_ref()
            .ok_or_else(|| QptError::InternalError("retrieved counts missing".into()))?;
        let data = match (&self.filter, self.state.config.mitigate) {
            (Some(filter), true) => {
                log::info!("pipeline: mitigating {} histograms", raw.len());
                raw.map_counts(|record| filter.apply(&record.counts))?
            }
            _ => raw.clone(),
        };

        self.state.estimate = None;
        self.state.stage = PipelineStage::Mitigated;
        Ok(&*self.state.data.insert(data))
    }

    /// Stage 5: Monte Carlo estimate over the prepared counts
    pub fn estimate(&mut self) -> QptResult<&FidelityEstimate> {
        if self.state.data.is_none() {
            self.mitigate()?;
        }
        let data = self
            .state
            .data
            .as_ref()
            .ok_or_else(|| QptError::InternalError("prepared counts missing".into()))?;

        let estimator = MonteCarloEstimator::from_config(self.target.clone(), &self.state.config)?;
        let estimate = estimator.estimate(data)?;

        self.state.stage = PipelineStage::Estimated;
        Ok(&*self.state.estimate.insert(estimate))
    }

    /// Run all stages in sequence
    pub fn run(&mut self) -> QptResult<FidelityRun> {
        let start = Instant::now();

        self.generate()?;
        self.submit()?;
        self.retrieve()?;
        self.mitigate()?;
        self.estimate()?;

        self.summarize(start)
    }

    /// Estimate from an already-submitted job
    ///
    /// The job must have been submitted with the circuits this pipeline
    /// generates, in the same order.
    /// Gantree: estimate_from_job(job_id) -> Result<FidelityRun> // 작업 ID 재분석
    pub fn estimate_from_job(&mut self, job_id: &str) -> QptResult<FidelityRun> {
        let start = Instant::now();

        self.generate()?;
        self.state.job_id = Some(job_id.to_string());
        self.state.raw = None;
        self.state.data = None;
        self.state.estimate = None;
        self.state.stage = PipelineStage::Submitted;

        self.retrieve()?;
        self.mitigate()?;
        self.estimate()?;

        self.summarize(start)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn generated(&mut self) -> QptResult<&[TomographyCircuit]> {
        if self.state.circuits.is_none() {
            self.generate()?;
        }
        self.state
            .circuits
            .as_deref()
            .ok_or_else(|| QptError::InternalError("generated circuits missing".into()))
    }

    fn summarize(&self, start: Instant) -> QptResult<FidelityRun> {
        let missing = |what: &str| QptError::InternalError(format!("{} missing", what));
        let data = self.state.data.as_ref().ok_or_else(|| missing("counts"))?;
        let estimate = self
            .state
            .estimate
            .clone()
            .ok_or_else(|| missing("estimate"))?;
        let job_id = self.state.job_id.clone().ok_or_else(|| missing("job id"))?;

        let estimator = MonteCarloEstimator::from_config(self.target.clone(), &self.state.config)?;
        let direct_fidelity = estimator.direct_fidelity(data)?;

        Ok(FidelityRun {
            job_name: self.state.config.job_name.clone(),
            job_id,
            num_qubits: data.num_qubits(),
            num_circuits: data.len(),
            total_shots: data.total_shots(),
            mitigated: self.state.config.mitigate && self.filter.is_some(),
            direct_fidelity,
            estimate,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
