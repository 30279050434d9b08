//! Batched job submission and retrieval
//!
//! Gantree: L2_Backend → Job
//!
//! A job is one named batch of circuits run with a fixed shot count and
//! addressed by an opaque id. Circuits travel as OpenQASM 2.0 text, the
//! wire format of the cloud service. Batches larger than
//! `max_circuits_per_job` are split into chunks and tracked as one job set.

use crate::execution::{Backend, ExecutionResult};
use qpt_core::{job as job_consts, Circuit, QptError, QptResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

// ============================================================================
// Job Status
// ============================================================================

/// Job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Job is queued
    #[serde(alias = "queued", alias = "PENDING", alias = "pending")]
    Queued,

    /// Job is running
    #[serde(alias = "running")]
    Running,

    /// Job completed successfully
    #[serde(alias = "completed", alias = "DONE", alias = "done")]
    Completed,

    /// Job failed
    #[serde(alias = "failed", alias = "ERROR", alias = "error")]
    Failed,

    /// Job was cancelled
    #[serde(alias = "cancelled", alias = "CANCELED", alias = "canceled")]
    Cancelled,
}

impl JobStatus {
    /// Check if job is in terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Check if job is still running
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    /// Check if job completed successfully
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

// ============================================================================
// Wire Payload
// ============================================================================

/// One submitted chunk as it goes over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSubmission {
    /// Job name
    pub name: String,

    /// Shots per circuit
    pub shots: u64,

    /// Circuits as OpenQASM 2.0
    pub circuits: Vec<String>,
}

impl JobSubmission {
    /// Serialize circuits into a submission
    pub fn from_circuits(name: &str, circuits: &[Circuit], shots: u64) -> Self {
        Self {
            name: name.to_string(),
            shots,
            circuits: circuits.iter().map(Circuit::to_qasm).collect(),
        }
    }

    /// Parse the circuits back
    pub fn parse_circuits(&self) -> QptResult<Vec<Circuit>> {
        self.circuits.iter().map(|q| Circuit::from_qasm(q)).collect()
    }
}

// ============================================================================
// Job Runner Capability
// ============================================================================

/// Batch job capability
/// Gantree: JobRunner // 작업 실행 인터페이스
pub trait JobRunner: Send + Sync {
    /// Submit circuits as one named job, returning its id
    fn submit(&self, circuits: &[Circuit], shots: u64, name: &str) -> QptResult<String>;

    /// Current status of a job
    fn status(&self, job_id: &str) -> QptResult<JobStatus>;

    /// Results of a completed job, in submission order
    fn retrieve(&self, job_id: &str) -> QptResult<Vec<ExecutionResult>>;
}

/// Poll until the job is terminal, then retrieve its results
/// Gantree: wait_for_results(runner, id, timeout, poll) // 폴링 대기
pub fn wait_for_results<R: JobRunner + ?Sized>(
    runner: &R,
    job_id: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> QptResult<Vec<ExecutionResult>> {
    let start = Instant::now();

    loop {
        let status = runner.status(job_id)?;
        log::debug!("job {} status {:?}", job_id, status);

        match status {
            JobStatus::Completed => return runner.retrieve(job_id),
            JobStatus::Failed | JobStatus::Cancelled => {
                return Err(QptError::JobFailed {
                    job_id: job_id.to_string(),
                    reason: format!("{:?}", status),
                })
            }
            JobStatus::Queued | JobStatus::Running => {}
        }

        if start.elapsed() > timeout {
            return Err(QptError::JobTimeout {
                job_id: job_id.to_string(),
                seconds: timeout.as_secs(),
            });
        }

        std::thread::sleep(poll_interval);
    }
}

// ============================================================================
// Local Job Runner
// ============================================================================

#[derive(Debug)]
struct JobRecord {
    chunks: Vec<JobSubmission>,
    status: JobStatus,
    pending_polls: u32,
    results: Vec<ExecutionResult>,
    failure: Option<String>,
}

/// Job runner executing on a local backend
///
/// Jobs report `Queued` for the first `queue_polls` status calls and are
/// executed on the following one, which lets callers exercise polling.
/// Gantree: LocalJobRunner<B> // 로컬 작업 실행기
pub struct LocalJobRunner<B: Backend> {
    backend: B,
    max_circuits_per_job: usize,
    queue_polls: u32,
    jobs: Mutex<HashMap<String, JobRecord>>,
    next_id: AtomicU64,
}

impl<B: Backend> LocalJobRunner<B> {
    /// Create a runner over a backend
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            max_circuits_per_job: job_consts::MAX_CIRCUITS_PER_JOB,
            queue_polls: 0,
            jobs: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Set chunk size
    pub fn with_max_circuits_per_job(mut self, max: usize) -> Self {
        self.max_circuits_per_job = max.max(1);
        self
    }

    /// Number of status polls a job stays queued before running
    pub fn with_queue_polls(mut self, polls: u32) -> Self {
        self.queue_polls = polls;
        self
    }

    /// Get backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of chunks a job was split into
    pub fn chunk_count(&self, job_id: &str) -> QptResult<usize> {
        let jobs = self.lock()?;
        jobs.get(job_id)
            .map(|r| r.chunks.len())
            .ok_or_else(|| QptError::JobNotFound(job_id.to_string()))
    }

    fn lock(&self) -> QptResult<std::sync::MutexGuard<'_, HashMap<String, JobRecord>>> {
        self.jobs
            .lock()
            .map_err(|_| QptError::InternalError("job table lock poisoned".into()))
    }

    /// Execute every chunk; a failing chunk fails the whole job
    fn run(
        &self,
        job_id: &str,
        chunks: &[JobSubmission],
    ) -> Result<Vec<ExecutionResult>, String> {
        let mut results = Vec::new();

        for (i, chunk) in chunks.iter().enumerate() {
            let executed = chunk
                .parse_circuits()
                .and_then(|circuits| self.backend.execute_batch(&circuits, chunk.shots));
            match executed {
                Ok(chunk_results) => {
                    log::info!(
                        "job {} chunk {}/{}: {} circuits on {}",
                        job_id,
                        i + 1,
                        chunks.len(),
                        chunk_results.len(),
                        self.backend.name()
                    );
                    results.extend(chunk_results.into_iter().map(|mut r| {
                        r.metadata.job_id = Some(format!("{}-{}", job_id, i));
                        r
                    }));
                }
                Err(e) => {
                    log::warn!("job {} chunk {} failed: {}", job_id, i, e);
                    return Err(e.to_string());
                }
            }
        }
        Ok(results)
    }
}

impl<B: Backend> JobRunner for LocalJobRunner<B> {
    fn submit(&self, circuits: &[Circuit], shots: u64, name: &str) -> QptResult<String> {
        if circuits.is_empty() {
            return Err(QptError::EmptyCircuit);
        }
        let id = format!(
            "jobset-{}-{}",
            name,
            self.next_id.fetch_add(1, Ordering::Relaxed)
        );

        let chunks: Vec<JobSubmission> = circuits
            .chunks(self.max_circuits_per_job)
            .map(|chunk| JobSubmission::from_circuits(name, chunk, shots))
            .collect();
        log::info!(
            "submitted {} ({} circuits, {} chunks, {} shots)",
            id,
            circuits.len(),
            chunks.len(),
            shots
        );

        let record = JobRecord {
            chunks,
            status: JobStatus::Queued,
            pending_polls: self.queue_polls,
            results: Vec::new(),
            failure: None,
        };
        self.lock()?.insert(id.clone(), record);
        Ok(id)
    }

    fn status(&self, job_id: &str) -> QptResult<JobStatus> {
        // Claim the job under the lock, execute without it
        let chunks = {
            let mut jobs = self.lock()?;
            let record = jobs
                .get_mut(job_id)
                .ok_or_else(|| QptError::JobNotFound(job_id.to_string()))?;

            if record.status != JobStatus::Queued {
                return Ok(record.status);
            }
            if record.pending_polls > 0 {
                record.pending_polls -= 1;
                return Ok(record.status);
            }
            record.status = JobStatus::Running;
            record.chunks.clone()
        };

        let outcome = self.run(job_id, &chunks);

        let mut jobs = self.lock()?;
        let record = jobs
            .get_mut(job_id)
            .ok_or_else(|| QptError::JobNotFound(job_id.to_string()))?;
        match outcome {
            Ok(results) => {
                record.results = results;
                record.status = JobStatus::Completed;
            }
            Err(reason) => {
                record.failure = Some(reason);
                record.status = JobStatus::Failed;
            }
        }
        Ok(record.status)
    }

    fn retrieve(&self, job_id: &str) -> QptResult<Vec<ExecutionResult>> {
        let jobs = self.lock()?;
        let record = jobs
            .get(job_id)
            .ok_or_else(|| QptError::JobNotFound(job_id.to_string()))?;

        match record.status {
            JobStatus::Completed => Ok(record.results.clone()),
            JobStatus::Failed | JobStatus::Cancelled => Err(QptError::JobFailed {
                job_id: job_id.to_string(),
                reason: record
                    .failure
                    .clone()
                    .unwrap_or_else(|| format!("{:?}", record.status)),
            }),
            JobStatus::Queued | JobStatus::Running => Err(QptError::BackendError(format!(
                "job {} results not ready",
                job_id
            ))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::SimulatorBackend;
    use qpt_core::CircuitBuilder;
    use std::sync::mpsc;

    fn named_circuits(n: usize) -> Vec<Circuit> {
        (0..n)
            .map(|i| {
                let mut c = CircuitBuilder::new(2).x(i % 2).measure_all().build();
                c.set_name(format!("c{}", i));
                c
            })
            .collect()
    }

    #[test]
    fn test_job_status_terminal() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Queued.is_running());
        assert!(JobStatus::Completed.is_success());
    }

    #[test]
    fn test_job_status_deserialize_aliases() {
        let s: JobStatus = serde_json::from_str("\"DONE\"").unwrap();
        assert_eq!(s, JobStatus::Completed);
        let s: JobStatus = serde_json::from_str("\"QUEUED\"").unwrap();
        assert_eq!(s, JobStatus::Queued);
    }

    #[test]
    fn test_submission_qasm_roundtrip() {
        let circuits = named_circuits(3);
        let submission = JobSubmission::from_circuits("qpt", &circuits, 100);
        assert_eq!(submission.parse_circuits().unwrap(), circuits);
    }

    #[test]
    fn test_chunked_job_preserves_order() {
        let runner = LocalJobRunner::new(SimulatorBackend::ideal(2).with_seed(1))
            .with_max_circuits_per_job(2);
        let circuits = named_circuits(5);
        let id = runner.submit(&circuits, 50, "order").unwrap();
        assert_eq!(runner.chunk_count(&id).unwrap(), 3);

        let results =
            wait_for_results(&runner, &id, Duration::from_secs(5), Duration::from_millis(1))
                .unwrap();
        assert_eq!(results.len(), 5);
        for (i, r) in results.iter().enumerate() {
            assert_eq!(r.metadata.circuit_name.as_deref(), Some(format!("c{}", i).as_str()));
            let expected = if i % 2 == 0 { "01" } else { "10" };
            assert_eq!(r.counts.get(expected), Some(&50));
        }
    }

    #[test]
    fn test_unknown_job() {
        let runner = LocalJobRunner::new(SimulatorBackend::ideal(1));
        assert!(matches!(
            runner.status("nope"),
            Err(QptError::JobNotFound(_))
        ));
        assert!(matches!(
            runner.retrieve("nope"),
            Err(QptError::JobNotFound(_))
        ));
    }

    #[test]
    fn test_queued_job_polls_then_completes() {
        let runner = LocalJobRunner::new(SimulatorBackend::ideal(2)).with_queue_polls(2);
        let id = runner.submit(&named_circuits(1), 10, "poll").unwrap();
        assert_eq!(runner.status(&id).unwrap(), JobStatus::Queued);
        assert!(runner.retrieve(&id).is_err());
        assert_eq!(runner.status(&id).unwrap(), JobStatus::Queued);
        assert_eq!(runner.status(&id).unwrap(), JobStatus::Completed);
        assert_eq!(runner.retrieve(&id).unwrap().len(), 1);
    }

    #[test]
    fn test_wait_times_out() {
        let runner = LocalJobRunner::new(SimulatorBackend::ideal(2)).with_queue_polls(u32::MAX);
        let id = runner.submit(&named_circuits(1), 10, "slow").unwrap();
        let err = wait_for_results(&runner, &id, Duration::from_millis(5), Duration::from_millis(1))
            .unwrap_err();
        assert!(matches!(err, QptError::JobTimeout { .. }));
        assert!(err.is_transient());
    }

    /// Blocks inside `execute` until released
    struct GatedBackend {
        inner: SimulatorBackend,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl Backend for GatedBackend {
        fn name(&self) -> &str {
            "gated"
        }

        fn num_qubits(&self) -> usize {
            self.inner.num_qubits()
        }

        fn execute(&self, circuit: &Circuit, shots: u64) -> QptResult<ExecutionResult> {
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            self.inner.execute(circuit, shots)
        }
    }

    #[test]
    fn test_job_table_usable_while_running() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let runner = LocalJobRunner::new(GatedBackend {
            inner: SimulatorBackend::ideal(2).with_seed(4),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        let id = runner.submit(&named_circuits(1), 10, "gated").unwrap();

        std::thread::scope(|scope| {
            let worker = scope.spawn(|| runner.status(&id).unwrap());
            entered_rx.recv().unwrap();

            // Backend is mid-execution; the table must still answer
            assert_eq!(runner.chunk_count(&id).unwrap(), 1);
            assert_eq!(runner.status(&id).unwrap(), JobStatus::Running);
            assert!(runner.retrieve(&id).is_err());

            release_tx.send(()).unwrap();
            assert_eq!(worker.join().unwrap(), JobStatus::Completed);
        });
        assert_eq!(runner.retrieve(&id).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_job_reports_reason() {
        // Backend too small for the circuits
        let runner = LocalJobRunner::new(SimulatorBackend::ideal(1));
        let id = runner.submit(&named_circuits(1), 10, "bad").unwrap();
        assert_eq!(runner.status(&id).unwrap(), JobStatus::Failed);
        assert!(matches!(
            wait_for_results(&runner, &id, Duration::from_secs(1), Duration::from_millis(1)),
            Err(QptError::JobFailed { .. })
        ));
    }
}
