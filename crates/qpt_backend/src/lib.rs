//! # QPT Backend
//!
//! Execution backends, batched jobs and readout mitigation.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qpt_backend // L2: Backend
//!     BackendTrait // 백엔드 인터페이스
//!     NoiseModel // 탈분극 + 측정 에러
//!     SimulatorBackend // 밀도 행렬 시뮬레이터
//!     Job // 작업 제출/조회
//!     Mitigation // 측정 에러 완화
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qpt_backend::prelude::*;
//! use qpt_core::CircuitBuilder;
//!
//! let backend = SimulatorBackend::ideal(3).with_seed(42);
//! let circuit = CircuitBuilder::new(3).x(0).x(1).ccx(0, 1, 2).measure_all().build();
//! let result = backend.execute(&circuit, 1000).unwrap();
//! assert_eq!(result.counts.get("111"), Some(&1000));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Execution types and backend trait (Gantree: L2_Backend → BackendTrait)
pub mod execution;

/// Noise model (Gantree: L2_Backend → NoiseModel)
pub mod noise;

/// Simulator backend (Gantree: L2_Backend → SimulatorBackend)
pub mod simulator;

/// Batched jobs (Gantree: L2_Backend → Job)
pub mod job;

/// Readout mitigation (Gantree: L2_Backend → Mitigation)
pub mod mitigation;

// ============================================================================
// Re-exports
// ============================================================================

pub use execution::{Backend, ExecutionMetadata, ExecutionResult};
pub use job::{wait_for_results, JobRunner, JobStatus, JobSubmission, LocalJobRunner};
pub use mitigation::{MeasurementFilter, ReadoutRates, TensoredMeasFilter};
pub use noise::NoiseModel;
pub use simulator::SimulatorBackend;

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases

    pub use crate::execution::{Backend, ExecutionResult};
    pub use crate::job::{wait_for_results, JobRunner, JobStatus, LocalJobRunner};
    pub use crate::mitigation::{MeasurementFilter, TensoredMeasFilter};
    pub use crate::noise::NoiseModel;
    pub use crate::simulator::SimulatorBackend;
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Integration Tests
// ============================================================================
