//! # QPT Core
//!
//! Core types, circuits and unitaries for Toffoli process tomography.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qpt_core // L0+L1: Foundation + Circuit
//!     L0_Foundation // 기반 타입/상수/에러
//!         CoreTypes // Counts, Bitstring, Basis
//!         Constants // 통계/토모그래피/작업/탐색 상수
//!         Errors // QptError
//!         Sampling // 다항 분포
//!     L1_Circuit // 회로 구조
//!         Gate // 게이트 enum + 행렬
//!         Circuit // 회로 + QASM
//!         CircuitBuilder // 빌더 + 토폴리 분해
//!         Unitary // 유니터리 계산
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qpt_core::prelude::*;
//!
//! let circuit = CircuitBuilder::new(3)
//!     .canonical_full_toffoli([0, 1, 2])
//!     .build();
//!
//! let u = circuit_unitary(&circuit, &[0, 1, 2]).unwrap();
//! assert!(phase_insensitive_overlap(&toffoli_matrix(), &u) > 1.0 - 1e-9);
//! println!("{}", circuit.to_qasm());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Core types (Gantree: L0_Foundation → CoreTypes)
pub mod types;

/// Constants (Gantree: L0_Foundation → Constants)
pub mod constants;

/// Error types (Gantree: L0_Foundation → Errors)
pub mod error;

/// Multinomial sampling (Gantree: L0_Foundation → Sampling)
pub mod sampling;

/// Quantum gates (Gantree: L1_Circuit → Gate)
pub mod gate;

/// Circuit structure (Gantree: L1_Circuit → Circuit)
pub mod circuit;

/// Circuit builder (Gantree: L1_Circuit → CircuitBuilder)
pub mod builder;

/// Gate and circuit unitaries (Gantree: L1_Circuit → Unitary)
pub mod unitary;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::CircuitBuilder;
pub use circuit::Circuit;
pub use constants::{job, search, stats, tomography};
pub use error::{QptError, QptResult};
pub use gate::Gate;
pub use sampling::{multinomial, sample_counts};
pub use types::{
    counts_width, total_counts, Angle, Basis, BasisString, Bitstring, ClbitId, Counts, ParamVec,
    Probability, QubitId,
};
pub use unitary::{
    circuit_unitary, embed, gate_unitary, is_unitary, phase_insensitive_overlap, toffoli_matrix,
    CMatrix,
};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qpt_core::prelude::*;
    //! ```

    pub use crate::builder::CircuitBuilder;
    pub use crate::circuit::Circuit;
    pub use crate::constants::{job, search, stats, tomography};
    pub use crate::error::{QptError, QptResult};
    pub use crate::gate::Gate;
    pub use crate::types::{
        Angle, Basis, BasisString, Bitstring, ClbitId, Counts, ParamVec, Probability, QubitId,
    };
    pub use crate::unitary::{
        circuit_unitary, is_unitary, phase_insensitive_overlap, toffoli_matrix, CMatrix,
    };
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Integration Tests
// ============================================================================
