//! Parameter optimization for one structure
//!
//! Gantree: L5_Search → ParameterOptimizer
//!
//! The driver only needs "best angles for this structure"; the default
//! [`CoordinateSearch`] probes each free angle at ±step, keeps the better
//! side when it improves, and shrinks the step after an unproductive sweep.

use crate::distance::unitary_distance;
use crate::unitary_builder::{ParameterMask, UnitaryBuilder};
use qpt_core::{CMatrix, ParamVec, QptError, QptResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// ============================================================================
// Problem
// ============================================================================

/// One structure, its target and the angles allowed to move
/// Gantree: SearchProblem // 탐색 문제
#[derive(Debug, Clone)]
pub struct SearchProblem {
    builder: UnitaryBuilder,
    target: CMatrix,
    mask: ParameterMask,
    seed: u64,
}

impl SearchProblem {
    /// Create, checking that the mask and target fit the builder
    pub fn new(builder: UnitaryBuilder, target: CMatrix, mask: ParameterMask) -> QptResult<Self> {
        if mask.len() != builder.num_params() {
            return Err(QptError::Config(format!(
                "mask covers {} parameters, structure has {}",
                mask.len(),
                builder.num_params()
            )));
        }
        let d = builder.dim();
        if target.nrows() != d || target.ncols() != d {
            return Err(QptError::DimensionMismatch {
                expected: d,
                found: target.nrows(),
            });
        }
        Ok(Self {
            builder,
            target,
            mask,
            seed: 0,
        })
    }

    /// Seed for random starting points
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Unitary builder
    pub fn builder(&self) -> &UnitaryBuilder {
        &self.builder
    }

    /// Target unitary
    pub fn target(&self) -> &CMatrix {
        &self.target
    }

    /// Parameter mask
    pub fn mask(&self) -> &ParameterMask {
        &self.mask
    }

    /// Starting-point seed
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Unitary distance at `params`
    /// Gantree: objective(params) -> f64 // 목적 함수
    pub fn objective(&self, params: &[f64]) -> QptResult<f64> {
        unitary_distance(&self.target, &self.builder.build_unitary(params)?)
    }

    /// Free angles uniform in [-π, π), pinned angles at their values
    pub fn initial_point<R: Rng>(&self, rng: &mut R) -> ParamVec {
        let mut params: ParamVec = (0..self.mask.len())
            .map(|_| rng.gen_range(-PI..PI))
            .collect();
        self.mask.apply(&mut params);
        params
    }
}

/// Best angles found and their distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    /// Angles
    pub params: ParamVec,
    /// Objective value
    pub value: f64,
    /// Objective evaluations spent
    pub evaluations: usize,
}

// ============================================================================
// Optimizer Interface
// ============================================================================

/// Finds angles minimizing a [`SearchProblem`]'s objective
/// Gantree: ParameterOptimizer // 매개변수 최적화기
pub trait ParameterOptimizer: Send + Sync {
    /// Optimizer name for logs
    fn name(&self) -> &str;

    /// Best of `restarts` independent runs
    fn optimize(&self, problem: &SearchProblem, restarts: usize) -> QptResult<OptimizationOutcome>;
}

// ============================================================================
// Coordinate Search
// ============================================================================

/// ±step coordinate search with step decay and random restarts
/// Gantree: CoordinateSearch // 좌표 탐색
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSearch {
    /// Initial probe step (rad)
    pub initial_step: f64,
    /// Step multiplier after a sweep without improvement
    pub decay: f64,
    /// Stop once the step falls below this
    pub min_step: f64,
    /// Sweep limit per restart
    pub max_sweeps: usize,
    /// Stop once the objective falls to this
    pub tolerance: f64,
}

impl Default for CoordinateSearch {
    fn default() -> Self {
        Self {
            initial_step: PI / 2.0,
            decay: 0.9,
            min_step: 1e-7,
            max_sweeps: 2000,
            tolerance: 1e-10,
        }
    }
}

impl CoordinateSearch {
    /// Set the sweep limit
    pub fn with_max_sweeps(mut self, sweeps: usize) -> Self {
        self.max_sweeps = sweeps;
        self
    }

    /// Set the step decay
    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    fn validate(&self) -> QptResult<()> {
        if !(self.initial_step > 0.0 && self.min_step > 0.0) {
            return Err(QptError::Config("steps must be positive".to_string()));
        }
        if !(self.decay > 0.0 && self.decay < 1.0) {
            return Err(QptError::Config(format!(
                "decay must lie in (0, 1), got {}",
                self.decay
            )));
        }
        Ok(())
    }

    /// One descent from `params`
    /// Gantree: descend(problem,params) -> OptimizationOutcome // 단일 하강
    fn descend(
        &self,
        problem: &SearchProblem,
        mut params: ParamVec,
    ) -> QptResult<OptimizationOutcome> {
        let free = problem.mask().free_indices();
        let mut value = problem.objective(&params)?;
        let mut evaluations = 1;
        let mut step = self.initial_step;

        for _ in 0..self.max_sweeps {
            if value <= self.tolerance || step < self.min_step || free.is_empty() {
                break;
            }

            let mut improved = false;
            for &i in &free {
                let base = params[i];

                params[i] = base + step;
                let plus = problem.objective(&params)?;
                params[i] = base - step;
                let minus = problem.objective(&params)?;
                evaluations += 2;

                let (candidate, candidate_value) = if plus <= minus {
                    (base + step, plus)
                } else {
                    (base - step, minus)
                };
                if candidate_value < value {
                    params[i] = candidate;
                    value = candidate_value;
                    improved = true;
                } else {
                    params[i] = base;
                }
            }

            if !improved {
                step *= self.decay;
            }
        }

        Ok(OptimizationOutcome {
            params,
            value,
            evaluations,
        })
    }
}

impl ParameterOptimizer for CoordinateSearch {
    fn name(&self) -> &str {
        "coordinate_search"
    }

    fn optimize(
        &self,
        problem: &SearchProblem,
        restarts: usize,
    ) -> QptResult<OptimizationOutcome> {
        self.validate()?;
        if restarts == 0 {
            return Err(QptError::Config("at least one restart is required".to_string()));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(problem.seed());
        let mut best: Option<OptimizationOutcome> = None;
        let mut evaluations = 0;

        for r in 0..restarts {
            let start = problem.initial_point(&mut rng);
            let outcome = self.descend(problem, start)?;
            evaluations += outcome.evaluations;
            log::debug!("Restart {}: {:.3e}", r, outcome.value);

            if best.as_ref().map_or(true, |b| outcome.value < b.value) {
                best = Some(outcome);
            }
            if best.as_ref().is_some_and(|b| b.value <= self.tolerance) {
                break;
            }
        }

        best.map(|b| OptimizationOutcome { evaluations, ..b })
            .ok_or_else(|| QptError::InternalError("no restart completed".to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::InstructionDict;
    use qpt_core::{gate_unitary, toffoli_matrix, Gate};

    /// Single-qubit problem where only θ moves: distance = 1 − |cos((θ − 0.7)/2)|
    fn ry_problem() -> SearchProblem {
        let builder = UnitaryBuilder::new(1, &[], &InstructionDict::toffoli()).unwrap();
        let mask = ParameterMask::all_free(3)
            .with_fixed(1, 0.0)
            .unwrap()
            .with_fixed(2, 0.0)
            .unwrap();
        let target = gate_unitary(&Gate::U(0, 0.7, 0.0, 0.0), 1).unwrap();
        SearchProblem::new(builder, target, mask).unwrap().with_seed(3)
    }

    #[test]
    fn test_converges_in_one_dimension() {
        let outcome = CoordinateSearch::default().optimize(&ry_problem(), 1).unwrap();
        assert!(outcome.value < 1e-9, "{}", outcome.value);
        assert_eq!(outcome.params[1], 0.0);
        assert_eq!(outcome.params[2], 0.0);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let opt = CoordinateSearch::default().with_max_sweeps(5);
        let a = opt.optimize(&ry_problem(), 3).unwrap();
        let b = opt.optimize(&ry_problem(), 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_restarts_never_hurt() {
        let opt = CoordinateSearch::default().with_max_sweeps(2);
        let one = opt.optimize(&ry_problem(), 1).unwrap();
        let many = opt.optimize(&ry_problem(), 8).unwrap();
        assert!(many.value <= one.value);
        assert!(many.evaluations > one.evaluations);
    }

    #[test]
    fn test_no_free_parameters() {
        let dict = InstructionDict::toffoli();
        let builder = UnitaryBuilder::new(3, &[0], &dict).unwrap();
        let target = gate_unitary(&Gate::Cnot(0, 1), 3).unwrap();
        let problem =
            SearchProblem::new(builder, target, ParameterMask::edge_layers_fixed(3, 1)).unwrap();

        let outcome = CoordinateSearch::default().optimize(&problem, 4).unwrap();
        assert_eq!(outcome.params, vec![0.0; 18]);
        assert!(outcome.value < 1e-12);
        assert_eq!(outcome.evaluations, 1);
    }

    #[test]
    fn test_rejects_bad_setup() {
        let builder = UnitaryBuilder::new(1, &[], &InstructionDict::toffoli()).unwrap();
        assert!(SearchProblem::new(builder.clone(), toffoli_matrix(), ParameterMask::all_free(3))
            .is_err());
        assert!(SearchProblem::new(
            builder,
            CMatrix::identity(2, 2),
            ParameterMask::all_free(4)
        )
        .is_err());

        assert!(CoordinateSearch::default().optimize(&ry_problem(), 0).is_err());
        assert!(CoordinateSearch::default()
            .with_decay(1.0)
            .optimize(&ry_problem(), 1)
            .is_err());
    }
}
