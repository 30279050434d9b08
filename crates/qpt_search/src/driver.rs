//! Rank-partitioned search driver
//!
//! Gantree: L5_Search → SearchDriver
//!
//! Every structure gets its own [`SearchProblem`]; ranks own disjoint
//! slices of the enumeration and run independently.

use crate::artifact::SearchArtifact;
use crate::optimizer::{CoordinateSearch, ParameterOptimizer, SearchProblem};
use crate::structure::{
    generate_circuit_structures, num_ranks, rank_range, InstructionDict, Structure,
};
use crate::unitary_builder::{ParameterMask, UnitaryBuilder};
use qpt_core::{search, toffoli_matrix, CMatrix, QptError, QptResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

// ============================================================================
// Configuration
// ============================================================================

/// Search configuration
/// Gantree: SearchConfig // 탐색 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Register size
    pub num_qubits: usize,
    /// Multi-qubit instructions per structure
    pub layers: usize,
    /// Optimizer restarts per structure
    pub restarts: usize,
    /// Structures per rank
    pub structures_per_rank: usize,
    /// Master seed; fresh entropy when absent
    pub seed: Option<u64>,
    /// Run a rank's structures on the rayon pool
    pub parallel: bool,
    /// Directory receiving accepted artifacts
    pub output_dir: Option<PathBuf>,
}

impl SearchConfig {
    /// 3 qubits, 6 CX layers, 20 restarts, 16 structures per rank
    pub fn toffoli() -> Self {
        Self {
            num_qubits: 3,
            layers: search::DEFAULT_LAYERS,
            restarts: search::DEFAULT_RESTARTS,
            structures_per_rank: search::STRUCTURES_PER_RANK,
            seed: None,
            parallel: true,
            output_dir: None,
        }
    }

    /// Set layer count
    pub fn with_layers(mut self, layers: usize) -> Self {
        self.layers = layers;
        self
    }

    /// Set restarts
    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    /// Set structures per rank
    pub fn with_structures_per_rank(mut self, per_rank: usize) -> Self {
        self.structures_per_rank = per_rank;
        self
    }

    /// Set master seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enable or disable parallel structures
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set artifact directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Reject unusable settings
    pub fn validate(&self) -> QptResult<()> {
        if self.num_qubits == 0 {
            return Err(QptError::Config("num_qubits must be positive".to_string()));
        }
        if self.restarts == 0 {
            return Err(QptError::Config("restarts must be positive".to_string()));
        }
        if self.structures_per_rank == 0 {
            return Err(QptError::Config(
                "structures_per_rank must be positive".to_string(),
            ));
        }
        Ok(())
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
        Self::from_json(&content)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::toffoli()
    }
}

impl fmt::Display for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SearchConfig({}Q, layers={}, restarts={}, per_rank={})",
            self.num_qubits, self.layers, self.restarts, self.structures_per_rank
        )
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Runs the optimizer over rank slices of the structure enumeration
/// Gantree: SearchDriver // 탐색 실행기
pub struct SearchDriver<O: ParameterOptimizer = CoordinateSearch> {
    config: SearchConfig,
    dict: InstructionDict,
    target: CMatrix,
    optimizer: O,
    structures: Vec<Structure>,
    base_seed: u64,
}

impl SearchDriver<CoordinateSearch> {
    /// Toffoli target, {CX01, CX02, CX12}, default coordinate search
    pub fn toffoli(config: SearchConfig) -> QptResult<Self> {
        Self::new(
            config,
            InstructionDict::toffoli(),
            toffoli_matrix(),
            CoordinateSearch::default(),
        )
    }
}

impl<O: ParameterOptimizer> SearchDriver<O> {
    /// Create, enumerating every structure up front
    pub fn new(
        config: SearchConfig,
        dict: InstructionDict,
        target: CMatrix,
        optimizer: O,
    ) -> QptResult<Self> {
        config.validate()?;
        if dict.min_qubits() > config.num_qubits {
            return Err(QptError::Config(format!(
                "instructions need {} qubits, register has {}",
                dict.min_qubits(),
                config.num_qubits
            )));
        }
        let d = 1 << config.num_qubits;
        if target.nrows() != d || target.ncols() != d {
            return Err(QptError::DimensionMismatch {
                expected: d,
                found: target.nrows(),
            });
        }

        let structures = generate_circuit_structures(dict.len(), config.layers);
        let base_seed = config.seed.unwrap_or_else(rand::random::<u64>);
        log::info!(
            "{} structures over {} ranks ({})",
            structures.len(),
            num_ranks(structures.len(), config.structures_per_rank),
            optimizer.name()
        );

        Ok(Self {
            config,
            dict,
            target,
            optimizer,
            structures,
            base_seed,
        })
    }

    /// Configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Every structure, in enumeration order
    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    /// Ranks covering the enumeration
    pub fn num_ranks(&self) -> usize {
        num_ranks(self.structures.len(), self.config.structures_per_rank)
    }

    /// Optimize structure `index` on behalf of `rank`
    /// Gantree: run_structure(rank,index) -> SearchArtifact // 구조 최적화
    pub fn run_structure(&self, rank: usize, index: usize) -> QptResult<SearchArtifact> {
        let structure = self.structures.get(index).ok_or_else(|| {
            QptError::Config(format!(
                "structure {} out of range for {}",
                index,
                self.structures.len()
            ))
        })?;

        let builder = UnitaryBuilder::new(self.config.num_qubits, structure, &self.dict)?;
        let mask = ParameterMask::edge_layers_fixed(self.config.num_qubits, self.config.layers);
        let problem = SearchProblem::new(builder, self.target.clone(), mask)?
            .with_seed(self.base_seed.wrapping_add(index as u64));

        let outcome = self.optimizer.optimize(&problem, self.config.restarts)?;
        // Distance of the returned angles, not the optimizer's own figure
        let distance = problem.objective(&outcome.params)?;
        log::debug!(
            "Structure {:?}: distance {:.3e} ({} evaluations)",
            structure,
            distance,
            outcome.evaluations
        );

        Ok(SearchArtifact {
            rank,
            structure: structure.clone(),
            params: outcome.params,
            distance,
        })
    }

    /// Optimize the slice owned by `rank` and persist accepted results
    /// Gantree: run_rank(rank) -> Vec<SearchArtifact> // 랭크 실행
    pub fn run_rank(&self, rank: usize) -> QptResult<Vec<SearchArtifact>> {
        let start = Instant::now();
        let range = rank_range(
            self.structures.len(),
            rank,
            self.config.structures_per_rank,
        );

        let artifacts: Vec<SearchArtifact> = if self.config.parallel {
            range
                .into_par_iter()
                .map(|i| self.run_structure(rank, i))
                .collect::<QptResult<Vec<_>>>()?
        } else {
            range
                .map(|i| self.run_structure(rank, i))
                .collect::<QptResult<Vec<_>>>()?
        };

        if let Some(dir) = &self.config.output_dir {
            for artifact in &artifacts {
                artifact.write_to(dir)?;
            }
        }

        let accepted = artifacts.iter().filter(|a| a.is_accepted()).count();
        log::info!(
            "Rank {}: {} structures, {} accepted, {} ms",
            rank,
            artifacts.len(),
            accepted,
            start.elapsed().as_millis()
        );
        Ok(artifacts)
    }

    /// Every rank in turn
    pub fn run_all(&self) -> QptResult<Vec<SearchArtifact>> {
        let mut all = Vec::with_capacity(self.structures.len());
        for rank in 0..self.num_ranks() {
            all.extend(self.run_rank(rank)?);
        }
        Ok(all)
    }
}

// ============================================================================
// Tests
// ============================================================================
