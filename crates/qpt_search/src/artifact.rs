//! Search result files
//!
//! Gantree: L5_Search → SearchArtifact
//!
//! One plain-text file per structure whose optimized unitary lands within
//! the distance threshold.

use crate::structure::structure_digits;
use qpt_core::{search, ParamVec, QptError, QptResult};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

/// Optimized parameters for one structure
/// Gantree: SearchArtifact // 탐색 결과물
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchArtifact {
    /// Rank that explored the structure
    pub rank: usize,
    /// Instruction indices
    pub structure: Vec<usize>,
    /// Optimized angles
    pub params: ParamVec,
    /// Achieved unitary distance
    pub distance: f64,
}

impl SearchArtifact {
    /// Whether the result is worth persisting
    pub fn is_accepted(&self) -> bool {
        self.distance < search::DISTANCE_THRESHOLD
    }

    /// `out_full_{digits}.txt`
    pub fn file_name(&self) -> String {
        format!("out_full_{}.txt", structure_digits(&self.structure))
    }

    /// File contents
    /// Gantree: render() -> String // 결과 서식
    pub fn render(&self) -> String {
        let mut output = String::new();
        writeln!(output, "PyQuOpt Results\n==========").unwrap();
        writeln!(output, "Rank {} Computation\n======", self.rank).unwrap();
        writeln!(output, "Parameters: {:?}", self.params).unwrap();
        writeln!(output, "Unitary distance: {:?}", self.distance).unwrap();
        output
    }

    /// Write into `dir` if accepted; returns the path written
    /// Gantree: write_to(dir) -> Option<PathBuf> // 파일 기록
    pub fn write_to(&self, dir: impl AsRef<Path>) -> QptResult<Option<PathBuf>> {
        if !self.is_accepted() {
            return Ok(None);
        }
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .map_err(|e| QptError::FileError(format!("{}: {}", dir.display(), e)))?;
        let path = dir.join(self.file_name());
        fs::write(&path, self.render())
            .map_err(|e| QptError::FileError(format!("{}: {}", path.display(), e)))?;
        log::info!("wrote {} (distance {:.3e})", path.display(), self.distance);
        Ok(Some(path))
    }
}

// ============================================================================
// Tests
// ============================================================================
