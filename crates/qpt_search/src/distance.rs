//! Unitary distance
//!
//! Gantree: L5_Search → Distance

use qpt_core::{phase_insensitive_overlap, CMatrix, QptError, QptResult};

/// `1 − |Tr(U_t† U)| / d`, zero iff the two agree up to global phase
/// Gantree: unitary_distance(target,u) -> f64 // 유니터리 거리
pub fn unitary_distance(target: &CMatrix, u: &CMatrix) -> QptResult<f64> {
    if target.shape() != u.shape() || target.nrows() != target.ncols() {
        return Err(QptError::InvalidUnitary(format!(
            "cannot compare {}x{} with {}x{}",
            target.nrows(),
            target.ncols(),
            u.nrows(),
            u.ncols()
        )));
    }
    Ok((1.0 - phase_insensitive_overlap(target, u)).clamp(0.0, 1.0))
}
