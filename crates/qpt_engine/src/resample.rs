//! Multinomial resampling of tomography counts
//!
//! Gantree: L4_Engine → Resampler
//!
//! Each circuit's histogram is replaced by one draw from
//! Multinomial(total, counts / total). Keys and record order are kept,
//! including keys that draw zero.

use qpt_core::{multinomial, total_counts, Counts, QptError, QptResult};
use qpt_tomography::{TomographyRecord, TomographyResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Resample one histogram
/// Gantree: resample_counts(rng, counts) -> Result<Counts> // 카운트 재표본
pub fn resample_counts<R: Rng + ?Sized>(rng: &mut R, counts: &Counts) -> QptResult<Counts> {
    let total = total_counts(counts);
    if total == 0 {
        return Err(QptError::Domain("histogram has zero total counts".into()));
    }
    let weights: Vec<f64> = counts.values().map(|&n| n as f64).collect();
    let draws = multinomial(rng, total, &weights)?;
    Ok(counts.keys().cloned().zip(draws).collect())
}

/// Resample every circuit of a tomography result
/// Gantree: resample(rng, result) -> Result<TomographyResult> // 전체 재표본
pub fn resample<R: Rng + ?Sized>(
    rng: &mut R,
    result: &TomographyResult,
) -> QptResult<TomographyResult> {
    result.map_counts(|record: &TomographyRecord| {
        if total_counts(&record.counts) == 0 {
            return Err(QptError::Domain(format!(
                "circuit '{}' has zero total counts",
                record.label
            )));
        }
        resample_counts(&mut *rng, &record.counts)
    })
}

/// Resampler owning its random stream
/// Gantree: Resampler // 재표본기
#[derive(Debug, Clone)]
pub struct Resampler<R: Rng = ChaCha8Rng> {
    rng: R,
}

impl<R: Rng> Resampler<R> {
    /// Wrap a random stream
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Draw one alternate data set
    pub fn resample(&mut self, result: &TomographyResult) -> QptResult<TomographyResult> {
        resample(&mut self.rng, result)
    }
}

impl Resampler<ChaCha8Rng> {
    /// Reproducible resampler
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

// ============================================================================
// Tests
// ============================================================================
