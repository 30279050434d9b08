//! Multinomial sampling
//!
//! Gantree: L0_Foundation → Sampling
//!
//! Multinomial draws as a chain of conditional binomials. Randomness
//! comes only from the caller's RNG.

use crate::error::{QptError, QptResult};
use crate::types::{Bitstring, Counts};
use rand::Rng;
use rand_distr::{Binomial, Distribution};

/// Draw one sample of Multinomial(total, weights)
///
/// Weights are normalized by their sum. Bins are visited in order; a bin
/// holding all the mass receives exactly `total`, and zero-weight bins
/// always draw zero.
/// Gantree: multinomial(rng, total, weights) -> Vec<u64> // 다항 분포
pub fn multinomial<R: Rng + ?Sized>(
    rng: &mut R,
    total: u64,
    weights: &[f64],
) -> QptResult<Vec<u64>> {
    if weights.is_empty() {
        return Err(QptError::Domain("multinomial over zero bins".into()));
    }
    if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(QptError::Domain(format!("invalid multinomial weight {}", w)));
    }
    let mass: f64 = weights.iter().sum();
    if mass <= 0.0 {
        return Err(QptError::Domain("multinomial weights sum to zero".into()));
    }

    let mut draws = vec![0u64; weights.len()];
    let mut remaining = total;
    let mut mass_left = mass;
    // Remainder goes to the last bin with mass
    let last = weights.iter().rposition(|&w| w > 0.0).unwrap_or(0);

    for (i, &w) in weights.iter().enumerate().take(last + 1) {
        if remaining == 0 {
            break;
        }
        if i == last {
            draws[i] = remaining;
            break;
        }
        let p = if mass_left > 0.0 {
            (w / mass_left).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let x = if p >= 1.0 {
            remaining
        } else if p <= 0.0 {
            0
        } else {
            Binomial::new(remaining, p)
                .map_err(|e| QptError::InternalError(format!("binomial: {}", e)))?
                .sample(rng)
        };
        draws[i] = x;
        remaining -= x;
        mass_left -= w;
    }
    Ok(draws)
}

/// Sample `shots` outcomes of a distribution over basis-state indices
///
/// Returns a count map labelled with `width`-bit strings (qubit 0
/// rightmost); zero-count outcomes are omitted.
pub fn sample_counts<R: Rng + ?Sized>(
    rng: &mut R,
    probabilities: &[f64],
    width: usize,
    shots: u64,
) -> QptResult<Counts> {
    let weights: Vec<f64> = probabilities.iter().map(|p| p.max(0.0)).collect();
    let draws = multinomial(rng, shots, &weights)?;
    Ok(draws
        .into_iter()
        .enumerate()
        .filter(|(_, n)| *n > 0)
        .map(|(i, n)| (Bitstring::from_index(i, width).to_string(), n))
        .collect())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_multinomial_sums_to_total() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let draws = multinomial(&mut rng, 1000, &[0.1, 0.2, 0.3, 0.4]).unwrap();
            assert_eq!(draws.iter().sum::<u64>(), 1000);
        }
    }

    #[test]
    fn test_degenerate_bin_reproduces_total() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            multinomial(&mut rng, 500, &[0.0, 1.0, 0.0]).unwrap(),
            vec![0, 500, 0]
        );
        assert_eq!(multinomial(&mut rng, 9, &[0.0, 0.0, 3.0]).unwrap(), vec![0, 0, 9]);
    }

    #[test]
    fn test_zero_weight_bins_stay_empty() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..200 {
            let draws = multinomial(&mut rng, 10_000, &[0.1, 0.0, 0.2, 0.0, 0.0]).unwrap();
            assert_eq!(draws.len(), 5);
            assert_eq!(draws[1] + draws[3] + draws[4], 0);
            assert_eq!(draws[0] + draws[2], 10_000);
        }
    }

    #[test]
    fn test_invalid_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            multinomial(&mut rng, 10, &[]),
            Err(QptError::Domain(_))
        ));
        assert!(multinomial(&mut rng, 10, &[0.0, 0.0]).is_err());
        assert!(multinomial(&mut rng, 10, &[-0.5, 1.5]).is_err());
    }

    #[test]
    fn test_mean_matches_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut first = 0u64;
        for _ in 0..200 {
            first += multinomial(&mut rng, 1000, &[0.25, 0.75]).unwrap()[0];
        }
        let mean = first as f64 / 200.0;
        assert!((mean - 250.0).abs() < 5.0, "mean {}", mean);
    }

    #[test]
    fn test_sample_counts_labels() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let counts = sample_counts(&mut rng, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0], 3, 64)
            .unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get("011"), Some(&64));
    }
}
