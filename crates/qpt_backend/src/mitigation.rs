//! Readout error mitigation
//!
//! Gantree: L2_Backend → Mitigation
//!
//! Tensored measurement filter: each clbit carries its own 2x2 confusion
//! matrix `[[1-p01, p10], [p01, 1-p10]]`, and the filter applies the
//! per-bit inverses to the observed distribution. Mitigated counts are
//! clipped, renormalized and rounded back to integers with the original
//! total.

use qpt_core::{
    total_counts, Circuit, CircuitBuilder, Counts, Gate, Probability, QptError, QptResult, QubitId,
};
use serde::{Deserialize, Serialize};

/// Post-processing applied to raw counts before fitting
/// Gantree: MeasurementFilter // 측정 필터
pub trait MeasurementFilter: Send + Sync {
    /// Mitigate one histogram
    fn apply(&self, counts: &Counts) -> QptResult<Counts>;
}

/// Readout flip rates of one clbit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadoutRates {
    /// P(1|0)
    pub p01: f64,

    /// P(0|1)
    pub p10: f64,
}

impl ReadoutRates {
    /// Perfect readout
    pub const PERFECT: Self = Self { p01: 0.0, p10: 0.0 };

    /// Create rates with validation
    pub fn new(p01: f64, p10: f64) -> QptResult<Self> {
        Ok(Self {
            p01: Probability::new(p01)?.value(),
            p10: Probability::new(p10)?.value(),
        })
    }

    fn inverse(&self) -> Option<[[f64; 2]; 2]> {
        let det = (1.0 - self.p01) * (1.0 - self.p10) - self.p01 * self.p10;
        if det.abs() < 1e-10 {
            return None;
        }
        Some([
            [(1.0 - self.p10) / det, -self.p10 / det],
            [-self.p01 / det, (1.0 - self.p01) / det],
        ])
    }
}

/// Tensor-product readout filter
/// Gantree: TensoredMeasFilter // 텐서 측정 필터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensoredMeasFilter {
    /// Rates indexed by clbit
    rates: Vec<ReadoutRates>,
}

impl TensoredMeasFilter {
    /// Create from per-clbit rates
    pub fn new(rates: Vec<ReadoutRates>) -> Self {
        Self { rates }
    }

    /// Calibration circuits: all-zeros then all-ones preparation
    pub fn calibration_circuits(num_qubits: usize) -> Vec<Circuit> {
        let zeros = CircuitBuilder::with_name(num_qubits, format!("cal_{}", "0".repeat(num_qubits)))
            .measure_all()
            .build();

        let mut ones = CircuitBuilder::with_name(num_qubits, format!("cal_{}", "1".repeat(num_qubits)));
        for q in 0..num_qubits {
            ones = ones.x(q);
        }
        vec![zeros, ones.measure_all().build()]
    }

    /// Calibration circuits reading `qubits[j]` into clbit j
    pub fn calibration_circuits_on(
        num_qubits: usize,
        qubits: &[QubitId],
    ) -> QptResult<Vec<Circuit>> {
        let k = qubits.len();
        let mut zeros = Circuit::with_clbits(num_qubits, k);
        zeros.set_name(format!("cal_{}", "0".repeat(k)));
        let mut ones = Circuit::with_clbits(num_qubits, k);
        ones.set_name(format!("cal_{}", "1".repeat(k)));

        ones.add_gates(qubits.iter().map(|&q| Gate::X(q)))?;
        for (j, &q) in qubits.iter().enumerate() {
            zeros.add_gate(Gate::Measure(q, j))?;
            ones.add_gate(Gate::Measure(q, j))?;
        }
        Ok(vec![zeros, ones])
    }

    /// Estimate rates from the two calibration histograms
    pub fn from_calibration(num_qubits: usize, zeros: &Counts, ones: &Counts) -> QptResult<Self> {
        let rates = (0..num_qubits)
            .map(|q| {
                let p01 = bit_fraction(zeros, q, '1', num_qubits)?;
                let p10 = bit_fraction(ones, q, '0', num_qubits)?;
                ReadoutRates::new(p01, p10)
            })
            .collect::<QptResult<Vec<_>>>()?;
        log::debug!("calibrated readout rates: {:?}", rates);
        Ok(Self { rates })
    }

    /// Rates indexed by clbit
    pub fn rates(&self) -> &[ReadoutRates] {
        &self.rates
    }

    /// Mitigated quasi-probabilities, clipped and renormalized
    pub fn mitigate_probabilities(&self, counts: &Counts) -> QptResult<Vec<f64>> {
        let width = self.rates.len();
        let total = total_counts(counts);
        if total == 0 {
            return Err(QptError::Domain("cannot mitigate empty counts".into()));
        }

        let mut probs = vec![0.0; 1 << width];
        for (label, &count) in counts {
            if label.len() != width {
                return Err(QptError::DimensionMismatch {
                    expected: width,
                    found: label.len(),
                });
            }
            let idx = usize::from_str_radix(label, 2)
                .map_err(|_| QptError::InvalidBitstring(label.clone()))?;
            probs[idx] += count as f64 / total as f64;
        }

        for (q, rates) in self.rates.iter().enumerate() {
            let Some(inv) = rates.inverse() else {
                log::warn!("singular confusion matrix on clbit {}, skipped", q);
                continue;
            };
            let mask = 1usize << q;
            probs = (0..probs.len())
                .map(|s| {
                    let bit = (s >> q) & 1;
                    let partner = s ^ mask;
                    // row `bit` of the inverse applied to (P(0), P(1))
                    let (p0, p1) = if bit == 0 {
                        (probs[s], probs[partner])
                    } else {
                        (probs[partner], probs[s])
                    };
                    inv[bit][0] * p0 + inv[bit][1] * p1
                })
                .collect();
        }

        let mass: f64 = probs.iter().map(|p| p.max(0.0)).sum();
        if mass <= 0.0 {
            return Err(QptError::Domain("mitigated distribution has no mass".into()));
        }
        Ok(probs.iter().map(|p| p.max(0.0) / mass).collect())
    }
}

impl MeasurementFilter for TensoredMeasFilter {
    fn apply(&self, counts: &Counts) -> QptResult<Counts> {
        let probs = self.mitigate_probabilities(counts)?;
        let total = total_counts(counts);
        Ok(round_to_total(&probs, total, self.rates.len()))
    }
}

fn bit_fraction(counts: &Counts, qubit: usize, bit: char, width: usize) -> QptResult<f64> {
    let total = total_counts(counts);
    if total == 0 {
        return Err(QptError::Domain("empty calibration counts".into()));
    }
    let mut hits = 0u64;
    for (label, &count) in counts {
        if label.len() != width {
            return Err(QptError::DimensionMismatch {
                expected: width,
                found: label.len(),
            });
        }
        if label.chars().rev().nth(qubit) == Some(bit) {
            hits += count;
        }
    }
    Ok(hits as f64 / total as f64)
}

/// Largest-remainder rounding so the counts sum to `total`
fn round_to_total(probs: &[f64], total: u64, width: usize) -> Counts {
    let scaled: Vec<f64> = probs.iter().map(|p| p * total as f64).collect();
    let mut floors: Vec<u64> = scaled.iter().map(|x| x.floor() as u64).collect();
    let assigned: u64 = floors.iter().sum();

    let mut order: Vec<usize> = (0..scaled.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = scaled[a] - scaled[a].floor();
        let rb = scaled[b] - scaled[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for &i in order.iter().take(total.saturating_sub(assigned) as usize) {
        floors[i] += 1;
    }

    floors
        .iter()
        .enumerate()
        .filter(|(_, &c)| c > 0)
        .map(|(i, &c)| (format!("{:0width$b}", i, width = width), c))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
