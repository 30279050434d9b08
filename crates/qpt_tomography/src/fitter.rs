//! Linear-inversion channel fitting
//!
//! Gantree: L3_Tomography → ChannelFitter
//!
//! The fit splits into a measurement side and a preparation side:
//! 1. every circuit estimates each Pauli it measures,
//!    `⟨P⟩ = Σ_b f(b) Π_{k∈supp P} (-1)^{b_k}`, averaged over all circuits
//!    with the same preparation that measure P;
//! 2. the preparation design is inverted per qubit and applied as a tensor
//!    product, `R[P,Q] = Σ_s ⟨P⟩_s Π_k T[Q_k, s_k]`.
//!
//! This is the least-squares solution of the full linear system and is
//! trace preserving by construction. Complete positivity is only enforced
//! with [`FitMethod::CpProjected`].

use crate::basis::PrepBasis;
use crate::pauli::{Pauli, PauliString};
use crate::process::ProcessMatrix;
use crate::result::TomographyResult;
use nalgebra::DMatrix;
use qpt_core::{tomography, total_counts, Bitstring, QptError, QptResult};
use serde::{Deserialize, Serialize};

/// Post-processing of the linear fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMethod {
    /// Unconstrained least squares
    #[default]
    Lstsq,
    /// Least squares, then Choi eigenvalue clipping
    CpProjected,
}

/// Tomography fitter for a fixed register size and preparation basis
/// Gantree: ChannelFitter // 채널 피터
#[derive(Debug, Clone)]
pub struct ChannelFitter {
    num_qubits: usize,
    prep_basis: PrepBasis,
    method: FitMethod,
    /// T = (AᵀA)⁻¹Aᵀ, 4 × states
    inverse: DMatrix<f64>,
}

impl ChannelFitter {
    /// Create a fitter
    pub fn new(num_qubits: usize, prep_basis: PrepBasis) -> QptResult<Self> {
        if num_qubits == 0 || num_qubits > tomography::MAX_TARGET_QUBITS {
            return Err(QptError::Config(format!(
                "cannot fit {} qubits, supported range is 1..={}",
                num_qubits,
                tomography::MAX_TARGET_QUBITS
            )));
        }
        Ok(Self {
            num_qubits,
            prep_basis,
            method: FitMethod::default(),
            inverse: prep_basis.inverse_design()?,
        })
    }

    /// Set fit method
    pub fn with_method(mut self, method: FitMethod) -> Self {
        self.method = method;
        self
    }

    /// Number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Fit method
    pub fn method(&self) -> FitMethod {
        self.method
    }

    /// Reconstruct the channel from paired tomography data
    /// Gantree: fit(result) -> Result<ProcessMatrix> // 채널 복원
    pub fn fit(&self, result: &TomographyResult) -> QptResult<ProcessMatrix> {
        let n = self.num_qubits;
        if result.num_qubits() != n {
            return Err(QptError::DimensionMismatch {
                expected: n,
                found: result.num_qubits(),
            });
        }

        let expectations = self.measurement_side(result)?;
        let ptm = self.preparation_side(&expectations);
        let channel = ProcessMatrix::new(n, ptm)?;

        match self.method {
            FitMethod::Lstsq => Ok(channel),
            FitMethod::CpProjected => channel.project_cp(),
        }
    }

    /// Averaged Pauli expectations, `[config][pauli]`
    fn measurement_side(&self, result: &TomographyResult) -> QptResult<Vec<Vec<f64>>> {
        let n = self.num_qubits;
        let m = self.prep_basis.len();
        let configs = m.pow(n as u32);
        let paulis = 1usize << (2 * n);

        let mut sums = vec![vec![0.0; paulis]; configs];
        let mut hits = vec![vec![0u32; paulis]; configs];

        for record in result.iter() {
            let label = &record.label;
            let config = label
                .prep
                .iter()
                .enumerate()
                .try_fold(0usize, |acc, (k, &state)| {
                    self.prep_basis
                        .position(state)
                        .map(|pos| acc + pos * m.pow(k as u32))
                        .ok_or_else(|| {
                            QptError::Fit(format!(
                                "preparation {} is not in the {:?} basis",
                                state, self.prep_basis
                            ))
                        })
                })?;

            let total = total_counts(&record.counts);
            if total == 0 {
                return Err(QptError::Domain(format!("circuit {} has no counts", label)));
            }

            // frequencies keyed by clbit value
            let mut freqs = Vec::with_capacity(record.counts.len());
            for (bits, &count) in &record.counts {
                let b = Bitstring::parse(bits)?;
                if b.len() != n {
                    return Err(QptError::DimensionMismatch {
                        expected: n,
                        found: b.len(),
                    });
                }
                freqs.push((b.to_usize(), count as f64 / total as f64));
            }

            let measured: Vec<usize> = label
                .meas
                .iter()
                .map(|&b| Pauli::from_basis(b).index())
                .collect();

            // every subset of the measured qubits is an estimable Pauli
            for subset in 0..(1usize << n) {
                let pauli: usize = (0..n)
                    .filter(|k| (subset >> k) & 1 == 1)
                    .map(|k| measured[k] << (2 * k))
                    .sum();
                let value: f64 = freqs
                    .iter()
                    .map(|&(v, f)| {
                        if (v & subset).count_ones() % 2 == 0 {
                            f
                        } else {
                            -f
                        }
                    })
                    .sum();
                sums[config][pauli] += value;
                hits[config][pauli] += 1;
            }
        }

        let mut expectations = vec![vec![0.0; paulis]; configs];
        for c in 0..configs {
            if hits[c][0] == 0 {
                return Err(QptError::Fit(format!(
                    "no circuits for preparation {}",
                    self.config_name(c)
                )));
            }
            for p in 0..paulis {
                if hits[c][p] == 0 {
                    return Err(QptError::Fit(format!(
                        "Pauli {} is never measured after preparation {}",
                        PauliString::from_index(p, n),
                        self.config_name(c)
                    )));
                }
                expectations[c][p] = sums[c][p] / hits[c][p] as f64;
            }
        }
        Ok(expectations)
    }

    /// R[P,Q] = Σ_s E[s][P] Π_k T[Q_k, s_k]
    fn preparation_side(&self, expectations: &[Vec<f64>]) -> DMatrix<f64> {
        let n = self.num_qubits;
        let m = self.prep_basis.len();
        let paulis = 1usize << (2 * n);

        // weights[Q][s] = Π_k T[Q_k, s_k]
        let weights: Vec<Vec<f64>> = (0..paulis)
            .map(|q| {
                (0..expectations.len())
                    .map(|s| {
                        (0..n)
                            .map(|k| {
                                let qk = (q >> (2 * k)) & 3;
                                let sk = (s / m.pow(k as u32)) % m;
                                self.inverse[(qk, sk)]
                            })
                            .product()
                    })
                    .collect()
            })
            .collect();

        DMatrix::from_fn(paulis, paulis, |p, q| {
            weights[q]
                .iter()
                .zip(expectations)
                .map(|(w, e)| w * e[p])
                .sum()
        })
    }

    fn config_name(&self, config: usize) -> String {
        let m = self.prep_basis.len();
        let states = self.prep_basis.states();
        let names: Vec<&str> = (0..self.num_qubits)
            .map(|k| states[(config / m.pow(k as u32)) % m].as_str())
            .collect();
        format!("({})", names.join(","))
    }
}

/// Fit with the default unconstrained method
pub fn fit_channel(result: &TomographyResult, prep_basis: PrepBasis) -> QptResult<ProcessMatrix> {
    ChannelFitter::new(result.num_qubits(), prep_basis)?.fit(result)
}

// ============================================================================
// Tests
// ============================================================================
