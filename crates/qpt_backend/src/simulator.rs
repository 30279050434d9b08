//! Simulator backend for QPT
//!
//! Gantree: L2_Backend → SimulatorBackend
//!
//! Density-matrix simulator with depolarizing gate noise and readout
//! error. Measurements must be terminal; outcome distributions are exact
//! and shots are drawn from them as one multinomial sample.

use crate::execution::{Backend, ExecutionMetadata, ExecutionResult};
use crate::noise::NoiseModel;
use qpt_core::unitary::{gate_unitary, CMatrix};
use qpt_core::{sample_counts, stats, Circuit, Gate, QptError, QptResult, QubitId};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;

/// Simulator backend with noise model
/// Gantree: SimulatorBackend // 시뮬레이터 구현
pub struct SimulatorBackend {
    name: String,

    num_qubits: usize,

    /// Gantree: noise_model: NoiseModel // 노이즈
    noise_model: NoiseModel,

    /// Base seed; batch entry i uses `seed + i`
    seed: Option<u64>,
}

impl SimulatorBackend {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create new simulator backend
    pub fn new(num_qubits: usize, noise_model: NoiseModel) -> Self {
        Self {
            name: "qpt_simulator".to_string(),
            num_qubits,
            noise_model,
            seed: None,
        }
    }

    /// Create ideal (noiseless) simulator
    pub fn ideal(num_qubits: usize) -> Self {
        Self::new(num_qubits, NoiseModel::ideal())
    }

    /// Create from a uniform depolarizing error rate
    pub fn from_depol(num_qubits: usize, p_depol: f64) -> QptResult<Self> {
        Ok(Self::new(num_qubits, NoiseModel::from_depol(p_depol)?))
    }

    /// Set seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set backend name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Get noise model
    pub fn noise_model(&self) -> &NoiseModel {
        &self.noise_model
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Final density matrix and the terminal measurement map
    /// Gantree: evolve(circuit) -> (ρ, measures) // 밀도 행렬 진화
    pub fn evolve(&self, circuit: &Circuit) -> QptResult<(CMatrix, Vec<(QubitId, usize)>)> {
        let n = circuit.num_qubits();
        if n > self.num_qubits {
            return Err(QptError::QubitOutOfRange {
                qubit: n,
                max: self.num_qubits,
            });
        }

        let dim = 1usize << n;
        let mut rho = CMatrix::zeros(dim, dim);
        rho[(0, 0)] = Complex64::new(1.0, 0.0);

        let mut measured = vec![false; n];
        let mut measures = Vec::new();

        for gate in circuit.gates() {
            match gate {
                Gate::Barrier(_) => {}
                Gate::Measure(q, c) => {
                    measured[*q] = true;
                    measures.push((*q, *c));
                }
                _ => {
                    let qubits = gate.qubits();
                    if qubits.iter().any(|&q| measured[q]) {
                        return Err(QptError::BackendError(format!(
                            "'{}' after measurement: only terminal measurements are supported",
                            gate.name()
                        )));
                    }
                    let u = gate_unitary(gate, n)?;
                    rho = &u * rho * u.adjoint();

                    let p = self.noise_model.gate_error(qubits.len());
                    if p > 0.0 {
                        let mut mixed = rho.clone();
                        for &q in &qubits {
                            mixed = depolarize_qubit(&mixed, q);
                        }
                        rho = rho * Complex64::new(1.0 - p, 0.0) + mixed * Complex64::new(p, 0.0);
                    }
                }
            }
        }

        if measures.is_empty() {
            measures = (0..n).map(|q| (q, q)).collect();
        }
        Ok((rho, measures))
    }

    /// Exact outcome distribution over classical-register values
    ///
    /// Index bit `c` is clbit `c`. Circuits without measurements are read
    /// out on every qubit (qubit q into bit q).
    pub fn probabilities(&self, circuit: &Circuit) -> QptResult<(Vec<f64>, usize)> {
        let (rho, measures) = self.evolve(circuit)?;
        let width = if circuit.count_measurements() == 0 {
            circuit.num_qubits()
        } else {
            circuit.num_clbits()
        };

        let mut probs = vec![0.0; 1 << width];
        for i in 0..rho.nrows() {
            let p = rho[(i, i)].re.max(0.0);
            if p == 0.0 {
                continue;
            }
            let outcome = measures
                .iter()
                .fold(0usize, |acc, &(q, c)| acc | (((i >> q) & 1) << c));
            probs[outcome] += p;
        }

        let r = self.noise_model.readout_error();
        if r > 0.0 {
            let mut clbits: Vec<usize> = measures.iter().map(|&(_, c)| c).collect();
            clbits.sort_unstable();
            clbits.dedup();
            for c in clbits {
                let flipped: Vec<f64> = (0..probs.len())
                    .map(|x| (1.0 - r) * probs[x] + r * probs[x ^ (1 << c)])
                    .collect();
                probs = flipped;
            }
        }

        Ok((probs, width))
    }

    fn execute_seeded(
        &self,
        circuit: &Circuit,
        shots: u64,
        seed: Option<u64>,
    ) -> QptResult<ExecutionResult> {
        if shots < stats::MIN_SHOTS || shots > self.max_shots() {
            return Err(QptError::ShotsOutOfRange(
                shots,
                stats::MIN_SHOTS,
                self.max_shots(),
            ));
        }

        let start = Instant::now();
        let (probs, width) = self.probabilities(circuit)?;

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let counts = sample_counts(&mut rng, &probs, width, shots)?;

        Ok(ExecutionResult {
            counts,
            shots,
            metadata: ExecutionMetadata {
                backend: self.name.clone(),
                circuit_name: circuit.name().map(str::to_string),
                execution_time_ms: Some(start.elapsed().as_millis() as u64),
                simulated: true,
                seed,
                ..Default::default()
            },
        })
    }
}

/// Fully depolarize one qubit: ρ → Tr_q(ρ) ⊗ I/2
fn depolarize_qubit(rho: &CMatrix, qubit: QubitId) -> CMatrix {
    let mask = 1usize << qubit;
    let dim = rho.nrows();
    CMatrix::from_fn(dim, dim, |i, j| {
        if (i ^ j) & mask != 0 {
            Complex64::new(0.0, 0.0)
        } else {
            (rho[(i, j)] + rho[(i ^ mask, j ^ mask)]) * 0.5
        }
    })
}

impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    fn execute(&self, circuit: &Circuit, shots: u64) -> QptResult<ExecutionResult> {
        self.execute_seeded(circuit, shots, self.seed)
    }

    fn execute_batch(&self, circuits: &[Circuit], shots: u64) -> QptResult<Vec<ExecutionResult>> {
        circuits
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let seed = self.seed.map(|s| s.wrapping_add(i as u64));
                self.execute_seeded(c, shots, seed)
            })
            .collect()
    }

    fn is_simulator(&self) -> bool {
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qpt_core::CircuitBuilder;
    use std::f64::consts::PI;

    #[test]
    fn test_bell_state() {
        let backend = SimulatorBackend::ideal(2).with_seed(42);
        let circuit = CircuitBuilder::new(2).h(0).cnot(0, 1).measure_all().build();

        let (probs, width) = backend.probabilities(&circuit).unwrap();
        assert_eq!(width, 2);
        assert_abs_diff_eq!(probs[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(probs[3], 0.5, epsilon = 1e-12);

        let result = backend.execute(&circuit, 10000).unwrap();
        assert_eq!(result.total_counts(), 10000);
        assert!((result.probability("00") - 0.5).abs() < 0.05);
        assert_eq!(result.probability("01"), 0.0);
    }

    #[test]
    fn test_measure_into_permuted_clbits() {
        let backend = SimulatorBackend::ideal(3);
        // qubit 2 set, read into clbit 0
        let circuit = CircuitBuilder::new(3).x(2).measure(2, 0).measure(0, 1).build();
        let (probs, _) = backend.probabilities(&circuit).unwrap();
        assert_abs_diff_eq!(probs[0b001], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_gates() {
        let backend = SimulatorBackend::ideal(1).with_seed(42);
        let circuit = CircuitBuilder::new(1).rx(0, PI).measure_all().build();
        let result = backend.execute(&circuit, 1000).unwrap();
        assert_eq!(result.probability("1"), 1.0);
    }

    #[test]
    fn test_full_depolarizing_randomizes() {
        let backend = SimulatorBackend::from_depol(3, 1.0).unwrap();
        let circuit = CircuitBuilder::new(3).ccx(0, 1, 2).measure_all().build();
        let (probs, _) = backend.probabilities(&circuit).unwrap();
        for p in probs {
            assert_abs_diff_eq!(p, 0.125, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_partial_depolarizing_on_x() {
        let backend = SimulatorBackend::from_depol(1, 0.2).unwrap();
        let circuit = CircuitBuilder::new(1).x(0).measure_all().build();
        let (probs, _) = backend.probabilities(&circuit).unwrap();
        // (1-p)|1⟩⟨1| + p I/2
        assert_abs_diff_eq!(probs[1], 0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_readout_error() {
        let noise = NoiseModel::ideal().with_readout_error(0.1);
        let backend = SimulatorBackend::new(2, noise);
        let circuit = CircuitBuilder::new(2).measure_all().build();
        let (probs, _) = backend.probabilities(&circuit).unwrap();
        assert_abs_diff_eq!(probs[0b00], 0.81, epsilon = 1e-12);
        assert_abs_diff_eq!(probs[0b01], 0.09, epsilon = 1e-12);
        assert_abs_diff_eq!(probs[0b11], 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_mid_circuit_measurement_rejected() {
        let backend = SimulatorBackend::ideal(1);
        let circuit = CircuitBuilder::new(1).measure(0, 0).h(0).build();
        assert!(matches!(
            backend.execute(&circuit, 10),
            Err(QptError::BackendError(_))
        ));
    }

    #[test]
    fn test_seeded_batch_reproducible() {
        let backend = SimulatorBackend::ideal(1).with_seed(7);
        let circuits: Vec<_> = (0..4)
            .map(|_| CircuitBuilder::new(1).h(0).measure_all().build())
            .collect();
        let a = backend.execute_batch(&circuits, 500).unwrap();
        let b = backend.execute_batch(&circuits, 500).unwrap();
        let counts_a: Vec<_> = a.iter().map(|r| r.counts.clone()).collect();
        let counts_b: Vec<_> = b.iter().map(|r| r.counts.clone()).collect();
        assert_eq!(counts_a, counts_b);
        assert_eq!(a[2].metadata.seed, Some(9));
    }

    #[test]
    fn test_too_many_qubits() {
        let backend = SimulatorBackend::ideal(2);
        let circuit = CircuitBuilder::new(3).h(2).build();
        assert!(backend.execute(&circuit, 10).is_err());
        assert!(matches!(
            backend.execute(&CircuitBuilder::new(1).h(0).build(), 0),
            Err(QptError::ShotsOutOfRange(0, _, _))
        ));
    }
}
