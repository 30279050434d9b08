//! Circuit builder for QPT
//!
//! Gantree: L1_Circuit → CircuitBuilder
//!
//! Fluent builder for circuits, including the two canonical H/T/CX
//! decompositions of the Toffoli gate that get characterized on hardware.

use crate::circuit::Circuit;
use crate::error::{QptError, QptResult};
use crate::gate::Gate;
use crate::types::{Angle, ClbitId, QubitId};

/// Fluent circuit builder (consuming self pattern)
///
/// Invalid gates are skipped; the first rejection is kept and reported
/// by [`CircuitBuilder::try_build`].
/// Gantree: CircuitBuilder // 빌더 패턴
pub struct CircuitBuilder {
    /// Gantree: circuit: Circuit // 내부 회로
    circuit: Circuit,
    first_error: Option<QptError>,
}

impl CircuitBuilder {
    // ========================================================================
    // Constructor
    // ========================================================================

    /// Create a new circuit builder
    /// Gantree: new(n) -> Self // 생성자
    pub fn new(num_qubits: usize) -> Self {
        Self::from_circuit(Circuit::new(num_qubits))
    }

    /// Create with circuit name
    pub fn with_name(num_qubits: usize, name: impl Into<String>) -> Self {
        Self::from_circuit(Circuit::with_name(num_qubits, name))
    }

    /// Continue building on an existing circuit
    pub fn from_circuit(circuit: Circuit) -> Self {
        Self {
            circuit,
            first_error: None,
        }
    }

    fn push(mut self, gate: Gate) -> Self {
        if let Err(e) = self.circuit.add_gate(gate) {
            self.first_error.get_or_insert(e);
        }
        self
    }

    // ========================================================================
    // Single-Qubit Gates
    // ========================================================================

    /// Add Hadamard gate
    /// Gantree: h(self, q) -> Self // H 추가
    pub fn h(self, qubit: QubitId) -> Self {
        self.push(Gate::H(qubit))
    }

    /// Add Pauli-X gate
    pub fn x(self, qubit: QubitId) -> Self {
        self.push(Gate::X(qubit))
    }

    /// Add Pauli-Y gate
    pub fn y(self, qubit: QubitId) -> Self {
        self.push(Gate::Y(qubit))
    }

    /// Add Pauli-Z gate
    pub fn z(self, qubit: QubitId) -> Self {
        self.push(Gate::Z(qubit))
    }

    /// Add S gate
    pub fn s(self, qubit: QubitId) -> Self {
        self.push(Gate::S(qubit))
    }

    /// Add S-dagger gate
    pub fn sdg(self, qubit: QubitId) -> Self {
        self.push(Gate::Sdg(qubit))
    }

    /// Add T gate
    pub fn t(self, qubit: QubitId) -> Self {
        self.push(Gate::T(qubit))
    }

    /// Add T-dagger gate
    pub fn tdg(self, qubit: QubitId) -> Self {
        self.push(Gate::Tdg(qubit))
    }

    /// Add Rx rotation
    pub fn rx(self, qubit: QubitId, angle: Angle) -> Self {
        self.push(Gate::Rx(qubit, angle))
    }

    /// Add Ry rotation
    pub fn ry(self, qubit: QubitId, angle: Angle) -> Self {
        self.push(Gate::Ry(qubit, angle))
    }

    /// Add Rz rotation
    pub fn rz(self, qubit: QubitId, angle: Angle) -> Self {
        self.push(Gate::Rz(qubit, angle))
    }

    /// Add U3 gate
    pub fn u3(self, qubit: QubitId, theta: Angle, phi: Angle, lambda: Angle) -> Self {
        self.push(Gate::U(qubit, theta, phi, lambda))
    }

    // ========================================================================
    // Multi-Qubit Gates
    // ========================================================================

    /// Add CNOT gate
    /// Gantree: cnot(self, c, t) -> Self // CNOT 추가
    pub fn cnot(self, control: QubitId, target: QubitId) -> Self {
        self.push(Gate::Cnot(control, target))
    }

    /// Alias for cnot
    pub fn cx(self, control: QubitId, target: QubitId) -> Self {
        self.cnot(control, target)
    }

    /// Add CZ gate
    pub fn cz(self, control: QubitId, target: QubitId) -> Self {
        self.push(Gate::Cz(control, target))
    }

    /// Add SWAP gate
    pub fn swap(self, qubit1: QubitId, qubit2: QubitId) -> Self {
        self.push(Gate::Swap(qubit1, qubit2))
    }

    /// Add Toffoli (CCX) gate
    pub fn ccx(self, c1: QubitId, c2: QubitId, target: QubitId) -> Self {
        self.push(Gate::Ccx(c1, c2, target))
    }

    // ========================================================================
    // Measurement and Control
    // ========================================================================

    /// Measure qubit into clbit
    /// Gantree: measure(self, q, c) -> Self // 측정 추가
    pub fn measure(self, qubit: QubitId, clbit: ClbitId) -> Self {
        self.push(Gate::Measure(qubit, clbit))
    }

    /// Measure qubit i into clbit i for every qubit
    /// Gantree: measure_all(self) -> Self // 전체 측정
    pub fn measure_all(mut self) -> Self {
        for q in 0..self.circuit.num_qubits() {
            self = self.measure(q, q);
        }
        self
    }

    /// Add barrier on all qubits
    pub fn barrier(self) -> Self {
        let qubits: Vec<QubitId> = (0..self.circuit.num_qubits()).collect();
        self.push(Gate::Barrier(qubits))
    }

    // ========================================================================
    // Layer Operations
    // ========================================================================

    /// Add a U3 layer on every qubit; `params` holds (θ, φ, λ) per qubit
    /// Gantree: u3_layer(self, params) -> Self // U3 레이어
    pub fn u3_layer(mut self, params: &[Angle]) -> Self {
        let n = self.circuit.num_qubits();
        for (q, p) in params.chunks_exact(3).take(n).enumerate() {
            self = self.u3(q, p[0], p[1], p[2]);
        }
        self
    }

    // ========================================================================
    // Toffoli Decompositions
    // ========================================================================

    /// Canonical 15-gate Toffoli on fully connected qubits (c0, c1, t)
    /// Gantree: canonical_full_toffoli(self, q) -> Self // 완전 연결 토폴리
    pub fn canonical_full_toffoli(self, qubits: [QubitId; 3]) -> Self {
        let [a, b, c] = qubits;
        self.h(c)
            .cx(b, c)
            .tdg(c)
            .cx(a, c)
            .t(c)
            .cx(b, c)
            .tdg(c)
            .cx(a, c)
            .t(b)
            .t(c)
            .cx(a, b)
            .t(a)
            .tdg(b)
            .h(c)
            .cx(a, b)
    }

    /// Canonical Toffoli on a linear chain c0 - c1 - t (nearest-neighbour CX only)
    /// Gantree: canonical_linear_toffoli(self, q) -> Self // 선형 토폴리
    pub fn canonical_linear_toffoli(self, qubits: [QubitId; 3]) -> Self {
        let [a, b, c] = qubits;
        self.h(c)
            .t(a)
            .t(b)
            .t(c)
            .cx(a, b)
            .cx(b, c)
            .cx(a, b)
            .t(c)
            .cx(b, c)
            .cx(a, b)
            .tdg(b)
            .tdg(c)
            .cx(b, c)
            .cx(a, b)
            .tdg(c)
            .cx(b, c)
            .h(c)
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build and return the circuit
    /// Gantree: build(self) -> Circuit // 빌드
    pub fn build(self) -> Circuit {
        self.circuit
    }

    /// Build, failing on the first rejected gate or an empty circuit
    pub fn try_build(self) -> QptResult<Circuit> {
        if let Some(e) = self.first_error {
            return Err(e);
        }
        if self.circuit.is_empty() {
            return Err(QptError::EmptyCircuit);
        }
        Ok(self.circuit)
    }

    /// Get reference to current circuit state
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let circuit = CircuitBuilder::new(3)
            .h(0)
            .cnot(0, 1)
            .cnot(1, 2)
            .measure_all()
            .build();

        assert_eq!(circuit.num_qubits(), 3);
        assert_eq!(circuit.gate_count(), 6);
        assert_eq!(circuit.count_measurements(), 3);
    }

    #[test]
    fn test_try_build_reports_first_error() {
        let result = CircuitBuilder::new(2).h(0).cx(0, 4).x(9).try_build();
        assert!(matches!(
            result,
            Err(QptError::GateQubitMismatch { qubit: 4, .. })
        ));
        assert!(matches!(
            CircuitBuilder::new(2).try_build(),
            Err(QptError::EmptyCircuit)
        ));
    }

    #[test]
    fn test_u3_layer() {
        let params = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];
        let circuit = CircuitBuilder::new(3).u3_layer(&params).build();
        assert_eq!(circuit.count_1q(), 3);
        assert_eq!(circuit.gates()[2], Gate::U(2, 0.7, 0.8, 0.9));
    }

    #[test]
    fn test_canonical_toffoli_gate_counts() {
        let full = CircuitBuilder::new(3).canonical_full_toffoli([0, 1, 2]).build();
        assert_eq!(full.gate_count(), 15);
        assert_eq!(full.count_2q(), 6);

        let linear = CircuitBuilder::new(3)
            .canonical_linear_toffoli([0, 1, 2])
            .build();
        assert_eq!(linear.gate_count(), 17);
        assert!(linear
            .gates()
            .iter()
            .filter(|g| g.is_two_qubit())
            .all(|g| !matches!(g, Gate::Cnot(0, 2) | Gate::Cnot(2, 0))));
    }
}
