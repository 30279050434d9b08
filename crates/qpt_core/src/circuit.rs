//! Quantum circuit structure for QPT
//!
//! Gantree: L1_Circuit → Circuit
//!
//! Gate-level circuit with a quantum and a classical register, and its
//! OpenQASM 2.0 wire form. The circuit name travels through QASM as a
//! `// circuit: <name>` comment so job results can be matched back to the
//! submitted tomography circuits.

use crate::error::{QptError, QptResult};
use crate::gate::Gate;
use crate::types::QubitId;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

const NAME_PREFIX: &str = "// circuit:";

/// Quantum circuit
/// Gantree: Circuit // 회로 구조체
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Gantree: num_qubits: usize // 큐비트 수
    num_qubits: usize,

    /// Gantree: num_clbits: usize // 고전 비트 수
    num_clbits: usize,

    /// Gantree: gates: Vec<Gate> // 게이트 목록
    gates: Vec<Gate>,

    name: Option<String>,
}

impl Circuit {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a new empty circuit with one clbit per qubit
    /// Gantree: new(n) -> Self // 생성자
    pub fn new(num_qubits: usize) -> Self {
        Self::with_clbits(num_qubits, num_qubits)
    }

    /// Create a new empty circuit with an explicit classical register size
    pub fn with_clbits(num_qubits: usize, num_clbits: usize) -> Self {
        Self {
            num_qubits,
            num_clbits,
            gates: Vec::new(),
            name: None,
        }
    }

    /// Create a circuit with a name
    pub fn with_name(num_qubits: usize, name: impl Into<String>) -> Self {
        let mut circuit = Self::new(num_qubits);
        circuit.name = Some(name.into());
        circuit
    }

    /// Create from a vector of gates
    pub fn from_gates(num_qubits: usize, num_clbits: usize, gates: Vec<Gate>) -> QptResult<Self> {
        let mut circuit = Self::with_clbits(num_qubits, num_clbits);
        circuit.add_gates(gates)?;
        Ok(circuit)
    }

    // ========================================================================
    // Basic Operations
    // ========================================================================

    /// Add a gate to the circuit
    /// Gantree: add_gate(&mut, Gate) -> Result // 게이트 추가
    pub fn add_gate(&mut self, gate: Gate) -> QptResult<()> {
        let qubits = gate.qubits();
        for (i, &qubit) in qubits.iter().enumerate() {
            if qubit >= self.num_qubits {
                return Err(QptError::GateQubitMismatch {
                    qubit,
                    num_qubits: self.num_qubits,
                });
            }
            if gate.is_unitary() && qubits[..i].contains(&qubit) {
                return Err(QptError::DuplicateQubit {
                    gate: gate.name().to_string(),
                    qubit,
                });
            }
        }
        if let Gate::Measure(_, clbit) = gate {
            if clbit >= self.num_clbits {
                return Err(QptError::ClbitOutOfRange {
                    clbit,
                    num_clbits: self.num_clbits,
                });
            }
        }
        self.gates.push(gate);
        Ok(())
    }

    /// Add multiple gates
    pub fn add_gates(&mut self, gates: impl IntoIterator<Item = Gate>) -> QptResult<()> {
        for gate in gates {
            self.add_gate(gate)?;
        }
        Ok(())
    }

    /// Append another circuit's gates (qubits and clbits unchanged)
    pub fn append(&mut self, other: &Circuit) -> QptResult<()> {
        self.add_gates(other.gates.iter().cloned())
    }

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Get number of classical bits
    pub fn num_clbits(&self) -> usize {
        self.num_clbits
    }

    /// Get gates
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Get circuit name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set circuit name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Check if circuit is empty
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    // ========================================================================
    // Circuit Analysis
    // ========================================================================

    /// Calculate circuit depth (barriers excluded)
    /// Gantree: depth(&self) -> usize // 깊이 계산
    pub fn depth(&self) -> usize {
        let mut qubit_depths = vec![0usize; self.num_qubits];

        for gate in self.gates.iter().filter(|g| !g.is_barrier()) {
            let qubits = gate.qubits();
            let max_depth = qubits
                .iter()
                .filter_map(|&q| qubit_depths.get(q))
                .max()
                .copied()
                .unwrap_or(0);
            for &q in &qubits {
                if let Some(d) = qubit_depths.get_mut(q) {
                    *d = max_depth + 1;
                }
            }
        }

        qubit_depths.into_iter().max().unwrap_or(0)
    }

    /// Get total gate count (barriers included)
    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    /// Count single-qubit gates
    /// Gantree: count_1q(&self) -> usize // 1Q 수
    pub fn count_1q(&self) -> usize {
        self.gates.iter().filter(|g| g.is_single_qubit()).count()
    }

    /// Count two-qubit gates
    /// Gantree: count_2q(&self) -> usize // 2Q 수
    pub fn count_2q(&self) -> usize {
        self.gates.iter().filter(|g| g.is_two_qubit()).count()
    }

    /// Count measurement operations
    pub fn count_measurements(&self) -> usize {
        self.gates.iter().filter(|g| g.is_measurement()).count()
    }

    /// Measurement map `(qubit, clbit)` in program order
    pub fn measurements(&self) -> Vec<(QubitId, usize)> {
        self.gates
            .iter()
            .filter_map(|g| match g {
                Gate::Measure(q, c) => Some((*q, *c)),
                _ => None,
            })
            .collect()
    }

    // ========================================================================
    // QASM Conversion
    // ========================================================================

    /// Convert to OpenQASM 2.0 string
    /// Gantree: to_qasm(&self) -> String // QASM2 출력
    pub fn to_qasm(&self) -> String {
        let mut lines = Vec::new();

        lines.push("OPENQASM 2.0;".to_string());
        lines.push("include \"qelib1.inc\";".to_string());
        if let Some(name) = &self.name {
            lines.push(format!("{} {}", NAME_PREFIX, name));
        }
        lines.push(String::new());

        lines.push(format!("qreg q[{}];", self.num_qubits));
        if self.num_clbits > 0 {
            lines.push(format!("creg c[{}];", self.num_clbits));
        }
        lines.push(String::new());

        for gate in &self.gates {
            lines.push(gate.to_qasm());
        }

        lines.join("\n")
    }

    /// Parse from OpenQASM 2.0 string (single `q`/`c` register subset)
    /// Gantree: from_qasm(s) -> Result<Self> // QASM2 파싱
    pub fn from_qasm(qasm: &str) -> QptResult<Self> {
        let mut num_qubits = None;
        let mut num_clbits = 0;
        let mut name = None;
        let mut gates = Vec::new();

        for line in qasm.lines() {
            let line = line.trim();

            if let Some(rest) = line.strip_prefix(NAME_PREFIX) {
                name = Some(rest.trim().to_string());
                continue;
            }
            if line.is_empty()
                || line.starts_with("//")
                || line.starts_with("OPENQASM")
                || line.starts_with("include")
            {
                continue;
            }
            if line.starts_with("qreg") {
                num_qubits = Some(parse_register_size(line)?);
                continue;
            }
            if line.starts_with("creg") {
                num_clbits = parse_register_size(line)?;
                continue;
            }

            let n = num_qubits.ok_or_else(|| {
                QptError::InvalidQasm(format!("Gate before qreg declaration: {}", line))
            })?;
            gates.push(parse_gate_line(line, n)?);
        }

        let num_qubits =
            num_qubits.ok_or_else(|| QptError::InvalidQasm("No qreg declaration found".into()))?;

        let mut circuit = Circuit::from_gates(num_qubits, num_clbits, gates)?;
        circuit.name = name;
        Ok(circuit)
    }
}

// ============================================================================
// QASM Parsing Helpers
// ============================================================================

fn parse_register_size(line: &str) -> QptResult<usize> {
    let start = line.find('[');
    let end = line.find(']');
    match (start, end) {
        (Some(s), Some(e)) if s < e => line[s + 1..e]
            .trim()
            .parse()
            .map_err(|_| QptError::InvalidQasm(format!("Bad register size: {}", line))),
        _ => Err(QptError::InvalidQasm(format!("Bad register: {}", line))),
    }
}

fn parse_angle(s: &str) -> QptResult<f64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<f64>() {
        return Ok(v);
    }
    let (sign, body) = match s.strip_prefix('-') {
        Some(rest) => (-1.0, rest.trim()),
        None => (1.0, s),
    };
    let value = if body == "pi" {
        PI
    } else if let Some(div) = body.strip_prefix("pi/") {
        let d: f64 = div
            .trim()
            .parse()
            .map_err(|_| QptError::InvalidQasm(format!("Bad angle: {}", s)))?;
        PI / d
    } else {
        return Err(QptError::InvalidQasm(format!("Bad angle: {}", s)));
    };
    Ok(sign * value)
}

fn parse_operand(part: &str, register: char) -> QptResult<usize> {
    let part = part.trim();
    let bad = || QptError::InvalidQasm(format!("Bad operand: {}", part));
    if !part.starts_with(register) {
        return Err(bad());
    }
    let start = part.find('[').ok_or_else(bad)?;
    let end = part.find(']').ok_or_else(bad)?;
    part[start + 1..end].trim().parse().map_err(|_| bad())
}

fn parse_gate_line(line: &str, num_qubits: usize) -> QptResult<Gate> {
    let line = line.trim().trim_end_matches(';').trim();

    if let Some(rest) = line.strip_prefix("measure") {
        let (q, c) = rest
            .split_once("->")
            .ok_or_else(|| QptError::InvalidQasm(format!("Bad measure: {}", line)))?;
        return Ok(Gate::Measure(parse_operand(q, 'q')?, parse_operand(c, 'c')?));
    }

    let (head, operands) = match line.find('(') {
        Some(_) => {
            let close = line
                .find(')')
                .ok_or_else(|| QptError::InvalidQasm(format!("Missing closing paren: {}", line)))?;
            (&line[..close + 1], line[close + 1..].trim())
        }
        None => line
            .split_once(char::is_whitespace)
            .map(|(h, o)| (h, o.trim()))
            .unwrap_or((line, "")),
    };

    let (name, params) = match head.find('(') {
        Some(open) => {
            let params = head[open + 1..head.len() - 1]
                .split(',')
                .map(parse_angle)
                .collect::<QptResult<Vec<f64>>>()?;
            (&head[..open], params)
        }
        None => (head, Vec::new()),
    };

    if name == "barrier" && operands == "q" {
        return Ok(Gate::Barrier((0..num_qubits).collect()));
    }

    let qubits = if operands.is_empty() {
        Vec::new()
    } else {
        operands
            .split(',')
            .map(|p| parse_operand(p, 'q'))
            .collect::<QptResult<Vec<QubitId>>>()?
    };

    let arity_err = || QptError::InvalidQasm(format!("Wrong operand count: {}", line));
    let q1 = || -> QptResult<QubitId> {
        match qubits.as_slice() {
            [q] => Ok(*q),
            _ => Err(arity_err()),
        }
    };
    let q2 = || -> QptResult<(QubitId, QubitId)> {
        match qubits.as_slice() {
            [a, b] => Ok((*a, *b)),
            _ => Err(arity_err()),
        }
    };
    let p = |i: usize| -> QptResult<f64> { params.get(i).copied().ok_or_else(arity_err) };

    let gate = match name.to_lowercase().as_str() {
        "h" => Gate::H(q1()?),
        "x" => Gate::X(q1()?),
        "y" => Gate::Y(q1()?),
        "z" => Gate::Z(q1()?),
        "s" => Gate::S(q1()?),
        "sdg" => Gate::Sdg(q1()?),
        "t" => Gate::T(q1()?),
        "tdg" => Gate::Tdg(q1()?),
        "sx" => Gate::Sx(q1()?),
        "id" => Gate::Id(q1()?),
        "rx" => Gate::Rx(q1()?, p(0)?),
        "ry" => Gate::Ry(q1()?, p(0)?),
        "rz" => Gate::Rz(q1()?, p(0)?),
        "p" | "u1" => Gate::P(q1()?, p(0)?),
        "u" | "u3" => Gate::U(q1()?, p(0)?, p(1)?, p(2)?),
        "cx" | "cnot" => {
            let (a, b) = q2()?;
            Gate::Cnot(a, b)
        }
        "cz" => {
            let (a, b) = q2()?;
            Gate::Cz(a, b)
        }
        "swap" => {
            let (a, b) = q2()?;
            Gate::Swap(a, b)
        }
        "ccx" | "toffoli" => match qubits.as_slice() {
            [a, b, c] => Gate::Ccx(*a, *b, *c),
            _ => return Err(arity_err()),
        },
        "barrier" => Gate::Barrier(qubits),
        other => return Err(QptError::InvalidQasm(format!("Unsupported gate: {}", other))),
    };

    Ok(gate)
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Circuit({} qubits, {} clbits, {} gates)",
            self.num_qubits,
            self.num_clbits,
            self.gates.len()
        )?;
        if let Some(name) = &self.name {
            writeln!(f, "  Name: {}", name)?;
        }
        writeln!(f, "  Depth: {}", self.depth())?;
        writeln!(f, "  1Q gates: {}", self.count_1q())?;
        writeln!(f, "  2Q gates: {}", self.count_2q())?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_gate_out_of_range() {
        let mut circuit = Circuit::new(3);
        assert!(circuit.add_gate(Gate::H(0)).is_ok());
        assert!(matches!(
            circuit.add_gate(Gate::H(5)),
            Err(QptError::GateQubitMismatch { qubit: 5, .. })
        ));
        assert!(matches!(
            circuit.add_gate(Gate::Measure(0, 3)),
            Err(QptError::ClbitOutOfRange { clbit: 3, .. })
        ));
    }

    #[test]
    fn test_duplicate_operand_rejected() {
        let mut circuit = Circuit::new(3);
        assert!(matches!(
            circuit.add_gate(Gate::Cnot(1, 1)),
            Err(QptError::DuplicateQubit { qubit: 1, .. })
        ));
    }

    #[test]
    fn test_circuit_depth() {
        let mut circuit = Circuit::new(3);
        circuit.add_gate(Gate::H(0)).unwrap();
        circuit.add_gate(Gate::H(1)).unwrap();
        circuit.add_gate(Gate::Barrier(vec![0, 1, 2])).unwrap();
        circuit.add_gate(Gate::Cnot(0, 1)).unwrap();
        circuit.add_gate(Gate::H(2)).unwrap();
        assert_eq!(circuit.depth(), 2);
    }

    #[test]
    fn test_measurements() {
        let mut circuit = Circuit::with_clbits(3, 2);
        circuit.add_gate(Gate::Measure(2, 0)).unwrap();
        circuit.add_gate(Gate::Measure(0, 1)).unwrap();
        assert_eq!(circuit.measurements(), vec![(2, 0), (0, 1)]);
        assert_eq!(circuit.count_measurements(), 2);
    }

    #[test]
    fn test_qasm_roundtrip_keeps_name_and_measure_map() {
        let mut circuit = Circuit::with_clbits(3, 2);
        circuit.set_name("(Zp,Xp)-ZX");
        circuit
            .add_gates(vec![
                Gate::H(1),
                Gate::Barrier(vec![1, 2]),
                Gate::U(0, 0.25, -1.5, 3.0),
                Gate::Ccx(0, 1, 2),
                Gate::Measure(2, 0),
                Gate::Measure(1, 1),
            ])
            .unwrap();

        let parsed = Circuit::from_qasm(&circuit.to_qasm()).unwrap();
        assert_eq!(parsed, circuit);
    }

    #[test]
    fn test_from_qasm_pi_angles() {
        let qasm = r#"
            OPENQASM 2.0;
            include "qelib1.inc";
            qreg q[1];
            creg c[1];
            rz(pi/2) q[0];
            rx(-pi) q[0];
            measure q[0] -> c[0];
        "#;
        let circuit = Circuit::from_qasm(qasm).unwrap();
        assert_eq!(circuit.gates()[0], Gate::Rz(0, PI / 2.0));
        assert_eq!(circuit.gates()[1], Gate::Rx(0, -PI));
    }

    #[test]
    fn test_from_qasm_errors() {
        assert!(Circuit::from_qasm("h q[0];").is_err());
        let unsupported = "qreg q[1];\nfoo q[0];";
        assert!(matches!(
            Circuit::from_qasm(unsupported),
            Err(QptError::InvalidQasm(_))
        ));
        let out_of_range = "qreg q[1];\nh q[3];";
        assert!(Circuit::from_qasm(out_of_range).is_err());
    }
}
