//! Process tomography circuit generation
//!
//! Gantree: L3_Tomography → Generator
//!
//! For k target qubits the family is every preparation configuration
//! crossed with every measurement basis, the first target qubit varying
//! slowest. Each circuit is
//! `prep → barrier → circuit → barrier → basis change → measure`, with
//! target j read into clbit j, and is named after its label.

use crate::basis::TomographyBasis;
use crate::result::TomographyLabel;
use qpt_core::{tomography, BasisString, Circuit, Gate, QptError, QptResult, QubitId};

/// Generated circuit with its label
#[derive(Debug, Clone, PartialEq)]
pub struct TomographyCircuit {
    /// Preparation and measurement setting
    pub label: TomographyLabel,

    /// Executable circuit
    pub circuit: Circuit,
}

/// Process tomography circuits for `circuit` on `targets`
/// Gantree: process_tomography_circuits(circuit, targets, basis) -> Vec // 회로 생성
pub fn process_tomography_circuits(
    circuit: &Circuit,
    targets: &[QubitId],
    basis: TomographyBasis,
) -> QptResult<Vec<TomographyCircuit>> {
    validate_targets(circuit, targets)?;
    if circuit.count_measurements() > 0 {
        return Err(QptError::Config(
            "tomography target circuit must not contain measurements".into(),
        ));
    }

    let k = targets.len();
    let prep_configs = product(basis.prep.states(), k);
    let meas_configs = product(basis.meas_bases(), k);

    let mut out = Vec::with_capacity(prep_configs.len() * meas_configs.len());
    for prep in &prep_configs {
        for meas in &meas_configs {
            let label = TomographyLabel::new(prep.clone(), BasisString::new(meas.clone()))?;
            out.push(TomographyCircuit {
                circuit: build_circuit(circuit, targets, &label)?,
                label,
            });
        }
    }

    log::debug!(
        "generated {} tomography circuits on qubits {:?}",
        out.len(),
        targets
    );
    Ok(out)
}

fn validate_targets(circuit: &Circuit, targets: &[QubitId]) -> QptResult<()> {
    if targets.is_empty() {
        return Err(QptError::Config("no target qubits".into()));
    }
    if targets.len() > tomography::MAX_TARGET_QUBITS {
        return Err(QptError::Config(format!(
            "{} target qubits exceeds the limit of {}",
            targets.len(),
            tomography::MAX_TARGET_QUBITS
        )));
    }
    for (i, &q) in targets.iter().enumerate() {
        if q >= circuit.num_qubits() {
            return Err(QptError::QubitOutOfRange {
                qubit: q,
                max: circuit.num_qubits(),
            });
        }
        if targets[..i].contains(&q) {
            return Err(QptError::DuplicateQubit {
                gate: "tomography".into(),
                qubit: q,
            });
        }
    }
    Ok(())
}

fn build_circuit(
    circuit: &Circuit,
    targets: &[QubitId],
    label: &TomographyLabel,
) -> QptResult<Circuit> {
    let all: Vec<QubitId> = (0..circuit.num_qubits()).collect();
    let mut out = Circuit::with_clbits(circuit.num_qubits(), targets.len());
    out.set_name(label.to_string());

    for (&q, state) in targets.iter().zip(&label.prep) {
        out.add_gates(state.gates(q))?;
    }
    out.add_gate(Gate::Barrier(all.clone()))?;
    out.append(circuit)?;
    out.add_gate(Gate::Barrier(all))?;
    for (&q, &b) in targets.iter().zip(label.meas.iter()) {
        out.add_gates(Gate::basis_transform(q, b))?;
    }
    for (j, &q) in targets.iter().enumerate() {
        out.add_gate(Gate::Measure(q, j))?;
    }
    Ok(out)
}

/// Cartesian power in lexicographic order, position 0 slowest
fn product<T: Copy>(items: &[T], k: usize) -> Vec<Vec<T>> {
    (0..k).fold(vec![Vec::new()], |acc, _| {
        acc.into_iter()
            .flat_map(|prefix| {
                items.iter().map(move |&item| {
                    let mut next = prefix.clone();
                    next.push(item);
                    next
                })
            })
            .collect()
    })
}

/// Labels of a generated family
pub fn labels(circuits: &[TomographyCircuit]) -> Vec<TomographyLabel> {
    circuits.iter().map(|c| c.label.clone()).collect()
}

/// Circuits of a generated family
pub fn circuits(circuits: &[TomographyCircuit]) -> Vec<Circuit> {
    circuits.iter().map(|c| c.circuit.clone()).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qpt_core::CircuitBuilder;
    use std::collections::HashSet;

    fn toffoli() -> Circuit {
        CircuitBuilder::new(3).ccx(0, 1, 2).build()
    }

    #[test]
    fn test_circuit_count_and_order() {
        let family =
            process_tomography_circuits(&toffoli(), &[0, 1, 2], TomographyBasis::minimal()).unwrap();
        assert_eq!(family.len(), 1728);
        assert_eq!(family[0].label.to_string(), "(Zp,Zp,Zp)-XXX");
        assert_eq!(family[1].label.to_string(), "(Zp,Zp,Zp)-XXY");
        assert_eq!(family[27].label.to_string(), "(Zp,Zp,Zm)-XXX");
        assert_eq!(family[1727].label.to_string(), "(Yp,Yp,Yp)-ZZZ");

        let names: HashSet<_> = family.iter().map(|c| c.label.to_string()).collect();
        assert_eq!(names.len(), 1728);
    }

    #[test]
    fn test_overcomplete_count() {
        let c = CircuitBuilder::new(2).cnot(0, 1).build();
        let family =
            process_tomography_circuits(&c, &[1, 0], TomographyBasis::overcomplete()).unwrap();
        assert_eq!(family.len(), 36 * 9);
    }

    #[test]
    fn test_circuit_layout() {
        let family =
            process_tomography_circuits(&toffoli(), &[0, 1, 2], TomographyBasis::minimal()).unwrap();
        let tc = family
            .iter()
            .find(|c| c.label.to_string() == "(Zm,Xp,Yp)-ZXY")
            .unwrap();
        let gates = tc.circuit.gates();
        assert_eq!(tc.circuit.name(), Some("(Zm,Xp,Yp)-ZXY"));
        assert_eq!(tc.circuit.num_clbits(), 3);
        assert_eq!(
            &gates[..4],
            &[Gate::X(0), Gate::H(1), Gate::H(2), Gate::S(2)]
        );
        assert!(gates.contains(&Gate::Ccx(0, 1, 2)));
        assert_eq!(
            tc.circuit.measurements(),
            vec![(0, 0), (1, 1), (2, 2)]
        );
        // X on qubit 1: H; Y on qubit 2: Sdg, H
        let n = gates.len();
        assert_eq!(
            &gates[n - 6..n - 3],
            &[Gate::H(1), Gate::Sdg(2), Gate::H(2)]
        );
    }

    #[test]
    fn test_target_subset_maps_clbits() {
        let c = CircuitBuilder::new(3).cnot(2, 0).build();
        let family = process_tomography_circuits(&c, &[2, 0], TomographyBasis::minimal()).unwrap();
        assert_eq!(family.len(), 144);
        assert_eq!(family[0].circuit.measurements(), vec![(2, 0), (0, 1)]);
        assert_eq!(family[0].circuit.num_clbits(), 2);
    }

    #[test]
    fn test_invalid_targets() {
        let c = toffoli();
        let basis = TomographyBasis::minimal();
        assert!(matches!(
            process_tomography_circuits(&c, &[], basis),
            Err(QptError::Config(_))
        ));
        assert!(matches!(
            process_tomography_circuits(&c, &[0, 3], basis),
            Err(QptError::QubitOutOfRange { .. })
        ));
        assert!(matches!(
            process_tomography_circuits(&c, &[1, 1], basis),
            Err(QptError::DuplicateQubit { .. })
        ));

        let measured = CircuitBuilder::new(1).h(0).measure(0, 0).build();
        assert!(process_tomography_circuits(&measured, &[0], basis).is_err());
    }
}
