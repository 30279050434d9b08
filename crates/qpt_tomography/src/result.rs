//! Tomography labels and paired results
//!
//! Gantree: L3_Tomography → Result
//!
//! Every count histogram travels with the label of the circuit that produced
//! it, so nothing downstream depends on list position.

use crate::basis::PrepState;
use qpt_backend::ExecutionResult;
use qpt_core::{
    counts_width, tomography, total_counts, Basis, BasisString, Counts, QptError, QptResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Label
// ============================================================================

/// Preparation and measurement setting of one tomography circuit
///
/// Both lists are in target-qubit order. Renders as `(Zp,Xp,Yp)-ZXY`.
/// Gantree: TomographyLabel // 회로 라벨
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TomographyLabel {
    /// Preparation state per target qubit
    pub prep: Vec<PrepState>,

    /// Measurement basis per target qubit
    pub meas: BasisString,
}

impl TomographyLabel {
    /// Create a label, checking both sides have the same width
    pub fn new(prep: Vec<PrepState>, meas: BasisString) -> QptResult<Self> {
        if prep.len() != meas.len() {
            return Err(QptError::DimensionMismatch {
                expected: prep.len(),
                found: meas.len(),
            });
        }
        Ok(Self { prep, meas })
    }

    /// Number of target qubits
    pub fn num_qubits(&self) -> usize {
        self.prep.len()
    }

    /// Measurement bases as a slice-friendly vector
    pub fn meas_bases(&self) -> Vec<Basis> {
        self.meas.iter().copied().collect()
    }
}

impl fmt::Display for TomographyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prep: Vec<&str> = self.prep.iter().map(PrepState::as_str).collect();
        write!(f, "({})-{}", prep.join(","), self.meas)
    }
}

impl FromStr for TomographyLabel {
    type Err = QptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || QptError::InvalidPreparation(s.to_string());
        let (prep, meas) = s
            .strip_prefix('(')
            .and_then(|rest| rest.split_once(")-"))
            .ok_or_else(bad)?;
        let prep = prep
            .split(',')
            .map(str::parse::<PrepState>)
            .collect::<QptResult<Vec<PrepState>>>()?;
        Self::new(prep, meas.parse()?)
    }
}

// ============================================================================
// Records
// ============================================================================

/// One circuit's label with its outcome counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomographyRecord {
    /// Circuit setting
    pub label: TomographyLabel,

    /// Outcome counts, clbit j = target qubit j
    pub counts: Counts,
}

/// Ordered, paired tomography data
/// Gantree: TomographyResult // 토모그래피 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomographyResult {
    num_qubits: usize,
    records: Vec<TomographyRecord>,
}

impl TomographyResult {
    /// Create from records, checking label and bitstring widths
    pub fn new(num_qubits: usize, records: Vec<TomographyRecord>) -> QptResult<Self> {
        if num_qubits > tomography::MAX_TARGET_QUBITS {
            return Err(QptError::Config(format!(
                "{} target qubits exceeds the limit of {}",
                num_qubits,
                tomography::MAX_TARGET_QUBITS
            )));
        }
        for record in &records {
            if record.label.num_qubits() != num_qubits {
                return Err(QptError::DimensionMismatch {
                    expected: num_qubits,
                    found: record.label.num_qubits(),
                });
            }
            if let Some(width) = counts_width(&record.counts)? {
                if width != num_qubits {
                    return Err(QptError::DimensionMismatch {
                        expected: num_qubits,
                        found: width,
                    });
                }
            }
        }
        Ok(Self {
            num_qubits,
            records,
        })
    }

    /// Pair generated labels with job results
    ///
    /// Results must come back in submission order; a result carrying a
    /// circuit name different from its label is rejected.
    /// Gantree: from_execution(labels, results) -> Result<Self> // 결과 페어링
    pub fn from_execution(
        labels: &[TomographyLabel],
        results: &[ExecutionResult],
    ) -> QptResult<Self> {
        if labels.len() != results.len() {
            return Err(QptError::DimensionMismatch {
                expected: labels.len(),
                found: results.len(),
            });
        }
        let num_qubits = labels.first().map_or(0, TomographyLabel::num_qubits);

        let records = labels
            .iter()
            .zip(results)
            .enumerate()
            .map(|(i, (label, result))| {
                if let Some(name) = result.metadata.circuit_name.as_deref() {
                    let expected = label.to_string();
                    if name != expected {
                        return Err(QptError::BackendError(format!(
                            "result {} belongs to circuit '{}', expected '{}'",
                            i, name, expected
                        )));
                    }
                }
                Ok(TomographyRecord {
                    label: label.clone(),
                    counts: result.counts.clone(),
                })
            })
            .collect::<QptResult<Vec<_>>>()?;

        Self::new(num_qubits, records)
    }

    /// Number of target qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Records in order
    pub fn records(&self) -> &[TomographyRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records
    pub fn iter(&self) -> impl Iterator<Item = &TomographyRecord> {
        self.records.iter()
    }

    /// Total shots across all circuits
    pub fn total_shots(&self) -> u64 {
        self.records.iter().map(|r| total_counts(&r.counts)).sum()
    }

    /// New result with every histogram replaced, labels kept
    /// Gantree: map_counts(f) -> Result<Self> // 카운트 변환
    pub fn map_counts<F>(&self, mut f: F) -> QptResult<Self>
    where
        F: FnMut(&TomographyRecord) -> QptResult<Counts>,
    {
        let records = self
            .records
            .iter()
            .map(|r| {
                Ok(TomographyRecord {
                    label: r.label.clone(),
                    counts: f(r)?,
                })
            })
            .collect::<QptResult<Vec<_>>>()?;
        Ok(Self {
            num_qubits: self.num_qubits,
            records,
        })
    }

    /// Copy without the record at `index`
    pub fn without(&self, index: usize) -> Self {
        let mut records = self.records.clone();
        if index < records.len() {
            records.remove(index);
        }
        Self {
            num_qubits: self.num_qubits,
            records,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn label(s: &str) -> TomographyLabel {
        s.parse().unwrap()
    }

    #[test]
    fn test_label_display_roundtrip() {
        let l = label("(Zp,Xp,Yp)-ZXY");
        assert_eq!(l.prep, vec![PrepState::Zp, PrepState::Xp, PrepState::Yp]);
        assert_eq!(l.meas_bases(), vec![Basis::Z, Basis::X, Basis::Y]);
        assert_eq!(l.to_string(), "(Zp,Xp,Yp)-ZXY");
    }

    #[test]
    fn test_label_errors() {
        assert!("Zp-Z".parse::<TomographyLabel>().is_err());
        assert!("(Zp,Xp)-Z".parse::<TomographyLabel>().is_err());
        assert!("(Zq)-Z".parse::<TomographyLabel>().is_err());
    }

    #[test]
    fn test_from_execution_checks_names() {
        let labels = vec![label("(Zp)-X"), label("(Zm)-X")];
        let mut counts = Counts::new();
        counts.insert("0".into(), 10);
        let ok = vec![
            ExecutionResult::new(counts.clone(), 10, "sim").with_circuit_name(Some("(Zp)-X")),
            ExecutionResult::new(counts.clone(), 10, "sim"),
        ];
        let result = TomographyResult::from_execution(&labels, &ok).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.total_shots(), 20);

        let swapped = vec![
            ExecutionResult::new(counts.clone(), 10, "sim").with_circuit_name(Some("(Zm)-X")),
            ExecutionResult::new(counts.clone(), 10, "sim").with_circuit_name(Some("(Zp)-X")),
        ];
        assert!(matches!(
            TomographyResult::from_execution(&labels, &swapped),
            Err(QptError::BackendError(_))
        ));
        assert!(TomographyResult::from_execution(&labels, &ok[..1]).is_err());
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let mut counts = Counts::new();
        counts.insert("00".into(), 1);
        let record = TomographyRecord {
            label: label("(Zp)-Z"),
            counts,
        };
        assert!(matches!(
            TomographyResult::new(1, vec![record]),
            Err(QptError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_oversized_register_rejected() {
        assert!(matches!(
            TomographyResult::new(40, vec![]),
            Err(QptError::Config(_))
        ));
        assert!(TomographyResult::new(5, vec![]).is_ok());
    }

    #[test]
    fn test_map_counts_keeps_labels() {
        let mut counts = Counts::new();
        counts.insert("1".into(), 4);
        let result = TomographyResult::new(
            1,
            vec![TomographyRecord {
                label: label("(Xp)-Y"),
                counts,
            }],
        )
        .unwrap();
        let mapped = result.map_counts(|_| Ok(Counts::new())).unwrap();
        assert_eq!(mapped.records()[0].label, result.records()[0].label);
        assert!(mapped.records()[0].counts.is_empty());
        assert!(result.without(0).is_empty());
    }
}
