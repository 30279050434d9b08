//! Core types for QPT
//!
//! Gantree: L0_Foundation → CoreTypes
//!
//! Type aliases and validated wrapper types shared by every crate.
//! Bitstrings follow the cloud-service convention: qubit 0 is the
//! rightmost character.

use crate::error::{QptError, QptResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// Qubit identifier (0-indexed)
/// Gantree: QubitId // pub type QubitId = usize
pub type QubitId = usize;

/// Classical bit identifier (0-indexed)
pub type ClbitId = usize;

/// Rotation angle in radians
/// Gantree: Angle // pub type Angle = f64
pub type Angle = f64;

/// Measurement counts: bitstring -> count
///
/// Ordered so that iteration (and therefore seeded resampling) is
/// deterministic.
/// Gantree: Counts // pub type Counts = BTreeMap<String, u64>
pub type Counts = BTreeMap<String, u64>;

/// Parameter vector for variational circuits
/// Gantree: ParamVec // pub type ParamVec = Vec<f64>
pub type ParamVec = Vec<f64>;

/// Total number of shots recorded in a count map
pub fn total_counts(counts: &Counts) -> u64 {
    counts.values().sum()
}

/// Width shared by every key of a count map
///
/// Returns `None` for an empty map, `DimensionMismatch` when keys disagree.
pub fn counts_width(counts: &Counts) -> QptResult<Option<usize>> {
    let mut width = None;
    for key in counts.keys() {
        match width {
            None => width = Some(key.len()),
            Some(w) if w != key.len() => {
                return Err(QptError::DimensionMismatch {
                    expected: w,
                    found: key.len(),
                })
            }
            _ => {}
        }
    }
    Ok(width)
}

// ============================================================================
// Probability (Validated Wrapper)
// ============================================================================

/// Probability value in range [0, 1]
/// Gantree: Probability // 범위 검증 구조체
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probability(f64);

impl Probability {
    /// Create a new Probability with validation
    /// Gantree: new(f64) -> Result<Self> // 생성+검증
    pub fn new(value: f64) -> QptResult<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(QptError::InvalidProbability(value));
        }
        Ok(Self(value))
    }

    /// Get the probability value
    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Zero probability
    pub const ZERO: Self = Self(0.0);

    /// Certainty (p = 1)
    pub const ONE: Self = Self(1.0);
}

impl Default for Probability {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

impl TryFrom<f64> for Probability {
    type Error = QptError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// ============================================================================
// Bitstring
// ============================================================================

/// Measurement outcome label
///
/// Stored in qubit order (`bits[0]` is qubit 0), printed and parsed with
/// qubit 0 as the rightmost character.
/// Gantree: Bitstring // 비트열 타입
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bitstring {
    bits: Vec<bool>,
}

impl Bitstring {
    /// Create from bits in qubit order
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// Create from a count label (e.g., "0110", qubit 0 rightmost)
    /// Gantree: parse(s) -> Self // 파싱
    pub fn parse(s: &str) -> QptResult<Self> {
        let bits: Result<Vec<bool>, _> = s
            .chars()
            .rev()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(QptError::InvalidBitstring(s.to_string())),
            })
            .collect();
        Ok(Self { bits: bits? })
    }

    /// Create from the low `width` bits of an integer (bit k = qubit k)
    pub fn from_index(value: usize, width: usize) -> Self {
        Self {
            bits: (0..width).map(|k| (value >> k) & 1 == 1).collect(),
        }
    }

    /// Get the number of bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Get bit of qubit `index`
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    /// Convert to integer (qubit k is bit k)
    pub fn to_usize(&self) -> usize {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(|(i, _)| 1 << i)
            .sum()
    }
}

impl fmt::Display for Bitstring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.bits.iter().rev() {
            write!(f, "{}", if b { '1' } else { '0' })?;
        }
        Ok(())
    }
}

impl FromStr for Bitstring {
    type Err = QptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// MeasurementBasis
// ============================================================================

/// Measurement basis for a single qubit
/// Gantree: Basis // X/Y/Z
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Basis {
    /// X (Hadamard) basis
    X,
    /// Y basis
    Y,
    /// Z (computational) basis
    Z,
}

impl Basis {
    /// Bases in generation order
    pub const ALL: [Basis; 3] = [Basis::X, Basis::Y, Basis::Z];

    /// Parse from character
    pub fn from_char(c: char) -> QptResult<Self> {
        match c.to_ascii_uppercase() {
            'X' => Ok(Basis::X),
            'Y' => Ok(Basis::Y),
            'Z' => Ok(Basis::Z),
            _ => Err(QptError::InvalidBasis(c.to_string())),
        }
    }

    /// Convert to character
    pub fn to_char(&self) -> char {
        match self {
            Basis::X => 'X',
            Basis::Y => 'Y',
            Basis::Z => 'Z',
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Measurement basis string, one basis per target qubit in target order
/// (e.g. "ZXY": first target in Z)
/// Gantree: BasisString // 기저 문자열
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BasisString {
    bases: Vec<Basis>,
}

impl BasisString {
    /// Create from a list of bases
    pub fn new(bases: Vec<Basis>) -> Self {
        Self { bases }
    }

    /// Create uniform basis for n qubits
    pub fn uniform(basis: Basis, n: usize) -> Self {
        Self {
            bases: vec![basis; n],
        }
    }

    /// Get length
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Get basis at index
    pub fn get(&self, index: usize) -> Option<Basis> {
        self.bases.get(index).copied()
    }

    /// Iterate over bases
    pub fn iter(&self) -> impl Iterator<Item = &Basis> {
        self.bases.iter()
    }
}

impl FromStr for BasisString {
    type Err = QptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bases: Result<Vec<Basis>, _> = s.chars().map(Basis::from_char).collect();
        Ok(Self { bases: bases? })
    }
}

impl fmt::Display for BasisString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.bases {
            write!(f, "{}", b.to_char())?;
        }
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
    fn test_probability_valid() {
        assert!(Probability::new(0.0).is_ok());
        assert!(Probability::new(1.0).is_ok());
        assert!(Probability::new(-0.1).is_err());
        assert!(Probability::new(1.1).is_err());
    }

    #[test]
    fn test_bitstring_qubit_zero_is_rightmost() {
        let bs = Bitstring::parse("001").unwrap();
        assert_eq!(bs.get(0), Some(true));
        assert_eq!(bs.get(2), Some(false));
        assert_eq!(bs.to_usize(), 1);
        assert_eq!(bs.to_string(), "001");
    }

    #[test]
    fn test_bitstring_from_index() {
        let bs = Bitstring::from_index(6, 3);
        assert_eq!(bs.to_string(), "110");
    }

    #[test]
    fn test_bitstring_invalid() {
        assert!(matches!(
            Bitstring::parse("01a"),
            Err(QptError::InvalidBitstring(_))
        ));
    }

    #[test]
    fn test_basis_string() {
        let bs: BasisString = "XYZ".parse().unwrap();
        assert_eq!(bs.len(), 3);
        assert_eq!(bs.get(0), Some(Basis::X));
        assert_eq!(bs.get(2), Some(Basis::Z));
        assert_eq!(bs.to_string(), "XYZ");
        assert!("XQZ".parse::<BasisString>().is_err());
    }

    #[test]
    fn test_counts_width() {
        let mut counts = Counts::new();
        assert_eq!(counts_width(&counts).unwrap(), None);
        counts.insert("00".into(), 3);
        counts.insert("11".into(), 5);
        assert_eq!(counts_width(&counts).unwrap(), Some(2));
        assert_eq!(total_counts(&counts), 8);
        counts.insert("1".into(), 1);
        assert!(counts_width(&counts).is_err());
    }
}
