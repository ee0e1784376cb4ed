//! The gesture alphabet: finger counts 0–5 and the per-frame observation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest finger count a single hand can show.
pub const MAX_DIGIT: u8 = 5;

// ════════════════════════════════════════════════════════════════════════════
// Digit
// ════════════════════════════════════════════════════════════════════════════

/// A finger count in `0..=MAX_DIGIT`.
///
/// Construction is checked, so a `Digit` held anywhere in the system is
/// always a count a hand can actually show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Digit(u8);

/// Rejected digit values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigitError {
    #[error("finger count {0} is out of range (0–{max})", max = MAX_DIGIT)]
    OutOfRange(u8),
    #[error("not a finger count: {0:?}")]
    NotANumber(String),
}

impl Digit {
    pub const ZERO: Digit = Digit(0);
    pub const FIVE: Digit = Digit(MAX_DIGIT);

    /// `None` when `value > MAX_DIGIT`.
    pub const fn new(value: u8) -> Option<Self> {
        if value <= MAX_DIGIT { Some(Digit(value)) } else { None }
    }

    pub const fn value(self) -> u8 { self.0 }

    /// Every digit, ascending.
    pub fn all() -> impl Iterator<Item = Digit> {
        (0..=MAX_DIGIT).map(Digit)
    }
}

impl TryFrom<u8> for Digit {
    type Error = DigitError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Digit::new(value).ok_or(DigitError::OutOfRange(value))
    }
}

impl From<Digit> for u8 {
    fn from(d: Digit) -> u8 { d.0 }
}

impl FromStr for Digit {
    type Err = DigitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let v: u8 = s.parse().map_err(|_| DigitError::NotANumber(s.to_string()))?;
        Digit::try_from(v)
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Observation: one camera frame's worth of input
// ════════════════════════════════════════════════════════════════════════════

/// What the hand tracker saw in a single frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observation {
    /// No hand in view.
    Absent,
    /// A hand showing this many fingers.
    Fingers(Digit),
}

impl Observation {
    pub fn digit(self) -> Option<Digit> {
        match self {
            Observation::Absent     => None,
            Observation::Fingers(d) => Some(d),
        }
    }

    pub fn is_present(self) -> bool {
        matches!(self, Observation::Fingers(_))
    }
}

impl From<Option<Digit>> for Observation {
    fn from(d: Option<Digit>) -> Self {
        d.map_or(Observation::Absent, Observation::Fingers)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
