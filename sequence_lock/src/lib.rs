//! # sequence_lock
//!
//! The unlock state machine.  Stable digits arrive one at a time; the
//! machine keeps the attempt entered so far and checks it against a secret
//! [`TargetSequence`] after every digit.
//!
//! ## States
//!
//! | State | Meaning | Leaves on |
//! |---|---|---|
//! | `Idle` | nothing entered | first correct digit → `Partial`; wrong digit stays `Idle` |
//! | `Partial` | attempt is a proper prefix of the target | completion → `Succeeded`; mismatch → `Idle` |
//! | `Succeeded` | door opened, input ignored | cool-down elapsed → `Idle` |
//!
//! A failed attempt is transient: the machine reports
//! [`Outcome::Failure`] and is already back in `Idle` when the call
//! returns.  Digits arriving after `timeout` of silence start a fresh
//! attempt instead of extending the stale one.
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use sequence_lock::{Outcome, SequenceMachine, TargetSequence};
//!
//! let target: TargetSequence = "0,1,0,5".parse().unwrap();
//! let mut lock = SequenceMachine::new(target, Duration::from_secs(5), Duration::from_secs(3));
//! let t0 = Instant::now();
//!
//! for (i, v) in [0u8, 1, 0].into_iter().enumerate() {
//!     let d = finger_stream::Digit::new(v).unwrap();
//!     let step = lock.accept(d, t0 + Duration::from_millis(500 * i as u64));
//!     assert!(matches!(step.outcome, Outcome::Partial { .. }));
//! }
//! let five = finger_stream::Digit::new(5).unwrap();
//! assert_eq!(lock.accept(five, t0 + Duration::from_secs(2)).outcome, Outcome::Success);
//! assert!(lock.attempted().is_empty());
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use finger_stream::{Digit, DigitError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// TargetSequence
// ════════════════════════════════════════════════════════════════════════════

/// The secret digit sequence.  Never empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Digit>", into = "Vec<Digit>")]
pub struct TargetSequence(Vec<Digit>);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("target sequence must contain at least one digit")]
    Empty,
    #[error("bad digit in target sequence: {0}")]
    Digit(#[from] DigitError),
}

impl TargetSequence {
    pub fn new(digits: Vec<Digit>) -> Result<Self, TargetError> {
        if digits.is_empty() {
            return Err(TargetError::Empty);
        }
        Ok(TargetSequence(digits))
    }

    /// `first` followed by `rest`; never empty, so it cannot fail.
    pub fn starting_with(first: Digit, rest: impl IntoIterator<Item = Digit>) -> Self {
        let mut digits = vec![first];
        digits.extend(rest);
        TargetSequence(digits)
    }

    pub fn digits(&self) -> &[Digit] { &self.0 }
    pub fn len(&self) -> usize       { self.0.len() }
    pub fn is_empty(&self) -> bool   { self.0.is_empty() }
}

impl TryFrom<Vec<Digit>> for TargetSequence {
    type Error = TargetError;
    fn try_from(v: Vec<Digit>) -> Result<Self, Self::Error> { TargetSequence::new(v) }
}

impl From<TargetSequence> for Vec<Digit> {
    fn from(t: TargetSequence) -> Vec<Digit> { t.0 }
}

/// Parses `"0,1,0,5"`, `"0 1 0 5"` or `"0105"`.
impl FromStr for TargetSequence {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = if s.contains(',') || s.contains(char::is_whitespace) {
            s.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|p| !p.is_empty())
                .map(str::parse)
                .collect::<Result<Vec<Digit>, _>>()?
        } else {
            s.chars()
                .map(|c| c.to_string().parse())
                .collect::<Result<Vec<Digit>, _>>()?
        };
        TargetSequence::new(digits)
    }
}

impl fmt::Display for TargetSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_digits(&self.0))
    }
}

/// `[0, 1, 0, 5]` style rendering used in logs and summaries.
pub fn format_digits(digits: &[Digit]) -> String {
    let parts: Vec<String> = digits.iter().map(Digit::to_string).collect();
    format!("[{}]", parts.join(", "))
}

// ════════════════════════════════════════════════════════════════════════════
// Outcomes
// ════════════════════════════════════════════════════════════════════════════

/// Why an attempt was thrown away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mismatch {
    /// More digits than the target holds.
    TooLong { length: usize },
    /// Digit at `position` is not the one the target expects there.
    WrongDigit { position: usize, expected: Digit, got: Digit },
}

/// Result of feeding one digit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Attempt is still a valid prefix; `remaining` digits to go.
    Partial { entered: usize, remaining: usize },
    /// Attempt matched the whole target.
    Success,
    /// Attempt did not match and was cleared.
    Failure(Mismatch),
    /// Machine is in its post-success cool-down; the digit was dropped.
    CoolingDown,
}

/// Everything that happened while accepting one digit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    /// A stale partial attempt was discarded before this digit was applied.
    pub timed_out: bool,
    pub outcome:   Outcome,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockState {
    Idle,
    Partial,
    Succeeded { until: Instant },
}

// ════════════════════════════════════════════════════════════════════════════
// SequenceMachine
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct SequenceMachine {
    target:     TargetSequence,
    attempted:  Vec<Digit>,
    timeout:    Duration,
    cooldown:   Duration,
    last_input: Option<Instant>,
    state:      LockState,
}

impl SequenceMachine {
    pub fn new(target: TargetSequence, timeout: Duration, cooldown: Duration) -> Self {
        SequenceMachine {
            attempted:  Vec::with_capacity(target.len()),
            target,
            timeout,
            cooldown,
            last_input: None,
            state:      LockState::Idle,
        }
    }

    /// Apply one stable digit at time `now`.
    pub fn accept(&mut self, digit: Digit, now: Instant) -> Step {
        self.tick(now);
        if let LockState::Succeeded { .. } = self.state {
            return Step { timed_out: false, outcome: Outcome::CoolingDown };
        }

        let timed_out = self.expire_stale(now);
        self.last_input = Some(now);

        let position   = self.attempted.len();
        let target_len = self.target.len();

        let expected = match self.target.digits().get(position) {
            Some(&e) => e,
            None => {
                self.reset();
                let mismatch = Mismatch::TooLong { length: position + 1 };
                return Step { timed_out, outcome: Outcome::Failure(mismatch) };
            }
        };
        if expected != digit {
            self.reset();
            let mismatch = Mismatch::WrongDigit { position, expected, got: digit };
            return Step { timed_out, outcome: Outcome::Failure(mismatch) };
        }

        self.attempted.push(digit);

        if self.attempted.len() == target_len {
            self.reset();
            self.state = LockState::Succeeded { until: now + self.cooldown };
            return Step { timed_out, outcome: Outcome::Success };
        }

        self.state = LockState::Partial;
        Step {
            timed_out,
            outcome: Outcome::Partial {
                entered:   self.attempted.len(),
                remaining: target_len - self.attempted.len(),
            },
        }
    }

    /// End the success cool-down once it has elapsed.  Returns true on the
    /// call that moves the machine back to `Idle`.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.state {
            LockState::Succeeded { until } if now >= until => {
                self.state = LockState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Discard a partial attempt that has been idle longer than `timeout`.
    fn expire_stale(&mut self, now: Instant) -> bool {
        let stale = match self.last_input {
            Some(t) => now.saturating_duration_since(t) > self.timeout,
            None    => false,
        };
        if stale && !self.attempted.is_empty() {
            self.reset();
            return true;
        }
        false
    }

    fn reset(&mut self) {
        self.attempted.clear();
        self.last_input = None;
        self.state = LockState::Idle;
    }

    pub fn attempted(&self)  -> &[Digit]          { &self.attempted }
    pub fn target(&self)     -> &TargetSequence   { &self.target }
    pub fn state(&self)      -> LockState         { self.state }
    pub fn timeout(&self)    -> Duration          { self.timeout }

    pub fn is_cooling_down(&self) -> bool {
        matches!(self.state, LockState::Succeeded { .. })
    }

    /// Digits still needed to complete the current attempt.
    pub fn remaining(&self) -> usize {
        self.target.len() - self.attempted.len()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT:  Duration = Duration::from_secs(5);
    const COOLDOWN: Duration = Duration::from_secs(3);

    fn d(v: u8) -> Digit { Digit::new(v).unwrap() }

    fn machine() -> SequenceMachine {
        SequenceMachine::new("0,1,0,5".parse().unwrap(), TIMEOUT, COOLDOWN)
    }

    /// Feed digits one second apart starting at `start`.
    fn feed(m: &mut SequenceMachine, start: Instant, digits: &[u8]) -> Vec<Step> {
        digits.iter().enumerate()
            .map(|(i, &v)| m.accept(d(v), start + Duration::from_secs(i as u64)))
            .collect()
    }

    // ── TargetSequence ───────────────────────────────────────────────────
    #[test]
    fn target_parses_common_forms() {
        let a: TargetSequence = "0,1,0,5".parse().unwrap();
        let b: TargetSequence = "0 1 0 5".parse().unwrap();
        let c: TargetSequence = "0105".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.to_string(), "[0, 1, 0, 5]");
    }

    #[test]
    fn target_rejects_empty_and_bad_digits() {
        assert_eq!("".parse::<TargetSequence>(), Err(TargetError::Empty));
        assert!(matches!("1,9".parse::<TargetSequence>(), Err(TargetError::Digit(_))));
    }

    #[test]
    fn target_starting_with_is_never_empty() {
        let lone = TargetSequence::starting_with(d(4), []);
        assert_eq!(lone.digits(), &[d(4)]);
        assert!(!lone.is_empty());

        let full = TargetSequence::starting_with(d(0), [d(1), d(0), d(5)]);
        assert_eq!(full, "0,1,0,5".parse::<TargetSequence>().unwrap());
    }

    // ── matching ─────────────────────────────────────────────────────────
    #[test]
    fn full_sequence_succeeds_once() {
        let mut m = machine();
        let steps = feed(&mut m, Instant::now(), &[0, 1, 0, 5]);
        let successes = steps.iter().filter(|s| s.outcome == Outcome::Success).count();
        assert_eq!(successes, 1);
        assert!(m.attempted().is_empty());
        assert!(m.is_cooling_down());
    }

    #[test]
    fn partial_reports_remaining() {
        let mut m = machine();
        let steps = feed(&mut m, Instant::now(), &[0, 1]);
        assert_eq!(steps[1].outcome, Outcome::Partial { entered: 2, remaining: 2 });
        assert_eq!(m.state(), LockState::Partial);
        assert_eq!(m.remaining(), 2);
    }

    #[test]
    fn wrong_digit_fails_and_clears() {
        let mut m = machine();
        let steps = feed(&mut m, Instant::now(), &[0, 1, 2]);
        assert_eq!(
            steps[2].outcome,
            Outcome::Failure(Mismatch::WrongDigit { position: 2, expected: d(0), got: d(2) })
        );
        assert!(m.attempted().is_empty());
        assert_eq!(m.state(), LockState::Idle);
    }

    #[test]
    fn wrong_first_digit_fails_from_idle() {
        let mut m = machine();
        let step = m.accept(d(3), Instant::now());
        assert!(matches!(step.outcome, Outcome::Failure(Mismatch::WrongDigit { position: 0, .. })));
        assert_eq!(m.state(), LockState::Idle);
    }

    #[test]
    fn attempt_never_longer_than_target() {
        let mut m = machine();
        let t0 = Instant::now();
        for (i, v) in [0, 1, 0, 4, 0, 1, 0, 5, 1, 1, 2].into_iter().enumerate() {
            m.accept(d(v), t0 + Duration::from_secs(i as u64 * 4));
            assert!(m.attempted().len() <= m.target().len());
        }
    }

    // ── timeout ──────────────────────────────────────────────────────────
    #[test]
    fn stale_partial_is_dropped() {
        let mut m = machine();
        let t0 = Instant::now();
        feed(&mut m, t0, &[0, 1]);

        let later = t0 + Duration::from_secs(1) + TIMEOUT + Duration::from_millis(1);
        let steps = feed(&mut m, later, &[0, 1, 0, 5]);
        assert!(steps[0].timed_out);
        assert_eq!(steps[0].outcome, Outcome::Partial { entered: 1, remaining: 3 });
        assert_eq!(steps[3].outcome, Outcome::Success);
    }

    #[test]
    fn exactly_timeout_is_not_stale() {
        let mut m = machine();
        let t0 = Instant::now();
        m.accept(d(0), t0);
        let step = m.accept(d(1), t0 + TIMEOUT);
        assert!(!step.timed_out);
        assert_eq!(step.outcome, Outcome::Partial { entered: 2, remaining: 2 });
    }

    #[test]
    fn no_timeout_flag_after_failure() {
        let mut m = machine();
        let t0 = Instant::now();
        feed(&mut m, t0, &[0, 3]);
        let step = m.accept(d(0), t0 + TIMEOUT * 3);
        assert!(!step.timed_out);
        assert_eq!(step.outcome, Outcome::Partial { entered: 1, remaining: 3 });
    }

    // ── cool-down ────────────────────────────────────────────────────────
    #[test]
    fn cooldown_drops_input_then_returns_to_idle() {
        let mut m = machine();
        let t0 = Instant::now();
        feed(&mut m, t0, &[0, 1, 0, 5]);
        let done = t0 + Duration::from_secs(3);

        let step = m.accept(d(0), done + Duration::from_secs(1));
        assert_eq!(step.outcome, Outcome::CoolingDown);
        assert!(m.attempted().is_empty());

        assert!(!m.tick(done + COOLDOWN - Duration::from_millis(1)));
        assert!(m.tick(done + COOLDOWN));
        assert_eq!(m.state(), LockState::Idle);
        assert!(!m.tick(done + COOLDOWN));
    }

    #[test]
    fn accept_after_cooldown_starts_fresh() {
        let mut m = machine();
        let t0 = Instant::now();
        feed(&mut m, t0, &[0, 1, 0, 5]);
        let step = m.accept(d(0), t0 + Duration::from_secs(60));
        assert_eq!(step.outcome, Outcome::Partial { entered: 1, remaining: 3 });
    }

    #[test]
    fn single_digit_target() {
        let mut m = SequenceMachine::new("4".parse().unwrap(), TIMEOUT, COOLDOWN);
        assert_eq!(m.accept(d(4), Instant::now()).outcome, Outcome::Success);
    }
}
