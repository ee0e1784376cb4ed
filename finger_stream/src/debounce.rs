//! Majority-vote debouncing of per-frame finger counts.
//!
//! The buffer keeps the last `capacity` digits; the vote only looks at the
//! newest `window` of them.  A vote that differs from the recorded stable
//! symbol is the one and only way a [`SymbolChange`] is produced.

use std::collections::VecDeque;

use crate::digit::{Digit, Observation};

// ════════════════════════════════════════════════════════════════════════════
// ObservationBuffer
// ════════════════════════════════════════════════════════════════════════════

/// Fixed-capacity history of recent digits, oldest first.
#[derive(Clone, Debug)]
pub struct ObservationBuffer {
    digits:   VecDeque<Digit>,
    capacity: usize,
}

impl ObservationBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        ObservationBuffer { digits: VecDeque::with_capacity(capacity), capacity }
    }

    /// Append `d`, evicting the oldest entry when full.
    pub fn push(&mut self, d: Digit) {
        if self.digits.len() == self.capacity {
            self.digits.pop_front();
        }
        self.digits.push_back(d);
    }

    /// The newest `n` digits, oldest → newest.  Shorter if fewer are held.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = Digit> + '_ {
        let skip = self.digits.len().saturating_sub(n);
        self.digits.iter().skip(skip).copied()
    }

    pub fn clear(&mut self)             { self.digits.clear(); }
    pub fn len(&self)      -> usize     { self.digits.len() }
    pub fn is_empty(&self) -> bool      { self.digits.is_empty() }
    pub fn capacity(&self) -> usize     { self.capacity }
}

/// Most frequent digit in `window`.
///
/// Ties go to the value seen first when scanning oldest → newest.
/// Returns `None` only for an empty window.
pub fn majority<I: IntoIterator<Item = Digit>>(window: I) -> Option<Digit> {
    let window: Vec<Digit> = window.into_iter().collect();
    let mut best: Option<(Digit, usize)> = None;

    for (i, &d) in window.iter().enumerate() {
        if window[..i].contains(&d) {
            continue;
        }
        let count = window.iter().filter(|&&x| x == d).count();
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((d, count));
        }
    }
    best.map(|(d, _)| d)
}

// ════════════════════════════════════════════════════════════════════════════
// Events
// ════════════════════════════════════════════════════════════════════════════

/// The stable symbol moved to a new digit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbolChange {
    /// Previous stable symbol; `None` after a reset or at start-up.
    pub old: Option<Digit>,
    pub new: Digit,
}

/// Something the recognizer needs to react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassifierEvent {
    /// Majority settled on a different digit.
    Changed(SymbolChange),
    /// History was wiped because the hand left; `previous` was the stable
    /// symbol at that moment.
    Cleared { previous: Option<Digit> },
}

// ════════════════════════════════════════════════════════════════════════════
// DebouncedClassifier
// ════════════════════════════════════════════════════════════════════════════

/// Turns a flickering per-frame digit stream into rare, stable changes.
#[derive(Clone, Debug)]
pub struct DebouncedClassifier {
    buffer: ObservationBuffer,
    window: usize,
    stable: Option<Digit>,
}

impl DebouncedClassifier {
    /// `window` is clamped into `1..=buffer_size`.
    pub fn new(buffer_size: usize, window: usize) -> Self {
        let buffer = ObservationBuffer::new(buffer_size);
        let window = window.clamp(1, buffer.capacity());
        DebouncedClassifier { buffer, window, stable: None }
    }

    /// Feed one frame.
    ///
    /// A digit is appended and voted on; nothing is decided until `window`
    /// frames have accumulated.  An absent hand clears the history at once.
    pub fn observe(&mut self, obs: Observation) -> Option<ClassifierEvent> {
        match obs {
            Observation::Absent     => self.clear(),
            Observation::Fingers(d) => self.push(d).map(ClassifierEvent::Changed),
        }
    }

    fn push(&mut self, d: Digit) -> Option<SymbolChange> {
        self.buffer.push(d);
        if self.buffer.len() < self.window {
            return None;
        }

        let mode = majority(self.buffer.recent(self.window))?;
        if Some(mode) == self.stable {
            return None;
        }

        let change = SymbolChange { old: self.stable, new: mode };
        self.stable = Some(mode);
        Some(change)
    }

    /// Drop all history and return the stable symbol to "none".
    ///
    /// Returns `None` when there was nothing to clear.
    pub fn clear(&mut self) -> Option<ClassifierEvent> {
        if self.buffer.is_empty() && self.stable.is_none() {
            return None;
        }
        let previous = self.stable.take();
        self.buffer.clear();
        Some(ClassifierEvent::Cleared { previous })
    }

    pub fn stable(&self)   -> Option<Digit>       { self.stable }
    pub fn window(&self)   -> usize               { self.window }
    pub fn buffer(&self)   -> &ObservationBuffer  { &self.buffer }
}

impl Default for DebouncedClassifier {
    fn default() -> Self {
        DebouncedClassifier::new(crate::DEFAULT_BUFFER_SIZE, crate::DEFAULT_WINDOW)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: u8) -> Digit { Digit::new(v).unwrap() }

    fn feed(c: &mut DebouncedClassifier, digits: &[u8]) -> Vec<SymbolChange> {
        digits.iter()
            .filter_map(|&v| match c.observe(Observation::Fingers(d(v))) {
                Some(ClassifierEvent::Changed(ch)) => Some(ch),
                _ => None,
            })
            .collect()
    }

    // ── ObservationBuffer ────────────────────────────────────────────────
    #[test]
    fn buffer_evicts_oldest() {
        let mut b = ObservationBuffer::new(3);
        for v in 0..5 { b.push(d(v)); }
        assert_eq!(b.len(), 3);
        let held: Vec<u8> = b.recent(3).map(Digit::value).collect();
        assert_eq!(held, vec![2, 3, 4]);
    }

    #[test]
    fn buffer_recent_is_newest_slice() {
        let mut b = ObservationBuffer::new(10);
        for v in [1, 2, 3, 4] { b.push(d(v)); }
        let tail: Vec<u8> = b.recent(2).map(Digit::value).collect();
        assert_eq!(tail, vec![3, 4]);
        assert_eq!(b.recent(99).count(), 4);
    }

    // ── majority ─────────────────────────────────────────────────────────
    #[test]
    fn majority_picks_most_frequent() {
        assert_eq!(majority([d(1), d(3), d(3), d(2), d(3)]), Some(d(3)));
    }

    #[test]
    fn majority_tie_goes_to_first_seen() {
        assert_eq!(majority([d(4), d(2), d(2), d(4), d(0)]), Some(d(4)));
        assert_eq!(majority([d(2), d(4), d(4), d(2), d(0)]), Some(d(2)));
    }

    #[test]
    fn majority_of_nothing() {
        assert_eq!(majority(Vec::new()), None);
    }

    // ── DebouncedClassifier ──────────────────────────────────────────────
    #[test]
    fn silent_until_window_fills() {
        let mut c = DebouncedClassifier::new(10, 5);
        assert!(feed(&mut c, &[3, 3, 3, 3]).is_empty());
        assert_eq!(c.stable(), None);
    }

    #[test]
    fn steady_digit_reports_once() {
        let mut c = DebouncedClassifier::new(10, 5);
        let changes = feed(&mut c, &[2; 20]);
        assert_eq!(changes, vec![SymbolChange { old: None, new: d(2) }]);
    }

    #[test]
    fn change_needs_a_majority() {
        let mut c = DebouncedClassifier::new(10, 5);
        feed(&mut c, &[0; 6]);
        // two frames of 1 are outvoted, the third flips it
        assert!(feed(&mut c, &[1, 1]).is_empty());
        let changes = feed(&mut c, &[1]);
        assert_eq!(changes, vec![SymbolChange { old: Some(d(0)), new: d(1) }]);
    }

    #[test]
    fn single_frame_glitch_is_ignored() {
        let mut c = DebouncedClassifier::new(10, 5);
        feed(&mut c, &[4; 6]);
        assert!(feed(&mut c, &[1, 4, 4, 4, 4]).is_empty());
        assert_eq!(c.stable(), Some(d(4)));
    }

    #[test]
    fn absence_clears_at_once() {
        let mut c = DebouncedClassifier::new(10, 5);
        feed(&mut c, &[5; 7]);
        let ev = c.observe(Observation::Absent);
        assert_eq!(ev, Some(ClassifierEvent::Cleared { previous: Some(d(5)) }));
        assert!(c.buffer().is_empty());
        assert_eq!(c.stable(), None);
        // nothing left to clear
        assert_eq!(c.observe(Observation::Absent), None);
    }

    #[test]
    fn same_digit_after_absence_reports_again() {
        let mut c = DebouncedClassifier::new(10, 5);
        feed(&mut c, &[1; 5]);
        c.observe(Observation::Absent);
        let changes = feed(&mut c, &[1; 5]);
        assert_eq!(changes, vec![SymbolChange { old: None, new: d(1) }]);
    }

    #[test]
    fn window_clamped_to_buffer() {
        let c = DebouncedClassifier::new(3, 8);
        assert_eq!(c.window(), 3);
        let c = DebouncedClassifier::new(3, 0);
        assert_eq!(c.window(), 1);
    }
}
