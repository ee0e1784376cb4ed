//! Per-run counters and the summary printed at shutdown.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use finger_stream::Digit;
use sequence_lock::format_digits;

#[derive(Debug, Clone)]
pub struct SessionStats {
    started:            Instant,
    started_at:         DateTime<Local>,
    pub frames:         u64,
    pub symbol_changes: u64,
    pub unlocks:        u64,
    pub failures:       u64,
    pub timeouts:       u64,
    pub door_opened:    bool,
}

impl SessionStats {
    pub fn start(now: Instant) -> Self {
        SessionStats {
            started:        now,
            started_at:     Local::now(),
            frames:         0,
            symbol_changes: 0,
            unlocks:        0,
            failures:       0,
            timeouts:       0,
            door_opened:    false,
        }
    }

    pub fn summarize(&self, now: Instant, unfinished: &[Digit]) -> SessionSummary {
        SessionSummary {
            started_at:     self.started_at,
            duration:       now.saturating_duration_since(self.started),
            frames:         self.frames,
            symbol_changes: self.symbol_changes,
            unlocks:        self.unlocks,
            failures:       self.failures,
            timeouts:       self.timeouts,
            door_opened:    self.door_opened,
            unfinished:     unfinished.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub started_at:     DateTime<Local>,
    pub duration:       Duration,
    pub frames:         u64,
    pub symbol_changes: u64,
    pub unlocks:        u64,
    pub failures:       u64,
    pub timeouts:       u64,
    pub door_opened:    bool,
    /// Partial attempt still in progress at shutdown.
    pub unfinished:     Vec<Digit>,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bar = "═".repeat(50);
        writeln!(f, "{bar}")?;
        writeln!(f, "  Session summary")?;
        writeln!(f, "{bar}")?;
        writeln!(f, "  Started:         {}", self.started_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "  Duration:        {:.1} s", self.duration.as_secs_f64())?;
        writeln!(f, "  Frames:          {}", self.frames)?;
        writeln!(f, "  Symbol changes:  {}", self.symbol_changes)?;
        writeln!(f, "  Unlocks:         {}", self.unlocks)?;
        writeln!(f, "  Failed attempts: {}", self.failures)?;
        writeln!(f, "  Timeouts:        {}", self.timeouts)?;
        writeln!(f, "  Door opened:     {}", if self.door_opened { "yes" } else { "no" })?;
        if !self.unfinished.is_empty() {
            writeln!(f, "  Unfinished:      {}", format_digits(&self.unfinished))?;
        }
        write!(f, "{bar}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reports_counters() {
        let t0 = Instant::now();
        let mut stats = SessionStats::start(t0);
        stats.symbol_changes = 7;
        stats.unlocks = 1;
        stats.door_opened = true;

        let s = stats.summarize(t0 + Duration::from_secs(12), &[]);
        assert_eq!(s.duration, Duration::from_secs(12));
        let text = s.to_string();
        assert!(text.contains("Symbol changes:  7"));
        assert!(text.contains("Door opened:     yes"));
        assert!(text.contains("12.0 s"));
        assert!(!text.contains("Unfinished"));
    }

    #[test]
    fn summary_lists_unfinished_attempt() {
        let t0 = Instant::now();
        let s = SessionStats::start(t0).summarize(t0, &[Digit::ZERO, Digit::FIVE]);
        assert!(s.to_string().contains("Unfinished:      [0, 5]"));
        assert!(s.to_string().contains("Door opened:     no"));
    }
}
