//! The four ring patterns and the animator that picks between them.
//!
//! Everything here is deterministic: the animator's only inputs are the
//! snapshot, its own counters (chase position, flash progress) and the
//! clock value passed in by the caller.

use std::time::Duration;

use finger_stream::Digit;

use crate::color::{finger_color, CHASE_COLOR, SEQUENCE_COLOR, SUCCESS_COLOR};
use crate::display::{DisplaySnapshot, DisplayState};
use crate::frame::RingFrame;

/// Length of the idle chase tail, head included.
pub const CHASE_TAIL: usize = 8;

// ════════════════════════════════════════════════════════════════════════════
// Configuration
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RingGeometry {
    pub led_count:  usize,
    /// Sequence blocks are `led_count / max_digits` wide.
    pub max_digits: usize,
}

impl Default for RingGeometry {
    fn default() -> Self {
        RingGeometry { led_count: crate::DEFAULT_LED_COUNT, max_digits: crate::DEFAULT_MAX_DIGITS }
    }
}

/// How long each pattern's frame is held before the next tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cadence {
    pub idle:     Duration,
    pub digit:    Duration,
    pub sequence: Duration,
    pub flash:    Duration,
}

impl Default for Cadence {
    fn default() -> Self {
        Cadence {
            idle:     Duration::from_millis(100),
            digit:    Duration::from_millis(50),
            sequence: Duration::from_millis(100),
            flash:    Duration::from_millis(200),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Rendered output
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pattern {
    Chase,
    Digit,
    Sequence,
    FlashOn,
    FlashOff,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedFrame {
    pub frame:   RingFrame,
    pub pattern: Pattern,
    /// Time to wait before rendering again.
    pub hold:    Duration,
}

// ════════════════════════════════════════════════════════════════════════════
// Animator
// ════════════════════════════════════════════════════════════════════════════

/// Renderer-side animation state.  Owned by the render loop only.
#[derive(Clone, Debug)]
pub struct Animator {
    geometry:         RingGeometry,
    cadence:          Cadence,
    chase_position:   usize,
    flash_generation: Option<u64>,
    flash_count:      u8,
}

impl Animator {
    pub fn new(geometry: RingGeometry, cadence: Cadence) -> Self {
        Animator {
            geometry,
            cadence,
            chase_position:   0,
            flash_generation: None,
            flash_count:      0,
        }
    }

    pub fn geometry(&self) -> RingGeometry { self.geometry }

    /// Render one tick of `snap`.  `clock` is time since the render loop
    /// started and drives the rotating digit patterns.
    pub fn render(&mut self, snap: &DisplaySnapshot, clock: Duration) -> RenderedFrame {
        match &snap.state {
            DisplayState::Idle => self.chase(),
            DisplayState::ShowingDigit(d) => RenderedFrame {
                frame:   digit_frame(*d, self.geometry.led_count, clock),
                pattern: Pattern::Digit,
                hold:    self.cadence.digit,
            },
            DisplayState::ShowingSequence(seq) => RenderedFrame {
                frame:   sequence_frame(seq.len(), self.geometry),
                pattern: Pattern::Sequence,
                hold:    self.cadence.sequence,
            },
            DisplayState::SuccessFlash { flashes } => self.flash(snap.generation, *flashes),
        }
    }

    fn chase(&mut self) -> RenderedFrame {
        let n = self.geometry.led_count;
        let frame = chase_frame(self.chase_position, n);
        self.chase_position = if n == 0 { 0 } else { (self.chase_position + 1) % n };
        RenderedFrame { frame, pattern: Pattern::Chase, hold: self.cadence.idle }
    }

    /// Even flash frames are lit, odd ones dark.  Progress restarts whenever
    /// a new success snapshot (new generation) shows up.
    fn flash(&mut self, generation: u64, flashes: u8) -> RenderedFrame {
        if self.flash_generation != Some(generation) {
            self.flash_generation = Some(generation);
            self.flash_count = 0;
        }
        if self.flash_count >= flashes {
            return self.chase();
        }

        let n = self.geometry.led_count;
        let lit = self.flash_count % 2 == 0;
        self.flash_count += 1;
        RenderedFrame {
            frame:   if lit { RingFrame::filled(n, SUCCESS_COLOR) } else { RingFrame::dark(n) },
            pattern: if lit { Pattern::FlashOn } else { Pattern::FlashOff },
            hold:    self.cadence.flash,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Pattern routines
// ════════════════════════════════════════════════════════════════════════════

/// Arc of [`CHASE_TAIL`] LEDs ending at `head`, brightest at the head.
pub fn chase_frame(head: usize, n: usize) -> RingFrame {
    let mut frame = RingFrame::dark(n);
    if n == 0 { return frame; }

    for i in 0..CHASE_TAIL.min(n) {
        let pos = (head % n + n - i) % n;
        let intensity = (CHASE_TAIL - i) as f32 / CHASE_TAIL as f32;
        frame.set(pos, CHASE_COLOR.scaled(intensity));
    }
    frame
}

/// Finger-count pattern.
///
/// * 0: every LED lit
/// * 1: one 4-LED window rotating at 2 LEDs/s
/// * 2: two opposite 3-LED windows rotating at 1.5 LEDs/s
/// * 3+: `d` evenly spaced static regions
pub fn digit_frame(d: Digit, n: usize, clock: Duration) -> RingFrame {
    let color = finger_color(d);
    if n == 0 { return RingFrame::dark(0); }

    let t = clock.as_secs_f64();
    let mut frame = RingFrame::dark(n);

    match d.value() {
        0 => return RingFrame::filled(n, color),
        1 => {
            let base = (t * 2.0) as usize % n;
            for i in 0..4 { frame.set_wrapping(base + i, color); }
        }
        2 => {
            let base = (t * 1.5) as usize % n;
            let opposite = base + n / 2;
            for i in 0..3 {
                frame.set_wrapping(base + i, color);
                frame.set_wrapping(opposite + i, color);
            }
        }
        count => {
            let count = count as usize;
            let region  = (n / (count * 2)).max(1);
            let spacing = n / count;
            for r in 0..count {
                for i in 0..region {
                    frame.set_wrapping(r * spacing + i, color);
                }
            }
        }
    }
    frame
}

/// One cyan block per entered digit, laid out from LED 0.
pub fn sequence_frame(entered: usize, geometry: RingGeometry) -> RingFrame {
    let n = geometry.led_count;
    let mut frame = RingFrame::dark(n);
    let width = n / geometry.max_digits.max(1);

    for block in 0..entered {
        for j in 0..width {
            frame.set(block * width + j, SEQUENCE_COLOR);
        }
    }
    frame
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
