//! Hand-tracking sources.
//!
//! The recognizer pulls one [`Observation`] per frame through
//! [`VisionSource`] and does not care where it came from:
//!
//! * [`SimHandTracker`]: finger counts held down on the keyboard of the
//!   ring simulator window (default)
//! * [`ScriptedTracker`]: a fixed list of frames, from a file or a test
//! * `LeapHandTracker`: a LeapMotion controller (feature `leap`)

use std::collections::VecDeque;
use std::path::Path;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use finger_stream::{Digit, Observation};

use crate::error::VisionError;

/// Camera-like frame period used by the simulators (≈30 fps).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Anything that yields per-frame finger counts.
pub trait VisionSource {
    /// Block until the next frame is available.
    ///
    /// [`VisionError::Closed`] means no further frames will come.  Any
    /// other error is a single bad frame.
    fn next_frame(&mut self) -> Result<Observation, VisionError>;

    fn describe(&self) -> String;
}

// ════════════════════════════════════════════════════════════════════════════
// ScriptedTracker
// ════════════════════════════════════════════════════════════════════════════

/// Plays back a prepared list of frames.
///
/// Script files hold one entry per line, `<digit|none> [xN]`:
///
/// ```text
/// # fist, one finger, fist, open hand
/// 0 x6
/// 1 x6
/// none x3
/// 0 x6
/// 5 x6
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedTracker {
    frames:   VecDeque<Observation>,
    interval: Option<Duration>,
    last:     Option<Instant>,
    total:    usize,
}

impl ScriptedTracker {
    /// Unpaced: frames are returned as fast as they are asked for.
    pub fn from_frames<I: IntoIterator<Item = Observation>>(frames: I) -> Self {
        let frames: VecDeque<Observation> = frames.into_iter().collect();
        let total = frames.len();
        ScriptedTracker { frames, interval: None, last: None, total }
    }

    pub fn parse(text: &str) -> Result<Self, VisionError> {
        let mut frames = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() { continue; }
            let (obs, count) = parse_line(line).map_err(|message| VisionError::Script { line: i + 1, message })?;
            frames.extend(std::iter::repeat(obs).take(count));
        }
        Ok(Self::from_frames(frames))
    }

    pub fn load(path: &Path) -> Result<Self, VisionError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| VisionError::ScriptFile { path: path.to_path_buf(), source })?;
        Self::parse(&text)
    }

    /// Release one frame per `interval`, like a camera would.
    pub fn paced(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn remaining(&self) -> usize { self.frames.len() }
}

fn parse_line(line: &str) -> Result<(Observation, usize), String> {
    let mut parts = line.split_whitespace();
    let symbol = parts.next().unwrap_or("");

    let obs = match symbol.to_ascii_lowercase().as_str() {
        "none" | "-" => Observation::Absent,
        s => Observation::Fingers(s.parse::<Digit>().map_err(|e| e.to_string())?),
    };

    let count = match parts.next() {
        None => 1,
        Some(rep) => {
            let n = rep.strip_prefix('x').or_else(|| rep.strip_prefix('X'))
                .ok_or_else(|| format!("expected repeat like `x6`, got {rep:?}"))?;
            n.parse::<usize>().map_err(|_| format!("bad repeat count {n:?}"))?
        }
    };
    if let Some(extra) = parts.next() {
        return Err(format!("unexpected {extra:?}"));
    }
    Ok((obs, count))
}

impl VisionSource for ScriptedTracker {
    fn next_frame(&mut self) -> Result<Observation, VisionError> {
        let obs = self.frames.pop_front().ok_or(VisionError::Closed)?;
        if let Some(interval) = self.interval {
            if let Some(last) = self.last {
                let due = last + interval;
                let now = Instant::now();
                if due > now { thread::sleep(due - now); }
            }
            self.last = Some(Instant::now());
        }
        Ok(obs)
    }

    fn describe(&self) -> String {
        format!("script ({} frames)", self.total)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandTracker: keyboard simulation
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the simulator window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    /// Hand shown with this many fingers, or withdrawn.
    Hand(Option<Digit>),
    Quit,
}

/// Repeats the most recent [`SimInput::Hand`] every frame interval.
pub struct SimHandTracker {
    rx:       Receiver<SimInput>,
    held:     Option<Digit>,
    interval: Duration,
}

impl SimHandTracker {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimHandTracker { rx, held: None, interval: FRAME_INTERVAL }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl VisionSource for SimHandTracker {
    fn next_frame(&mut self) -> Result<Observation, VisionError> {
        thread::sleep(self.interval);
        loop {
            match self.rx.try_recv() {
                Ok(SimInput::Hand(d))              => self.held = d,
                Ok(SimInput::Quit)                 => return Err(VisionError::Closed),
                Err(TryRecvError::Empty)           => break,
                Err(TryRecvError::Disconnected)    => return Err(VisionError::Closed),
            }
        }
        Ok(Observation::from(self.held))
    }

    fn describe(&self) -> String {
        "keyboard simulation (keys 0-5, Q to quit)".into()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapHandTracker: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Finger counts from a LeapMotion controller.
///
/// Requires the `leap` feature and the LeapC shared library.  Only the
/// first tracked hand is counted; a finger counts as extended when its
/// tip is far enough from its metacarpal base.  A poll that brings any
/// other event yields [`VisionError::NoFrame`].
#[cfg(feature = "leap")]
pub struct LeapHandTracker {
    connection: leaprs::Connection,
}

#[cfg(feature = "leap")]
impl LeapHandTracker {
    pub fn open() -> Result<Self, VisionError> {
        use leaprs::{Connection, ConnectionConfig};

        let mut connection = Connection::create(ConnectionConfig::default())
            .map_err(|e| VisionError::Device(format!("cannot create LeapC connection: {e:?}")))?;
        connection.open()
            .map_err(|e| VisionError::Device(format!("cannot open LeapMotion device: {e:?}")))?;
        Ok(LeapHandTracker { connection })
    }
}

#[cfg(feature = "leap")]
impl VisionSource for LeapHandTracker {
    fn next_frame(&mut self) -> Result<Observation, VisionError> {
        use leaprs::Event;

        let msg = self.connection.poll(100)
            .map_err(|e| VisionError::Device(format!("poll failed: {e:?}")))?;

        let Event::Tracking(frame) = msg.event() else {
            return Err(VisionError::NoFrame);
        };
        let Some(hand) = frame.hands().next() else {
            return Ok(Observation::Absent);
        };
        let extended = hand.digits()
            .filter(|f| finger_extension(f) > EXTENDED)
            .count();
        Ok(Digit::new(extended as u8).map_or(Observation::Absent, Observation::Fingers))
    }

    fn describe(&self) -> String {
        "LeapMotion controller".into()
    }
}

/// Tip-to-base distance above which a finger counts as extended (0–1).
#[cfg(feature = "leap")]
const EXTENDED: f32 = 0.7;

#[cfg(feature = "leap")]
fn finger_extension(digit: &leaprs::Digit) -> f32 {
    let base = digit.metacarpal().prev_joint();
    let tip  = digit.distal().next_joint();
    let dx   = tip.x - base.x;
    let dy   = tip.y - base.y;
    let dz   = tip.z - base.z;
    // typical finger length ≈ 80 mm
    ((dx*dx + dy*dy + dz*dz).sqrt() / 80.0).clamp(0.0, 1.0)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
