//! The render loop.  Reads the published display state once per tick, draws
//! it with the animator and pushes the frame to a [`PixelSink`].  It never
//! waits on the recognizer; a failed commit costs one frame.

use std::thread;
use std::time::{Duration, Instant};

use led_ring::{write_frame, Animator, PixelSink, RingError, RingFrame, Rgb};
use tracing::{debug, info, trace, warn};

use crate::config::RingConfig;
use crate::display::DisplayHandle;
use crate::shutdown::ShutdownFlag;

/// Longest uninterrupted sleep, so a shutdown is noticed promptly.
const SLEEP_SLICE: Duration = Duration::from_millis(20);

pub struct RenderLoop<S: PixelSink> {
    sink:           S,
    animator:       Animator,
    display:        DisplayHandle,
    brightness:     f32,
    failed_commits: u64,
}

impl<S: PixelSink> RenderLoop<S> {
    pub fn new(sink: S, display: DisplayHandle, cfg: &RingConfig) -> Self {
        RenderLoop {
            sink,
            animator: Animator::new(cfg.geometry(), cfg.cadence()),
            display,
            brightness: cfg.brightness,
            failed_commits: 0,
        }
    }

    /// Draw one frame.  `clock` is time since the loop started.  Returns how
    /// long to hold it.
    pub fn tick(&mut self, clock: Duration) -> Duration {
        let snap = self.display.snapshot();
        let rendered = self.animator.render(&snap, clock);
        trace!(pattern = ?rendered.pattern, generation = snap.generation, "frame");

        if let Err(e) = write_frame(&mut self.sink, &rendered.frame, self.brightness) {
            self.failed_commits += 1;
            warn!(error = %e, "LED commit failed, frame skipped");
        }
        rendered.hold
    }

    /// Render until `shutdown` is raised or the sink closes, then turn every
    /// LED off.  Hands the sink back.
    pub fn run(mut self, shutdown: &ShutdownFlag) -> S {
        let started = Instant::now();
        while !shutdown.is_set() {
            if !self.sink.is_open() {
                info!("ring output closed");
                shutdown.trigger();
                break;
            }
            let hold = self.tick(started.elapsed());
            sleep_unless(hold, shutdown);
        }
        self.blank();
        if self.failed_commits > 0 {
            debug!(failed = self.failed_commits, "render loop finished");
        }
        self.sink
    }

    /// Final all-off commit.
    pub fn blank(&mut self) {
        let dark = RingFrame::dark(self.sink.led_count());
        if let Err(e) = write_frame(&mut self.sink, &dark, 1.0) {
            warn!(error = %e, "could not turn LEDs off");
        }
    }

    pub fn failed_commits(&self) -> u64 { self.failed_commits }
    pub fn sink(&self) -> &S { &self.sink }
}

fn sleep_unless(total: Duration, shutdown: &ShutdownFlag) {
    let deadline = Instant::now() + total;
    loop {
        let now = Instant::now();
        if now >= deadline || shutdown.is_set() { return; }
        thread::sleep((deadline - now).min(SLEEP_SLICE));
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HeadlessRing
// ════════════════════════════════════════════════════════════════════════════

/// `--headless`: no window, just a debug line whenever the number of lit
/// LEDs changes.
#[derive(Debug)]
pub struct HeadlessRing {
    pending:  Vec<Rgb>,
    last_lit: Option<usize>,
}

impl HeadlessRing {
    pub fn new(led_count: usize) -> Self {
        HeadlessRing { pending: vec![Rgb::default(); led_count], last_lit: None }
    }
}

impl PixelSink for HeadlessRing {
    fn led_count(&self) -> usize { self.pending.len() }

    fn set_pixel(&mut self, index: usize, color: Rgb) {
        if let Some(p) = self.pending.get_mut(index) {
            *p = color;
        }
    }

    fn commit(&mut self) -> Result<(), RingError> {
        let lit = self.pending.iter().filter(|p| !p.is_off()).count();
        if self.last_lit != Some(lit) {
            debug!(lit, of = self.pending.len(), "ring");
            self.last_lit = Some(lit);
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
