// ════════════════════════════════════════════════════════════════════════════
// PixelSink: the seam to whatever actually lights the LEDs
// ════════════════════════════════════════════════════════════════════════════

use thiserror::Error;

use crate::color::Rgb;
use crate::frame::RingFrame;

#[derive(Debug, Error)]
pub enum RingError {
    #[error("LED commit failed: {0}")]
    Commit(String),
    #[error("LED device unavailable: {0}")]
    Device(String),
    #[error("LED output closed")]
    Closed,
}

/// Buffered pixel output: writes accumulate until [`PixelSink::commit`].
pub trait PixelSink {
    fn led_count(&self) -> usize;
    fn set_pixel(&mut self, index: usize, color: Rgb);
    fn commit(&mut self) -> Result<(), RingError>;

    /// False once the output has gone away (e.g. a simulator window was
    /// closed).  Hardware strips stay open.
    fn is_open(&self) -> bool { true }
}

/// Write every pixel of `frame` at `brightness` and commit.
pub fn write_frame<S: PixelSink + ?Sized>(
    sink:       &mut S,
    frame:      &RingFrame,
    brightness: f32,
) -> Result<(), RingError> {
    for (i, &color) in frame.pixels().iter().enumerate().take(sink.led_count()) {
        sink.set_pixel(i, color.scaled(brightness));
    }
    sink.commit()
}

// ── in-memory sink (tests, headless runs) ─────────────────────────────────

/// Keeps every committed frame.  Can be told to fail the next few commits.
#[derive(Debug, Default)]
pub struct MemorySink {
    pending:        Vec<Rgb>,
    pub committed:  Vec<Vec<Rgb>>,
    pub fail_next:  usize,
}

impl MemorySink {
    pub fn new(led_count: usize) -> Self {
        MemorySink { pending: vec![Rgb::default(); led_count], committed: Vec::new(), fail_next: 0 }
    }

    pub fn last(&self) -> Option<&[Rgb]> {
        self.committed.last().map(Vec::as_slice)
    }
}

impl PixelSink for MemorySink {
    fn led_count(&self) -> usize { self.pending.len() }

    fn set_pixel(&mut self, index: usize, color: Rgb) {
        if let Some(p) = self.pending.get_mut(index) {
            *p = color;
        }
    }

    fn commit(&mut self) -> Result<(), RingError> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(RingError::Commit("injected failure".into()));
        }
        self.committed.push(self.pending.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::SUCCESS_COLOR;

    #[test]
    fn write_frame_applies_brightness() {
        let mut sink = MemorySink::new(4);
        write_frame(&mut sink, &RingFrame::filled(4, SUCCESS_COLOR), 0.5).unwrap();
        assert_eq!(sink.last().unwrap(), &[Rgb::new(0, 127, 0); 4]);
    }

    #[test]
    fn write_frame_ignores_extra_pixels() {
        let mut sink = MemorySink::new(2);
        write_frame(&mut sink, &RingFrame::filled(5, SUCCESS_COLOR), 1.0).unwrap();
        assert_eq!(sink.last().unwrap().len(), 2);
    }

    #[test]
    fn injected_failures_then_recovers() {
        let mut sink = MemorySink::new(3);
        sink.fail_next = 1;
        assert!(write_frame(&mut sink, &RingFrame::dark(3), 1.0).is_err());
        assert!(write_frame(&mut sink, &RingFrame::dark(3), 1.0).is_ok());
        assert_eq!(sink.committed.len(), 1);
    }
}
