use crate::color::{Rgb, OFF};

/// One full set of ring colours, index 0 first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingFrame {
    pixels: Vec<Rgb>,
}

impl RingFrame {
    /// All-off frame for `len` LEDs.
    pub fn dark(len: usize) -> Self {
        RingFrame { pixels: vec![OFF; len] }
    }

    pub fn filled(len: usize, color: Rgb) -> Self {
        RingFrame { pixels: vec![color; len] }
    }

    /// Set pixel `index`, wrapping round the ring.
    pub fn set_wrapping(&mut self, index: usize, color: Rgb) {
        if self.pixels.is_empty() { return; }
        let n = self.pixels.len();
        self.pixels[index % n] = color;
    }

    /// Set pixel `index`; out-of-range writes are ignored.
    pub fn set(&mut self, index: usize, color: Rgb) {
        if let Some(p) = self.pixels.get_mut(index) {
            *p = color;
        }
    }

    pub fn pixels(&self)    -> &[Rgb] { &self.pixels }
    pub fn len(&self)       -> usize  { self.pixels.len() }
    pub fn is_empty(&self)  -> bool   { self.pixels.is_empty() }

    /// Number of pixels that are not off.
    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|p| !p.is_off()).count()
    }
}
