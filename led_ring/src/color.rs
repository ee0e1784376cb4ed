// ════════════════════════════════════════════════════════════════════════════
// Color palette
// ════════════════════════════════════════════════════════════════════════════

use finger_stream::Digit;

/// 8-bit-per-channel colour as the pixel driver takes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self { Rgb { r, g, b } }

    /// Multiply every channel by `factor` (clamped to 0.0–1.0).
    pub fn scaled(self, factor: f32) -> Rgb {
        let f = factor.clamp(0.0, 1.0);
        let ch = |c: u8| (c as f32 * f) as u8;
        Rgb { r: ch(self.r), g: ch(self.g), b: ch(self.b) }
    }

    pub fn is_off(self) -> bool { self == OFF }

    /// Packed `0x00RRGGBB`, the layout `minifb` wants.
    pub fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

pub const OFF:            Rgb = Rgb::new(0, 0, 0);
pub const CHASE_COLOR:    Rgb = Rgb::new(0, 100, 255);   // blue
pub const SEQUENCE_COLOR: Rgb = Rgb::new(0, 255, 255);   // cyan
pub const SUCCESS_COLOR:  Rgb = Rgb::new(0, 255, 0);     // green

/// Colour used to show a finger count.  No reds, so nothing reads as an
/// error.
pub fn finger_color(d: Digit) -> Rgb {
    match d.value() {
        0 => Rgb::new(255, 255, 255), // fist: white
        1 => Rgb::new(255, 165, 0),   // orange
        2 => Rgb::new(255, 255, 0),   // yellow
        3 => Rgb::new(0, 255, 0),     // green
        4 => Rgb::new(0, 0, 255),     // blue
        _ => Rgb::new(128, 0, 128),   // open hand: purple
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_halves_channels() {
        assert_eq!(Rgb::new(200, 100, 0).scaled(0.5), Rgb::new(100, 50, 0));
        assert_eq!(Rgb::new(10, 10, 10).scaled(3.0), Rgb::new(10, 10, 10));
        assert!(Rgb::new(10, 10, 10).scaled(0.0).is_off());
    }

    #[test]
    fn finger_colors_distinct_and_lit() {
        let colors: Vec<Rgb> = Digit::all().map(finger_color).collect();
        for (i, a) in colors.iter().enumerate() {
            assert!(!a.is_off());
            for b in &colors[i + 1..] { assert_ne!(a, b); }
        }
    }

    #[test]
    fn packs_for_window_buffer() {
        assert_eq!(Rgb::new(0x12, 0x34, 0x56).to_u32(), 0x123456);
    }
}
