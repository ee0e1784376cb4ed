//! Ring simulator window using `minifb`.
//!
//! ```text
//! ┌────────────────────────────┐
//! │        ●  ●  ●  ●          │
//! │     ●              ●       │
//! │    ●   LED ring     ●      │
//! │     ●              ●       │
//! │        ●  ●  ●  ●          │
//! │                            │
//! │  [0] [1] [2] [3] [4] [5]   │  keys held right now
//! └────────────────────────────┘
//! ```
//!
//! The window is a [`PixelSink`]: every commit redraws the LEDs and polls
//! the keyboard.  Holding `0`–`5` shows that many fingers to
//! [`SimHandTracker`](crate::vision::SimHandTracker); `Q` or `Esc` quits.

use std::f32::consts::TAU;
use std::sync::mpsc::Sender;
use std::time::Duration;

use finger_stream::Digit;
use led_ring::{finger_color, PixelSink, RingError, Rgb};
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::vision::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:    usize = 420;
pub const WIN_H:    usize = 480;
const RING_CX:      f32   = WIN_W as f32 / 2.0;
const RING_CY:      f32   = 200.0;
const RING_R:       f32   = 160.0;
const LED_R:        f32   = 11.0;
const KEY_Y:        usize = 420;
const KEY_W:        usize = 44;
const KEY_GAP:      usize = 16;
const BG_COLOR:     u32   = 0xFF10101A;
const LED_RIM:      u32   = 0xFF303040;
const KEY_IDLE:     u32   = 0xFF2A2A3A;

const FINGER_KEYS: [Key; 6] = [Key::Key0, Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5];

// ════════════════════════════════════════════════════════════════════════════
// RingWindow
// ════════════════════════════════════════════════════════════════════════════

pub struct RingWindow {
    window:  Window,
    buf:     Vec<u32>,
    pixels:  Vec<Rgb>,
    sim_tx:  Option<Sender<SimInput>>,
    held:    Option<Digit>,
    quit:    bool,
}

impl RingWindow {
    /// `sim_tx` receives finger keys; pass `None` when another source
    /// drives recognition.
    pub fn open(led_count: usize, sim_tx: Option<Sender<SimInput>>) -> Result<Self, RingError> {
        let mut window = Window::new(
            "door_sequence: LED ring",
            WIN_W, WIN_H,
            WindowOptions { resize: false, ..WindowOptions::default() },
        ).map_err(|e| RingError::Device(e.to_string()))?;

        window.limit_update_rate(Some(Duration::from_millis(16)));

        Ok(RingWindow {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            pixels: vec![Rgb::default(); led_count],
            sim_tx,
            held: None,
            quit: false,
        })
    }

    fn poll_input(&mut self) {
        if self.window.is_key_pressed(Key::Q, KeyRepeat::No)
            || self.window.is_key_pressed(Key::Escape, KeyRepeat::No)
        {
            self.quit = true;
            self.send(SimInput::Quit);
            return;
        }

        let held = FINGER_KEYS.iter()
            .position(|&k| self.window.is_key_down(k))
            .and_then(|i| Digit::new(i as u8));
        if held != self.held {
            self.held = held;
            self.send(SimInput::Hand(held));
        }
    }

    fn send(&self, input: SimInput) {
        if let Some(tx) = &self.sim_tx {
            // receiver gone means recognition already stopped
            let _ = tx.send(input);
        }
    }

    // ── drawing ───────────────────────────────────────────────────────────

    fn draw(&mut self) {
        self.buf.fill(BG_COLOR);

        let n = self.pixels.len();
        for i in 0..n {
            // LED 0 at twelve o'clock, clockwise
            let angle = TAU * i as f32 / n as f32 - TAU / 4.0;
            let x = RING_CX + RING_R * angle.cos();
            let y = RING_CY + RING_R * angle.sin();
            let lit = self.pixels[i].to_u32() | 0xFF000000;
            self.fill_disc(x, y, LED_R + 2.0, LED_RIM);
            self.fill_disc(x, y, LED_R, lit);
        }

        let row_w = FINGER_KEYS.len() * KEY_W + (FINGER_KEYS.len() - 1) * KEY_GAP;
        let mut x = (WIN_W - row_w) / 2;
        for d in Digit::all() {
            let color = if self.held == Some(d) { finger_color(d).to_u32() | 0xFF000000 } else { KEY_IDLE };
            self.fill_rect(x, KEY_Y, KEY_W, KEY_W, color);
            self.draw_digit(d, x + KEY_W / 2 - 6, KEY_Y + KEY_W / 2 - 10, 0xFFEEEEEE);
            x += KEY_W + KEY_GAP;
        }
    }

    fn fill_disc(&mut self, cx: f32, cy: f32, r: f32, color: u32) {
        let x0 = (cx - r).max(0.0) as usize;
        let y0 = (cy - r).max(0.0) as usize;
        let x1 = ((cx + r) as usize).min(WIN_W - 1);
        let y1 = ((cy + r) as usize).min(WIN_H - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy <= r * r {
                    self.buf[y * WIN_W + x] = color;
                }
            }
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            for col in x..(x + w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    /// 3×5 glyph drawn at 4× scale.
    fn draw_digit(&mut self, d: Digit, x: usize, y: usize, color: u32) {
        const SCALE: usize = 4;
        for (row, &bits) in digit_glyph(d).iter().enumerate() {
            for col in 0..3 {
                if bits & (1 << (2 - col)) != 0 {
                    self.fill_rect(x + col * SCALE, y + row * SCALE, SCALE, SCALE, color);
                }
            }
        }
    }
}

impl PixelSink for RingWindow {
    fn led_count(&self) -> usize { self.pixels.len() }

    fn set_pixel(&mut self, index: usize, color: Rgb) {
        if let Some(p) = self.pixels.get_mut(index) {
            *p = color;
        }
    }

    fn commit(&mut self) -> Result<(), RingError> {
        if !self.window.is_open() {
            return Err(RingError::Closed);
        }
        self.poll_input();
        self.draw();
        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H)
            .map_err(|e| RingError::Commit(e.to_string()))
    }

    fn is_open(&self) -> bool {
        self.window.is_open() && !self.quit
    }
}

fn digit_glyph(d: Digit) -> [u8; 5] {
    match d.value() {
        0 => [0b111, 0b101, 0b101, 0b101, 0b111],
        1 => [0b010, 0b110, 0b010, 0b010, 0b111],
        2 => [0b111, 0b001, 0b111, 0b100, 0b111],
        3 => [0b111, 0b001, 0b111, 0b001, 0b111],
        4 => [0b101, 0b101, 0b111, 0b001, 0b001],
        _ => [0b111, 0b100, 0b111, 0b001, 0b111],
    }
}
