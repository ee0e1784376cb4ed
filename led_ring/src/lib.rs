//! # led_ring
//!
//! Everything the ring of RGB LEDs shows, independent of the hardware that
//! shows it.
//!
//! ## Display states → patterns
//!
//! | [`DisplayState`] | Pattern | Cadence |
//! |---|---|---|
//! | `Idle` | blue arc chasing round the ring with a fading tail | slow |
//! | `ShowingDigit(d)` | `d`-dependent lit regions in the digit's colour | fast |
//! | `ShowingSequence(s)` | one cyan block per entered digit | slow |
//! | `SuccessFlash` | alternating all-green / all-off, then idle chase | slowest |
//!
//! [`Animator`] turns the latest [`DisplaySnapshot`] into a [`RingFrame`]
//! plus how long to hold it.  [`PixelSink`] is the seam to the physical
//! driver; [`write_frame`] pushes a frame through it.

mod color;
mod display;
mod frame;
mod pattern;
mod sink;

pub use color::{finger_color, Rgb, CHASE_COLOR, OFF, SEQUENCE_COLOR, SUCCESS_COLOR};
pub use display::{DisplaySnapshot, DisplayState};
pub use frame::RingFrame;
pub use pattern::{Animator, Cadence, Pattern, RenderedFrame, RingGeometry, CHASE_TAIL};
pub use sink::{write_frame, MemorySink, PixelSink, RingError};

/// LEDs on the stock ring.
pub const DEFAULT_LED_COUNT: usize = 20;

/// Sequence progress assumes at most this many digits fit round the ring.
pub const DEFAULT_MAX_DIGITS: usize = 4;

/// Success flash frames (on + off counts separately).
pub const DEFAULT_MAX_FLASHES: u8 = 6;
