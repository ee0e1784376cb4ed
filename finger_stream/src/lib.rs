//! # finger_stream
//!
//! Per-frame finger counts and the debouncer that turns them into stable
//! symbols.
//!
//! A hand tracker produces one [`Observation`] per camera frame: either no
//! hand at all, or a [`Digit`] (number of extended fingers, 0–5).  Raw
//! counts flicker while a hand moves, so [`DebouncedClassifier`] keeps a
//! short history and only reports a [`SymbolChange`] when the majority of
//! the most recent frames settles on a new value.
//!
//! ## Quick start
//!
//! ```rust
//! use finger_stream::{DebouncedClassifier, Digit, Observation, ClassifierEvent};
//!
//! let mut classifier = DebouncedClassifier::new(10, 5);
//! let two = Digit::new(2).unwrap();
//!
//! let mut events = Vec::new();
//! for _ in 0..8 {
//!     if let Some(ev) = classifier.observe(Observation::Fingers(two)) {
//!         events.push(ev);
//!     }
//! }
//! // Exactly one change, the moment five frames agree.
//! assert_eq!(events.len(), 1);
//! assert!(matches!(events[0], ClassifierEvent::Changed(c) if c.new == two));
//! ```

mod debounce;
mod digit;

pub use debounce::{majority, ClassifierEvent, DebouncedClassifier, ObservationBuffer, SymbolChange};
pub use digit::{Digit, DigitError, Observation, MAX_DIGIT};

/// Default number of frames kept in the observation buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 10;

/// Default number of most-recent frames the majority vote looks at.
pub const DEFAULT_WINDOW: usize = 5;
