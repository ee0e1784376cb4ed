//! # door_sequence
//!
//! Finger-count door lock.  Show the secret sequence of finger counts to
//! the hand tracker and the door opens; an LED ring shows what is being
//! recognised while you do it.
//!
//! ## Ring feedback
//!
//! | Situation | Ring |
//! |---|---|
//! | No hand, nothing entered | blue chase with fading tail |
//! | Hand in view | finger-count pattern in that digit's colour |
//! | Hand withdrawn mid-attempt | one cyan block per digit entered |
//! | Sequence accepted | green flashes, then back to the chase |
//!
//! Wrong digits and timeouts are silent: the attempt just starts over.
//!
//! ## Threads
//!
//! * **recognizer**: pulls frames, debounces them, runs the sequence
//!   machine, publishes the display state and opens the door
//! * **main**: renders the published state at its own cadence
//! * **signals**: raises the shutdown flag on Ctrl+C / SIGTERM
//!
//! The only state shared between recognizer and renderer is the
//! [`display::DisplayHandle`] slot.
//!
//! ## Feature flags
//!
//! * (default): keyboard simulation in the ring window, or a gesture script
//! * `leap`: read finger counts from a LeapMotion controller via LeapC
//!
//! ### Simulation keys
//!
//! | Key | Meaning |
//! |---|---|
//! | `0`–`5` held | hand showing that many fingers |
//! | nothing held | no hand |
//! | `Q` / `Esc` | quit |

pub mod actuator;
pub mod app;
pub mod config;
pub mod display;
pub mod error;
pub mod recognizer;
pub mod renderer;
pub mod session;
pub mod shutdown;
pub mod vision;
pub mod visualizer;
