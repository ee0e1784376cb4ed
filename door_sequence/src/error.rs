//! Error types for door_sequence.
//!
//! Only start-up failures ([`ConfigError`], device errors surfaced through
//! [`AppError`]) stop the process.  Everything that goes wrong once the
//! loops are running is logged and survived.

use std::io;
use std::path::PathBuf;

use led_ring::RingError;
use sequence_lock::TargetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("bad target sequence: {0}")]
    Target(#[from] TargetError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Door actuator failures.  Never fatal: the unlock has already been
/// decided when one of these is raised.
#[derive(Debug, Error)]
pub enum ActuationError {
    #[error("cannot open actuator port {port}: {source}")]
    Open { port: String, source: serialport::Error },

    #[error("actuator did not answer within {0:?}")]
    Timeout(std::time::Duration),

    #[error("actuator I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("actuator rejected command: {0}")]
    Protocol(String),

    #[error("actuator unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum VisionError {
    /// The source has no more frames (script finished, window closed,
    /// quit key).
    #[error("vision source closed")]
    Closed,

    #[error("hand tracker error: {0}")]
    Device(String),

    /// The tracker answered with something other than a frame.
    #[error("no frame this poll")]
    NoFrame,

    #[error("script line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("cannot read script {path}: {source}")]
    ScriptFile { path: PathBuf, source: io::Error },
}

/// Anything that stops [`crate::app::run`] from starting or finishing.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error(transparent)]
    Ring(#[from] RingError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("recognition thread panicked")]
    RecognizerPanicked,
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
