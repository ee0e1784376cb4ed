//! Runtime configuration.
//!
//! Built-in defaults reproduce the stock build (secret `[0, 1, 0, 5]`,
//! 5 s timeout, 20-LED ring, Arduino on `/dev/ttyACM0`).  A TOML file can
//! override any subset; command-line flags override the file.
//!
//! ```toml
//! [sequence]
//! target = [0, 1, 0, 5]
//! timeout_secs = 5.0
//!
//! [ring]
//! led_count = 24
//! brightness = 0.4
//!
//! [actuator]
//! port = "/dev/ttyUSB0"
//! auto_close_secs = 10.0
//! ```

use std::path::Path;
use std::time::Duration;

use finger_stream::Digit;
use led_ring::{Cadence, RingGeometry};
use sequence_lock::TargetSequence;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DoorConfig {
    pub sequence:   SequenceConfig,
    pub classifier: ClassifierConfig,
    pub ring:       RingConfig,
    pub actuator:   ActuatorConfig,
}

// ════════════════════════════════════════════════════════════════════════════
// Sections
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SequenceConfig {
    pub target:              TargetSequence,
    /// Silence after which a partial attempt is discarded.
    pub timeout_secs:        f64,
    /// How long input is ignored after a successful unlock.
    pub success_cooldown_ms: u64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        SequenceConfig {
            target:              default_target(),
            timeout_secs:        5.0,
            success_cooldown_ms: 3000,
        }
    }
}

fn default_target() -> TargetSequence {
    TargetSequence::starting_with(Digit::ZERO, [1, 0, 5].into_iter().filter_map(Digit::new))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Frames of history kept.
    pub buffer_size: usize,
    /// Newest frames the majority vote looks at.
    pub window:      usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            buffer_size: finger_stream::DEFAULT_BUFFER_SIZE,
            window:      finger_stream::DEFAULT_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RingConfig {
    pub led_count:   usize,
    pub brightness:  f32,
    pub max_flashes: u8,
    pub max_digits:  usize,
    pub idle_ms:     u64,
    pub digit_ms:    u64,
    pub sequence_ms: u64,
    pub flash_ms:    u64,
}

impl Default for RingConfig {
    fn default() -> Self {
        let cadence = Cadence::default();
        RingConfig {
            led_count:   led_ring::DEFAULT_LED_COUNT,
            brightness:  1.0,
            max_flashes: led_ring::DEFAULT_MAX_FLASHES,
            max_digits:  led_ring::DEFAULT_MAX_DIGITS,
            idle_ms:     cadence.idle.as_millis() as u64,
            digit_ms:    cadence.digit.as_millis() as u64,
            sequence_ms: cadence.sequence.as_millis() as u64,
            flash_ms:    cadence.flash.as_millis() as u64,
        }
    }
}

impl RingConfig {
    pub fn geometry(&self) -> RingGeometry {
        RingGeometry { led_count: self.led_count, max_digits: self.max_digits }
    }

    pub fn cadence(&self) -> Cadence {
        Cadence {
            idle:     Duration::from_millis(self.idle_ms),
            digit:    Duration::from_millis(self.digit_ms),
            sequence: Duration::from_millis(self.sequence_ms),
            flash:    Duration::from_millis(self.flash_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActuatorConfig {
    pub port:            String,
    pub baud:            u32,
    /// Serial read/write timeout.
    pub timeout_ms:      u64,
    /// Pause after opening the port; the board resets on connect.
    pub settle_ms:       u64,
    /// Pause between sending a command and looking for the reply.
    pub read_delay_ms:   u64,
    pub on_command:      String,
    pub off_command:     String,
    /// Close the door again this long after opening it.  Unset: never.
    pub auto_close_secs: Option<f64>,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        ActuatorConfig {
            port:            "/dev/ttyACM0".into(),
            baud:            9600,
            timeout_ms:      1000,
            settle_ms:       2000,
            read_delay_ms:   100,
            on_command:      "#on".into(),
            off_command:     "#off".into(),
            auto_close_secs: None,
        }
    }
}

impl ActuatorConfig {
    pub fn timeout(&self)    -> Duration { Duration::from_millis(self.timeout_ms) }
    pub fn settle(&self)     -> Duration { Duration::from_millis(self.settle_ms) }
    pub fn read_delay(&self) -> Duration { Duration::from_millis(self.read_delay_ms) }

    /// `None` when unset, or when the value is not a valid duration
    /// (rejected by [`DoorConfig::validate`]).
    pub fn auto_close(&self) -> Option<Duration> {
        self.auto_close_secs.and_then(|s| Duration::try_from_secs_f64(s).ok())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Loading and validation
// ════════════════════════════════════════════════════════════════════════════

impl DoorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: DoorConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        let t = self.sequence.timeout_secs;
        if t <= 0.0 || Duration::try_from_secs_f64(t).is_err() {
            return invalid(format!("sequence.timeout_secs must be a positive duration, got {t}"));
        }

        let c = &self.classifier;
        if c.buffer_size == 0 {
            return invalid("classifier.buffer_size must be at least 1".into());
        }
        if c.window == 0 || c.window > c.buffer_size {
            return invalid(format!(
                "classifier.window must be in 1..={}, got {}", c.buffer_size, c.window
            ));
        }

        let r = &self.ring;
        if r.led_count == 0 {
            return invalid("ring.led_count must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&r.brightness) {
            return invalid(format!("ring.brightness must be within 0.0–1.0, got {}", r.brightness));
        }
        if r.max_digits == 0 {
            return invalid("ring.max_digits must be at least 1".into());
        }

        if let Some(s) = self.actuator.auto_close_secs {
            if Duration::try_from_secs_f64(s).is_err() {
                return invalid(format!("actuator.auto_close_secs must be a non-negative duration, got {s}"));
            }
        }
        Ok(())
    }

    /// Saturates at `Duration::MAX` for values [`validate`](Self::validate)
    /// would reject.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.sequence.timeout_secs).unwrap_or(Duration::MAX)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.sequence.success_cooldown_ms)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
