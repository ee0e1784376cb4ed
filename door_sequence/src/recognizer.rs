//! The recognition loop: frames in, display updates and door openings out.
//!
//! Per frame, in order:
//!
//! 1. While the post-success cool-down runs, the frame is dropped.
//! 2. Hand presence edges update the display (digit while present; partial
//!    attempt or idle once the hand leaves).
//! 3. The frame goes through the debouncer.  A stable-symbol change is fed
//!    to the sequence machine and its outcome is published before the door
//!    is opened.

use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;
use finger_stream::{ClassifierEvent, DebouncedClassifier, Digit, Observation};
use led_ring::DisplayState;
use sequence_lock::{format_digits, LockState, Mismatch, Outcome, SequenceMachine, Step};
use tracing::{debug, info, trace};

use crate::actuator::ActuationGateway;
use crate::config::DoorConfig;
use crate::display::DisplayHandle;
use crate::error::VisionError;
use crate::session::{SessionStats, SessionSummary};
use crate::shutdown::ShutdownFlag;
use crate::vision::VisionSource;

/// Poll period while waiting out a cool-down after the source has closed.
const DRAIN_POLL: Duration = Duration::from_millis(50);

pub struct Recognizer {
    classifier:   DebouncedClassifier,
    lock:         SequenceMachine,
    display:      DisplayHandle,
    gateway:      ActuationGateway,
    flashes:      u8,
    hand_present: bool,
    stats:        SessionStats,
}

impl Recognizer {
    pub fn new(cfg: &DoorConfig, display: DisplayHandle, gateway: ActuationGateway) -> Self {
        let now = Instant::now();
        Recognizer {
            classifier:   DebouncedClassifier::new(cfg.classifier.buffer_size, cfg.classifier.window),
            lock:         SequenceMachine::new(cfg.sequence.target.clone(), cfg.timeout(), cfg.cooldown()),
            display,
            gateway,
            flashes:      cfg.ring.max_flashes,
            hand_present: false,
            stats:        SessionStats::start(now),
        }
    }

    /// Handle one camera frame observed at `now`.
    ///
    /// Returns the sequence machine's step when the frame produced a new
    /// stable symbol.
    pub fn process_frame(&mut self, obs: Observation, now: Instant) -> Option<Step> {
        self.stats.frames += 1;
        self.tick(now);
        if self.lock.is_cooling_down() {
            trace!("cooling down, frame dropped");
            return None;
        }

        let digit = match obs {
            Observation::Absent => {
                self.hand_left();
                return None;
            }
            Observation::Fingers(d) => d,
        };

        if !self.hand_present {
            self.hand_present = true;
            debug!(fingers = %digit, "hand appeared");
        }
        self.display.publish(DisplayState::ShowingDigit(digit));

        match self.classifier.observe(obs)? {
            ClassifierEvent::Changed(change) => {
                self.stats.symbol_changes += 1;
                let old = change.old.map_or_else(|| "-".to_string(), |d| d.to_string());
                info!(
                    at = %Local::now().format("%H:%M:%S"),
                    "symbol {} → {}", old, change.new
                );
                let step = self.lock.accept(change.new, now);
                self.apply(change.new, step);
                Some(step)
            }
            ClassifierEvent::Cleared { .. } => None,
        }
    }

    /// End the success cool-down once it has elapsed.  Safe to call at any
    /// time; `process_frame` calls it first thing.
    pub fn tick(&mut self, now: Instant) {
        if self.lock.tick(now) {
            info!("ready for the next attempt");
            self.display.publish(DisplayState::Idle);
        }
    }

    fn hand_left(&mut self) {
        self.classifier.observe(Observation::Absent);
        if !self.hand_present {
            return;
        }
        self.hand_present = false;
        debug!("hand left");

        let attempted = self.lock.attempted();
        let state = if attempted.is_empty() {
            DisplayState::Idle
        } else {
            DisplayState::ShowingSequence(attempted.to_vec())
        };
        self.display.publish(state);
    }

    fn apply(&mut self, digit: Digit, step: Step) {
        if step.timed_out {
            self.stats.timeouts += 1;
            info!(timeout = ?self.lock.timeout(), "sequence timed out, starting over");
        }

        match step.outcome {
            Outcome::Partial { remaining, .. } => {
                info!(
                    attempt = %format_digits(self.lock.attempted()),
                    remaining,
                    "digit {} accepted", digit
                );
            }
            Outcome::Success => {
                self.stats.unlocks += 1;
                info!(sequence = %self.lock.target(), "sequence complete, opening door");
                self.display.publish(DisplayState::SuccessFlash { flashes: self.flashes });
                if self.gateway.open_door().is_ok() {
                    self.stats.door_opened = true;
                }
            }
            Outcome::Failure(mismatch) => {
                self.stats.failures += 1;
                match mismatch {
                    Mismatch::WrongDigit { position, expected, got } => {
                        info!(position, %expected, %got, "wrong digit, attempt reset");
                    }
                    Mismatch::TooLong { length } => {
                        info!(length, "attempt too long, reset");
                    }
                }
            }
            Outcome::CoolingDown => debug!("digit {} ignored during cool-down", digit),
        }
    }

    /// Pull frames from `source` until it closes or `shutdown` is raised.
    ///
    /// When the source closes first, a running cool-down is allowed to
    /// finish before the flag is raised so the success flash is seen.
    pub fn run<V: VisionSource + ?Sized>(&mut self, source: &mut V, shutdown: &ShutdownFlag) {
        while !shutdown.is_set() {
            match source.next_frame() {
                Ok(obs) => { self.process_frame(obs, Instant::now()); }
                Err(VisionError::Closed) => {
                    info!("vision source closed");
                    self.drain(shutdown);
                    shutdown.trigger();
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "frame skipped");
                    self.tick(Instant::now());
                }
            }
        }
    }

    fn drain(&mut self, shutdown: &ShutdownFlag) {
        while self.lock.is_cooling_down() && !shutdown.is_set() {
            thread::sleep(DRAIN_POLL);
            self.tick(Instant::now());
        }
    }

    pub fn finish(&self, now: Instant) -> SessionSummary {
        self.stats.summarize(now, self.lock.attempted())
    }

    pub fn lock_state(&self)   -> LockState      { self.lock.state() }
    pub fn attempted(&self)    -> &[Digit]       { self.lock.attempted() }
    pub fn stable(&self)       -> Option<Digit>  { self.classifier.stable() }
    pub fn hand_present(&self) -> bool           { self.hand_present }
    pub fn stats(&self)        -> &SessionStats  { &self.stats }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::actuator::RecordingActuator;
    use crate::vision::ScriptedTracker;

    fn d(v: u8) -> Digit { Digit::new(v).unwrap() }

    struct Rig {
        rec:      Recognizer,
        display:  DisplayHandle,
        actuator: Arc<RecordingActuator>,
        t0:       Instant,
        frame:    u64,
    }

    impl Rig {
        fn new() -> Self { Rig::with(RecordingActuator::new()) }

        fn with(actuator: RecordingActuator) -> Self {
            let actuator = Arc::new(actuator);
            let display  = DisplayHandle::new();
            let gateway  = ActuationGateway::new(actuator.clone(), None);
            let rec      = Recognizer::new(&DoorConfig::default(), display.clone(), gateway);
            Rig { rec, display, actuator, t0: Instant::now(), frame: 0 }
        }

        fn now(&self) -> Instant {
            self.t0 + Duration::from_millis(33 * self.frame)
        }

        /// Feed `n` frames, 33 ms apart.
        fn feed(&mut self, obs: Observation, n: usize) -> Vec<Step> {
            let mut steps = Vec::new();
            for _ in 0..n {
                self.frame += 1;
                let now = self.now();
                steps.extend(self.rec.process_frame(obs, now));
            }
            steps
        }

        fn show(&mut self, v: u8, n: usize) -> Vec<Step> {
            self.feed(Observation::Fingers(d(v)), n)
        }

        fn wait(&mut self, dur: Duration) {
            self.frame += dur.as_millis() as u64 / 33 + 1;
        }
    }

    #[test]
    fn digit_shows_immediately_but_registers_after_window() {
        let mut rig = Rig::new();
        assert!(rig.show(0, 4).is_empty());
        assert_eq!(rig.display.snapshot().state, DisplayState::ShowingDigit(d(0)));
        assert_eq!(rig.rec.stable(), None);

        let steps = rig.show(0, 1);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].outcome, Outcome::Partial { entered: 1, remaining: 3 });
    }

    #[test]
    fn holding_a_gesture_does_not_repeat_it() {
        let mut rig = Rig::new();
        assert_eq!(rig.show(0, 60).len(), 1);
        assert_eq!(rig.rec.attempted(), &[d(0)]);
    }

    #[test]
    fn full_sequence_opens_door_once() {
        let mut rig = Rig::new();
        for v in [0, 1, 0, 5] {
            rig.show(v, 6);
        }
        assert_eq!(rig.actuator.activations(), 1);
        assert_eq!(rig.display.snapshot().state, DisplayState::SuccessFlash { flashes: 6 });
        assert!(rig.rec.attempted().is_empty());
        assert!(rig.rec.stats().door_opened);
        assert!(matches!(rig.rec.lock_state(), LockState::Succeeded { .. }));
    }

    #[test]
    fn cool_down_drops_frames_then_returns_to_idle() {
        let mut rig = Rig::new();
        for v in [0, 1, 0, 5] {
            rig.show(v, 6);
        }
        let flash_generation = rig.display.generation();

        // hand movement during the cool-down is ignored
        rig.feed(Observation::Absent, 10);
        rig.show(0, 10);
        assert_eq!(rig.display.generation(), flash_generation);
        assert!(rig.rec.attempted().is_empty());

        rig.wait(Duration::from_secs(3));
        rig.rec.tick(rig.now());
        assert_eq!(rig.rec.lock_state(), LockState::Idle);
        assert_eq!(rig.display.snapshot().state, DisplayState::Idle);
        assert_eq!(rig.actuator.activations(), 1);
    }

    #[test]
    fn failed_actuation_still_counts_the_unlock() {
        let mut rig = Rig::with(RecordingActuator::failing());
        for v in [0, 1, 0, 5] {
            rig.show(v, 6);
        }
        assert_eq!(rig.actuator.activations(), 1);
        assert_eq!(rig.rec.stats().unlocks, 1);
        assert!(!rig.rec.stats().door_opened);
        assert_eq!(rig.display.snapshot().state, DisplayState::SuccessFlash { flashes: 6 });
    }

    #[test]
    fn hand_leaving_shows_partial_attempt() {
        let mut rig = Rig::new();
        rig.show(0, 6);
        rig.show(1, 6);
        rig.feed(Observation::Absent, 1);
        assert!(!rig.rec.hand_present());
        assert_eq!(rig.rec.stable(), None);
        assert_eq!(rig.display.snapshot().state, DisplayState::ShowingSequence(vec![d(0), d(1)]));
    }

    #[test]
    fn hand_leaving_with_no_attempt_goes_idle() {
        let mut rig = Rig::new();
        rig.show(3, 3);
        rig.feed(Observation::Absent, 1);
        assert_eq!(rig.display.snapshot().state, DisplayState::Idle);
    }

    #[test]
    fn absence_without_a_hand_does_not_republish() {
        let mut rig = Rig::new();
        rig.feed(Observation::Absent, 5);
        assert_eq!(rig.display.generation(), 0);
    }

    #[test]
    fn same_digit_again_after_hand_leaves() {
        // 0, withdraw, 0 enters two zeros
        let mut rig = Rig::new();
        rig.show(0, 6);
        rig.feed(Observation::Absent, 2);
        rig.show(1, 6);
        rig.feed(Observation::Absent, 2);
        rig.show(0, 6);
        assert_eq!(rig.rec.attempted(), &[d(0), d(1), d(0)]);
    }

    #[test]
    fn wrong_digit_resets_silently() {
        let mut rig = Rig::new();
        rig.show(0, 6);
        rig.show(1, 6);
        let steps = rig.show(2, 6);
        assert_eq!(
            steps[0].outcome,
            Outcome::Failure(Mismatch::WrongDigit { position: 2, expected: d(0), got: d(2) }),
        );
        assert!(rig.rec.attempted().is_empty());
        assert_eq!(rig.rec.stats().failures, 1);
        assert_eq!(rig.display.snapshot().state, DisplayState::ShowingDigit(d(2)));
        assert_eq!(rig.actuator.activations(), 0);
    }

    #[test]
    fn stale_attempt_times_out_before_next_digit() {
        let mut rig = Rig::new();
        rig.show(0, 6);
        rig.show(1, 6);
        rig.feed(Observation::Absent, 1);
        rig.wait(Duration::from_secs(6));

        let steps = rig.show(0, 6);
        assert!(steps[0].timed_out);
        for v in [1, 0, 5] {
            rig.show(v, 6);
        }
        assert_eq!(rig.actuator.activations(), 1);
        assert_eq!(rig.rec.stats().timeouts, 1);
    }

    #[test]
    fn run_plays_script_to_the_end() {
        let mut rig = Rig::new();
        let mut script = ScriptedTracker::parse("3 x6\nnone\n2 x6\nnone\n").unwrap();
        let shutdown = ShutdownFlag::new();
        rig.rec.run(&mut script, &shutdown);

        assert!(shutdown.is_set());
        let summary = rig.rec.finish(Instant::now());
        assert_eq!(summary.frames, 14);
        assert_eq!(summary.symbol_changes, 2);
        assert_eq!(summary.failures, 2);
        assert!(!summary.door_opened);
    }

    /// Answers every poll with something other than a frame.
    struct Silent {
        polls:    usize,
        stop_at:  usize,
        shutdown: ShutdownFlag,
    }

    impl VisionSource for Silent {
        fn next_frame(&mut self) -> Result<Observation, VisionError> {
            self.polls += 1;
            if self.polls == self.stop_at {
                self.shutdown.trigger();
            }
            Err(VisionError::NoFrame)
        }
        fn describe(&self) -> String { "silent".into() }
    }

    #[test]
    fn run_sees_shutdown_while_tracker_sends_no_frames() {
        let mut rig = Rig::new();
        let shutdown = ShutdownFlag::new();
        let mut source = Silent { polls: 0, stop_at: 5, shutdown: shutdown.clone() };
        rig.rec.run(&mut source, &shutdown);

        assert_eq!(source.polls, 5);
        assert_eq!(rig.rec.stats().frames, 0);
        assert_eq!(rig.rec.lock_state(), LockState::Idle);
    }

    #[test]
    fn run_stops_when_flag_is_raised() {
        let mut rig = Rig::new();
        let mut script = ScriptedTracker::from_frames([Observation::Absent; 10]);
        let shutdown = ShutdownFlag::new();
        shutdown.trigger();
        rig.rec.run(&mut script, &shutdown);
        assert_eq!(script.remaining(), 10);
    }
}
