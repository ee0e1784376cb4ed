//! Door actuation.
//!
//! The lock is an Arduino on a serial port that understands newline
//! terminated text commands (`#on`, `#off`) and may answer with one line.
//! Every command opens the port, waits for the board to settle, throws
//! away whatever the board printed while booting, sends, reads at most one
//! reply line and closes the port again.
//!
//! [`ActuationGateway`] is what the recognizer talks to: it opens the door,
//! logs what happened and, when configured, schedules the matching close.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, info, warn};

use crate::config::ActuatorConfig;
use crate::error::ActuationError;

/// Reply from the actuator, if it sent one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ack(pub Option<String>);

pub trait Actuator: Send + Sync {
    fn activate(&self) -> Result<Ack, ActuationError>;
    fn deactivate(&self) -> Result<Ack, ActuationError>;
    fn describe(&self) -> String;
}

// ════════════════════════════════════════════════════════════════════════════
// SerialActuator
// ════════════════════════════════════════════════════════════════════════════

pub struct SerialActuator {
    cfg: ActuatorConfig,
}

impl SerialActuator {
    pub fn new(cfg: ActuatorConfig) -> Self {
        SerialActuator { cfg }
    }

    fn send_command(&self, command: &str) -> Result<Ack, ActuationError> {
        let mut port = serialport::new(&self.cfg.port, self.cfg.baud)
            .timeout(self.cfg.timeout())
            .open()
            .map_err(|source| ActuationError::Open { port: self.cfg.port.clone(), source })?;

        thread::sleep(self.cfg.settle());
        exchange(&mut port, command, self.cfg.read_delay(), self.cfg.timeout())
    }
}

impl Actuator for SerialActuator {
    fn activate(&self) -> Result<Ack, ActuationError> {
        self.send_command(&self.cfg.on_command)
    }

    fn deactivate(&self) -> Result<Ack, ActuationError> {
        self.send_command(&self.cfg.off_command)
    }

    fn describe(&self) -> String {
        format!("serial {} @ {} baud", self.cfg.port, self.cfg.baud)
    }
}

// ── wire protocol ─────────────────────────────────────────────────────────

/// The parts of a serial port one command exchange needs.
pub trait CommandPort: Read + Write {
    /// Drop everything received but not yet read.
    fn discard_input(&mut self) -> io::Result<()>;
    /// Bytes waiting to be read.
    fn pending(&mut self) -> io::Result<u32>;
}

impl CommandPort for Box<dyn SerialPort> {
    fn discard_input(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::Input).map_err(io::Error::from)
    }

    fn pending(&mut self) -> io::Result<u32> {
        self.bytes_to_read().map_err(io::Error::from)
    }
}

/// Send `command` on a settled port and collect the reply, if any.  The
/// boot banner still sitting in the input buffer is discarded first so it
/// is never mistaken for the reply.
pub fn exchange<P: CommandPort + ?Sized>(
    port:       &mut P,
    command:    &str,
    read_delay: Duration,
    timeout:    Duration,
) -> Result<Ack, ActuationError> {
    port.discard_input()?;
    write_command(port, command)?;
    thread::sleep(read_delay);

    if port.pending()? == 0 {
        return Ok(Ack(None));
    }
    read_reply(port, timeout)
}

pub fn write_command<W: Write + ?Sized>(port: &mut W, command: &str) -> Result<(), ActuationError> {
    port.write_all(command.as_bytes())?;
    port.write_all(b"\n")?;
    port.flush()?;
    Ok(())
}

/// Read one reply line.  A board that does not know the command answers
/// `Unknown command ...`.
pub fn read_reply<R: Read + ?Sized>(port: &mut R, timeout: Duration) -> Result<Ack, ActuationError> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match port.read(&mut byte) {
            Ok(0) => break,
            Ok(_) if byte[0] == b'\n' => break,
            Ok(_) => line.push(byte[0]),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                if line.is_empty() {
                    return Err(ActuationError::Timeout(timeout));
                }
                break;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    let reply = String::from_utf8_lossy(&line).trim().to_string();
    if reply.starts_with("Unknown command") {
        return Err(ActuationError::Protocol(reply));
    }
    Ok(Ack(if reply.is_empty() { None } else { Some(reply) }))
}

// ════════════════════════════════════════════════════════════════════════════
// Stand-ins
// ════════════════════════════════════════════════════════════════════════════

/// `--dry-run`: log instead of touching the port.
pub struct DryRunActuator {
    cfg: ActuatorConfig,
}

impl DryRunActuator {
    pub fn new(cfg: ActuatorConfig) -> Self {
        DryRunActuator { cfg }
    }
}

impl Actuator for DryRunActuator {
    fn activate(&self) -> Result<Ack, ActuationError> {
        info!(command = %self.cfg.on_command, port = %self.cfg.port, "dry run: would send");
        Ok(Ack(None))
    }

    fn deactivate(&self) -> Result<Ack, ActuationError> {
        info!(command = %self.cfg.off_command, port = %self.cfg.port, "dry run: would send");
        Ok(Ack(None))
    }

    fn describe(&self) -> String { "dry run".into() }
}

/// Counts calls.  Set `fail` to make every call return an error.
#[derive(Debug, Default)]
pub struct RecordingActuator {
    activations:   AtomicUsize,
    deactivations: AtomicUsize,
    pub fail:      AtomicBool,
}

impl RecordingActuator {
    pub fn new() -> Self { RecordingActuator::default() }

    pub fn failing() -> Self {
        let a = RecordingActuator::default();
        a.fail.store(true, Ordering::SeqCst);
        a
    }

    pub fn activations(&self)   -> usize { self.activations.load(Ordering::SeqCst) }
    pub fn deactivations(&self) -> usize { self.deactivations.load(Ordering::SeqCst) }

    fn outcome(&self) -> Result<Ack, ActuationError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ActuationError::Unavailable("recording actuator set to fail".into()));
        }
        Ok(Ack(Some("OK".into())))
    }
}

impl Actuator for RecordingActuator {
    fn activate(&self) -> Result<Ack, ActuationError> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        self.outcome()
    }

    fn deactivate(&self) -> Result<Ack, ActuationError> {
        self.deactivations.fetch_add(1, Ordering::SeqCst);
        self.outcome()
    }

    fn describe(&self) -> String { "recording".into() }
}

// ════════════════════════════════════════════════════════════════════════════
// ActuationGateway
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ActuationGateway {
    actuator:   Arc<dyn Actuator>,
    auto_close: Option<Duration>,
}

impl ActuationGateway {
    pub fn new(actuator: Arc<dyn Actuator>, auto_close: Option<Duration>) -> Self {
        ActuationGateway { actuator, auto_close }
    }

    /// Open the door.  Errors are logged and handed back; the caller has
    /// already committed to the unlock and must not undo it.
    pub fn open_door(&self) -> Result<Ack, ActuationError> {
        let result = self.actuator.activate();
        match &result {
            Ok(Ack(Some(reply))) => info!(%reply, "door opened"),
            Ok(Ack(None))        => info!("door opened (no reply)"),
            Err(e)               => warn!(error = %e, "door actuation failed"),
        }
        if result.is_ok() {
            self.schedule_close();
        }
        result
    }

    fn schedule_close(&self) {
        let Some(delay) = self.auto_close else { return };
        let actuator = Arc::clone(&self.actuator);
        debug!(?delay, "door will close automatically");
        thread::spawn(move || {
            thread::sleep(delay);
            match actuator.deactivate() {
                Ok(_)  => info!("door closed"),
                Err(e) => warn!(error = %e, "door close failed"),
            }
        });
    }

    pub fn describe(&self) -> String {
        self.actuator.describe()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::time::Instant;

    const T: Duration = Duration::from_millis(100);

    struct TimingOut;
    impl Read for TimingOut {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"))
        }
    }

    /// Board that booted with a banner and answers each command line with
    /// `reply`.
    struct Board {
        input:   VecDeque<u8>,
        written: Vec<u8>,
        reply:   &'static str,
    }

    impl Board {
        fn booted(reply: &'static str) -> Self {
            let banner = "DRV8825 Motor Controller Ready\nCommands: #on, #off\n";
            Board { input: banner.bytes().collect(), written: Vec::new(), reply }
        }
    }

    impl Read for Board {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Board {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            if buf.contains(&b'\n') {
                self.input.extend(self.reply.bytes());
            }
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> { Ok(()) }
    }

    impl CommandPort for Board {
        fn discard_input(&mut self) -> io::Result<()> {
            self.input.clear();
            Ok(())
        }
        fn pending(&mut self) -> io::Result<u32> {
            Ok(self.input.len() as u32)
        }
    }

    #[test]
    fn boot_banner_is_not_taken_for_the_reply() {
        let mut board = Board::booted("Door open\n");
        let ack = exchange(&mut board, "#on", Duration::ZERO, T).unwrap();
        assert_eq!(ack, Ack(Some("Door open".into())));
        assert_eq!(board.written, b"#on\n");
    }

    #[test]
    fn unknown_command_after_banner_is_a_protocol_error() {
        let mut board = Board::booted("Unknown command: #onn\n");
        let err = exchange(&mut board, "#onn", Duration::ZERO, T).unwrap_err();
        assert!(matches!(err, ActuationError::Protocol(_)));
    }

    #[test]
    fn silent_board_acks_with_nothing() {
        let mut board = Board::booted("");
        assert_eq!(exchange(&mut board, "#off", Duration::ZERO, T).unwrap(), Ack(None));
    }

    #[test]
    fn commands_are_newline_terminated() {
        let mut out = Vec::new();
        write_command(&mut out, "#on").unwrap();
        assert_eq!(out, b"#on\n");
    }

    #[test]
    fn reads_exactly_one_line() {
        let mut port = Cursor::new(b"Door open\r\nsecond line\n".to_vec());
        assert_eq!(read_reply(&mut port, T).unwrap(), Ack(Some("Door open".into())));
    }

    #[test]
    fn unknown_command_is_a_protocol_error() {
        let mut port = Cursor::new(b"Unknown command: #onn\n".to_vec());
        assert!(matches!(read_reply(&mut port, T), Err(ActuationError::Protocol(_))));
    }

    #[test]
    fn silent_port_times_out() {
        assert!(matches!(read_reply(&mut TimingOut, T), Err(ActuationError::Timeout(_))));
    }

    #[test]
    fn partial_line_before_timeout_is_kept() {
        let mut port = Cursor::new(b"OK".to_vec()).chain(TimingOut);
        assert_eq!(read_reply(&mut port, T).unwrap(), Ack(Some("OK".into())));
    }

    #[test]
    fn missing_port_fails_to_open() {
        let cfg = ActuatorConfig { port: "/dev/definitely-not-a-tty".into(), ..ActuatorConfig::default() };
        let err = SerialActuator::new(cfg).activate().unwrap_err();
        assert!(matches!(err, ActuationError::Open { .. }));
    }

    #[test]
    fn gateway_reports_failure_without_panicking() {
        let rec = Arc::new(RecordingActuator::failing());
        let gw = ActuationGateway::new(rec.clone(), Some(Duration::ZERO));
        assert!(gw.open_door().is_err());
        assert_eq!(rec.activations(), 1);
        // no close scheduled after a failed open
        thread::sleep(Duration::from_millis(50));
        assert_eq!(rec.deactivations(), 0);
    }

    #[test]
    fn gateway_schedules_auto_close() {
        let rec = Arc::new(RecordingActuator::new());
        let gw = ActuationGateway::new(rec.clone(), Some(Duration::from_millis(10)));
        assert_eq!(gw.open_door().unwrap(), Ack(Some("OK".into())));

        let deadline = Instant::now() + Duration::from_secs(2);
        while rec.deactivations() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(rec.deactivations(), 1);
    }

    #[test]
    fn no_auto_close_by_default() {
        let rec = Arc::new(RecordingActuator::new());
        let gw = ActuationGateway::new(rec.clone(), None);
        gw.open_door().unwrap();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(rec.deactivations(), 0);
    }

    #[test]
    fn dry_run_always_succeeds() {
        let a = DryRunActuator::new(ActuatorConfig::default());
        assert!(a.activate().is_ok());
        assert!(a.deactivate().is_ok());
    }
}
