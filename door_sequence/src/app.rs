//! Wiring: pick the collaborators, start the two loops, collect the summary.
//!
//! The render loop owns the output and runs on the calling thread (a
//! `minifb` window must stay on the thread that created it).  Recognition
//! runs on its own thread and builds its vision source there, so sources
//! that are tied to their thread work too.

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use led_ring::PixelSink;
use tracing::info;

use crate::actuator::{ActuationGateway, Actuator, DryRunActuator, SerialActuator};
use crate::config::DoorConfig;
use crate::display::DisplayHandle;
use crate::error::{AppError, ConfigError, Result, VisionError};
use crate::recognizer::Recognizer;
use crate::renderer::{HeadlessRing, RenderLoop};
use crate::session::SessionSummary;
use crate::shutdown::ShutdownFlag;
use crate::vision::{ScriptedTracker, SimHandTracker, SimInput, VisionSource, FRAME_INTERVAL};
use crate::visualizer::RingWindow;

/// Where finger counts come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Keys 0–5 in the ring window.
    Keyboard,
    /// A gesture script played at camera rate.
    Script(PathBuf),
    #[cfg(feature = "leap")]
    Leap,
}

/// Where ring frames go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputKind {
    Window,
    Headless,
}

#[derive(Clone, Debug)]
pub struct AppOptions {
    pub config:  DoorConfig,
    pub source:  SourceKind,
    pub output:  OutputKind,
    pub dry_run: bool,
}

type SourceFactory = Box<dyn FnOnce() -> std::result::Result<Box<dyn VisionSource>, VisionError> + Send>;

/// Run until the vision source closes, the window is closed or `shutdown`
/// is raised.
pub fn run(opts: AppOptions, shutdown: ShutdownFlag) -> Result<SessionSummary> {
    let AppOptions { config, source, output, dry_run } = opts;

    let actuator: Arc<dyn Actuator> = if dry_run {
        Arc::new(DryRunActuator::new(config.actuator.clone()))
    } else {
        Arc::new(SerialActuator::new(config.actuator.clone()))
    };
    let gateway = ActuationGateway::new(actuator, config.actuator.auto_close());
    info!(actuator = %gateway.describe(), target = %config.sequence.target, "starting");

    let (sim_tx, factory) = vision_factory(source)?;
    let display = DisplayHandle::new();

    match output {
        OutputKind::Window => {
            let window = RingWindow::open(config.ring.led_count, sim_tx)?;
            drive(window, &config, display, gateway, factory, shutdown)
        }
        OutputKind::Headless => {
            if sim_tx.is_some() {
                return Err(ConfigError::Invalid(
                    "keyboard simulation needs the ring window; use --script with --headless".into(),
                ).into());
            }
            let ring = HeadlessRing::new(config.ring.led_count);
            drive(ring, &config, display, gateway, factory, shutdown)
        }
    }
}

fn vision_factory(source: SourceKind) -> Result<(Option<mpsc::Sender<SimInput>>, SourceFactory)> {
    match source {
        SourceKind::Keyboard => {
            let (tx, rx) = mpsc::channel();
            let factory: SourceFactory = Box::new(move || Ok(Box::new(SimHandTracker::new(rx)) as Box<dyn VisionSource>));
            Ok((Some(tx), factory))
        }
        SourceKind::Script(path) => {
            // parse now so a bad script stops start-up
            let script = ScriptedTracker::load(&path)?.paced(FRAME_INTERVAL);
            let factory: SourceFactory = Box::new(move || Ok(Box::new(script) as Box<dyn VisionSource>));
            Ok((None, factory))
        }
        #[cfg(feature = "leap")]
        SourceKind::Leap => {
            let factory: SourceFactory = Box::new(|| {
                Ok(Box::new(crate::vision::LeapHandTracker::open()?) as Box<dyn VisionSource>)
            });
            Ok((None, factory))
        }
    }
}

fn drive<S: PixelSink>(
    sink:     S,
    config:   &DoorConfig,
    display:  DisplayHandle,
    gateway:  ActuationGateway,
    factory:  SourceFactory,
    shutdown: ShutdownFlag,
) -> Result<SessionSummary> {
    let mut recognizer = Recognizer::new(config, display.clone(), gateway);
    let worker_shutdown = shutdown.clone();

    let worker = thread::Builder::new()
        .name("recognizer".into())
        .spawn(move || -> Result<SessionSummary> {
            let mut source = match factory() {
                Ok(s) => s,
                Err(e) => {
                    worker_shutdown.trigger();
                    return Err(e.into());
                }
            };
            info!(source = %source.describe(), "vision source ready");
            recognizer.run(source.as_mut(), &worker_shutdown);
            Ok(recognizer.finish(Instant::now()))
        })?;

    RenderLoop::new(sink, display, &config.ring).run(&shutdown);
    shutdown.trigger();

    worker.join().map_err(|_| AppError::RecognizerPanicked)?
}
