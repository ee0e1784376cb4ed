//! door_sequence: command-line entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use door_sequence::app::{self, AppOptions, OutputKind, SourceKind};
use door_sequence::config::DoorConfig;
use door_sequence::error::ConfigError;
use door_sequence::shutdown::ShutdownFlag;
use sequence_lock::TargetSequence;

#[derive(Debug, Parser)]
#[command(name = "door_sequence", version, about = "Finger-count sequence door lock")]
struct Args {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Secret sequence, e.g. `0,1,0,5`.
    #[arg(long)]
    sequence: Option<String>,

    /// Seconds of silence before a partial attempt is dropped.
    #[arg(long)]
    timeout_secs: Option<f64>,

    /// Actuator serial port.
    #[arg(long)]
    port: Option<String>,

    #[arg(long)]
    baud: Option<u32>,

    /// Play finger counts from a script file instead of the keyboard.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Read finger counts from a LeapMotion controller.
    #[cfg(feature = "leap")]
    #[arg(long, conflicts_with = "script")]
    leap: bool,

    /// No ring window; requires --script (or --leap).
    #[arg(long)]
    headless: bool,

    /// Log actuator commands instead of sending them.
    #[arg(long)]
    dry_run: bool,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "door_sequence=debug" } else { "door_sequence=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════╗");
    println!("║        Door Sequence: finger-count lock          ║");
    println!("╚══════════════════════════════════════════════════╝");
    println!();

    let config = load_config(&args)?;
    let opts = AppOptions {
        source:  source_kind(&args),
        output:  if args.headless { OutputKind::Headless } else { OutputKind::Window },
        dry_run: args.dry_run,
        config,
    };

    println!("  Target length: {} digits", opts.config.sequence.target.len());
    println!("  Timeout:       {:.1} s", opts.config.sequence.timeout_secs);
    println!("  Actuator:      {}", if opts.dry_run { "dry run".to_string() } else { opts.config.actuator.port.clone() });
    println!();

    let shutdown = ShutdownFlag::new();
    shutdown.watch_signals().context("cannot install signal handlers")?;

    let summary = app::run(opts, shutdown)?;
    info!("shutdown complete");
    println!();
    println!("{summary}");
    Ok(())
}

fn load_config(args: &Args) -> Result<DoorConfig> {
    let mut config = match &args.config {
        Some(path) => DoorConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DoorConfig::default(),
    };

    if let Some(s) = &args.sequence {
        config.sequence.target = s.parse::<TargetSequence>()
            .map_err(ConfigError::from)
            .context("--sequence")?;
    }
    if let Some(t) = args.timeout_secs { config.sequence.timeout_secs = t; }
    if let Some(p) = &args.port        { config.actuator.port = p.clone(); }
    if let Some(b) = args.baud         { config.actuator.baud = b; }

    config.validate()?;
    Ok(config)
}

fn source_kind(args: &Args) -> SourceKind {
    #[cfg(feature = "leap")]
    {
        if args.leap {
            return SourceKind::Leap;
        }
    }
    match &args.script {
        Some(path) => SourceKind::Script(path.clone()),
        None       => SourceKind::Keyboard,
    }
}
