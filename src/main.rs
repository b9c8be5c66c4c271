//! Binary entrypoint for the kiosk frame.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use kiosk_frame::commands::RemoteSource;
use kiosk_frame::config::Configuration;
use kiosk_frame::decode::ImageDecoder;
use kiosk_frame::motion::{AlwaysActive, MotionSource, MotionSupervisor, SleepTimings};
use kiosk_frame::platform::display_power::{DisplayPowerController, DisplayPowerPlan};
use kiosk_frame::platform::gpio::GpioMotionSource;
use kiosk_frame::platform::lirc::LircRemote;
use kiosk_frame::playback::{self, PlaybackOptions};
use kiosk_frame::prefetch::Prefetcher;
use kiosk_frame::queue::PhotoQueue;
use kiosk_frame::render::HeadlessPresenter;

/// Simple CLI
#[derive(Debug, Parser)]
#[command(name = "kiosk-frame", about = "Motion-aware kiosk photo frame")]
struct Cli {
    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE", default_value = "config.yaml")]
    config: PathBuf,

    /// Override per-slide delay (e.g. "45s")
    #[arg(long, value_name = "DURATION")]
    delay: Option<humantime::Duration>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("kiosk_frame={}", level).parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut cfg = Configuration::from_yaml_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(delay) = cli.delay {
        cfg.delay = delay.into();
    }
    let cfg = cfg.validated().context("validating configuration")?;

    let queue = PhotoQueue::new(&cfg.photo_library_path, cfg.shuffle)?;
    let prefetcher = Prefetcher::new(ImageDecoder);

    let remote: Box<dyn RemoteSource> = match cfg.remote.socket_path.as_deref() {
        Some(path) => Box::new(LircRemote::connect(path)),
        None => Box::new(LircRemote::disabled()),
    };

    let power_plan = cfg
        .sleep
        .display_power
        .as_ref()
        .map(|power| power.to_plan())
        .unwrap_or_else(DisplayPowerPlan::vcgencmd);
    let power = Arc::new(DisplayPowerController::new(power_plan)?);

    let motion_source: Box<dyn MotionSource> = match cfg.sleep.gpio_value_path.as_deref() {
        Some(path) => Box::new(GpioMotionSource::new(path)),
        None => {
            info!("no motion sensor configured; display will stay awake");
            Box::new(AlwaysActive)
        }
    };

    let supervisor = MotionSupervisor::spawn(
        motion_source,
        power,
        SleepTimings {
            sleep_after: cfg.sleep.sleep_after,
            motion_threshold: cfg.sleep.motion_threshold,
            poll_interval: cfg.sleep.poll_interval,
            curfew_until: cfg.sleep.curfew_until,
        },
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let result = playback::run(
        queue,
        prefetcher,
        remote,
        Box::new(HeadlessPresenter),
        &supervisor,
        PlaybackOptions {
            fps: cfg.fps,
            delay: cfg.delay,
            fade: cfg.fade,
            edge_blend: cfg.edge_blend,
            overlay_duration: cfg.overlay_duration,
        },
        cancel.clone(),
    )
    .await;

    // Whatever happened above, never exit with the display powered off.
    supervisor.stop().await;

    result
}
