use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::commands::{self, RemoteSource};
use crate::decode::{Decode, DecodedImage};
use crate::fade::FadeController;
use crate::motion::MotionSupervisor;
use crate::prefetch::Prefetcher;
use crate::queue::PhotoQueue;
use crate::render::{Frame, FramePresenter};

/// Mutable playback controls: touched only by the command dispatcher and by
/// the slide scheduler.
pub struct PlaybackState {
    pub paused: bool,
    pub delay: Duration,
    next_change_at: Instant,
}

impl PlaybackState {
    pub fn new(delay: Duration) -> Self {
        Self {
            paused: false,
            delay,
            // Due immediately so the first slide appears on the first tick.
            next_change_at: Instant::now(),
        }
    }

    pub fn due(&self, now: Instant) -> bool {
        now >= self.next_change_at
    }

    pub fn schedule_next(&mut self, now: Instant) {
        self.next_change_at = now + self.delay;
    }

    /// Bypass the delay timer so the next tick starts a slide change.
    pub fn force_change(&mut self) {
        self.next_change_at = Instant::now();
    }
}

pub struct PlaybackOptions {
    pub fps: u32,
    pub delay: Duration,
    pub fade: Duration,
    pub edge_blend: f32,
    pub overlay_duration: Duration,
}

/// Top-level driver: one iteration per render tick.
///
/// Per tick: keep the remote responsive (even while asleep, so a key press can
/// wake the frame), skip all slide work while the sleep supervisor holds the
/// gate closed, start a new fade when a slide change is due, then advance the
/// fade and hand the frame to the presenter. Decoding never happens on this
/// path except through the prefetcher's bounded join.
pub async fn run<D: Decode>(
    mut queue: PhotoQueue,
    mut prefetcher: Prefetcher<D>,
    mut remote: Box<dyn RemoteSource>,
    mut presenter: Box<dyn FramePresenter>,
    supervisor: &MotionSupervisor,
    opts: PlaybackOptions,
    cancel: CancellationToken,
) -> Result<()> {
    let mut playback = PlaybackState::new(opts.delay);
    let mut fade = FadeController::new(opts.fps, opts.fade);
    let mut overlay: Option<(&'static str, Instant)> = None;

    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / opts.fps as f64));
    // Fade progress is tick-counted; after a stall we want to resume the
    // cadence, not replay the missed ticks in a burst.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(fps = opts.fps, "playback loop starting");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("playback loop cancelled");
                break;
            }
            _ = ticker.tick() => {}
        }

        if !presenter.loop_running() {
            info!("host requested shutdown");
            break;
        }

        // At most one command takes effect per tick.
        if let Some(token) = remote.poll() {
            if !supervisor.is_awake() {
                debug!(?token, "remote activity while asleep; forcing wake");
                supervisor.force_wake();
            } else {
                let dispatch = commands::dispatch(token, &mut playback, &mut queue);
                if let Some(label) = dispatch.label {
                    overlay = Some((label, Instant::now() + opts.overlay_duration));
                }
                if dispatch.stop {
                    info!("stop command received");
                    break;
                }
            }
        }

        if !supervisor.is_awake() {
            continue;
        }

        let now = Instant::now();
        if playback.due(now) && !playback.paused {
            let image = next_image(&mut queue, &mut prefetcher).await?;
            fade.begin(image);
            playback.schedule_next(now);
            // Line up the follow-up photo while this one is on screen. At the
            // last slot the next cycle's order is not known yet, so the
            // prefetcher idles for one slide.
            if let Some(next) = queue.peek_next() {
                let next = next.to_path_buf();
                prefetcher.prefetch(next).await;
            }
            queue.advance_forward()?;
        }

        fade.tick();
        if overlay.is_some_and(|(_, until)| Instant::now() >= until) {
            overlay = None;
        }
        presenter.present(&Frame {
            foreground: fade.foreground(),
            background: fade.background(),
            alpha: fade.alpha(),
            edge_blend: opts.edge_blend,
            overlay: overlay.map(|(label, _)| label),
        });
    }

    prefetcher.shutdown().await;
    Ok(())
}

/// Resolve the cursor to a decoded image, skipping past unreadable files.
///
/// One corrupt photo must never halt the slideshow; each failure is logged
/// and the queue moves on. Only a full pass with zero decodable photos is
/// fatal.
async fn next_image<D: Decode>(
    queue: &mut PhotoQueue,
    prefetcher: &mut Prefetcher<D>,
) -> Result<Arc<DecodedImage>> {
    let mut attempts = queue.len();
    loop {
        match prefetcher.load_current(queue.current()).await {
            Ok(image) => return Ok(image),
            Err(err) => {
                warn!(%err, "skipping unreadable photo");
                attempts = attempts.saturating_sub(1);
                if attempts == 0 {
                    bail!("every photo in the library failed to decode");
                }
                queue.advance_forward()?;
            }
        }
    }
}
