use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{Local, NaiveTime};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Raw motion collaborator: a boolean pulse sampled in a bounded poll loop.
pub trait MotionSource: Send + 'static {
    fn pulse_active(&mut self) -> bool;
}

/// Source that always reports motion, used when no sensor is configured so
/// the display simply never sleeps.
pub struct AlwaysActive;

impl MotionSource for AlwaysActive {
    fn pulse_active(&mut self) -> bool {
        true
    }
}

/// Display power collaborator. Best-effort: failures are logged by the
/// supervisor and never propagated.
pub trait DisplayPower: Send + Sync + 'static {
    fn power(&self, on: bool) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct SleepTimings {
    /// Inactivity window after which the display powers off.
    pub sleep_after: Duration,
    /// Consecutive active pulses required before motion is confirmed.
    pub motion_threshold: u32,
    /// Sensor sampling interval.
    pub poll_interval: Duration,
    /// Automatic wake is suppressed before this local time of day.
    pub curfew_until: Option<NaiveTime>,
}

/// Whether a wake may proceed at the given local time. The curfew window runs
/// from midnight until `curfew_until`; a forced wake always proceeds.
pub fn wake_permitted(now: NaiveTime, curfew_until: Option<NaiveTime>, force: bool) -> bool {
    force || curfew_until.is_none_or(|until| now >= until)
}

/// Handle to the background motion watcher.
///
/// The awake flag is written only by the supervisor task and read through
/// [`MotionSupervisor::is_awake`]; the atomic store/load pair makes a wake
/// visible to the playback loop within one render tick.
pub struct MotionSupervisor {
    awake: Arc<AtomicBool>,
    wake_requested: Arc<Notify>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl MotionSupervisor {
    pub fn spawn(
        source: Box<dyn MotionSource>,
        power: Arc<dyn DisplayPower>,
        timings: SleepTimings,
    ) -> Self {
        let awake = Arc::new(AtomicBool::new(true));
        let wake_requested = Arc::new(Notify::new());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(
            source,
            power,
            timings,
            Arc::clone(&awake),
            Arc::clone(&wake_requested),
            cancel.clone(),
        ));
        Self {
            awake,
            wake_requested,
            cancel,
            task,
        }
    }

    /// Non-blocking read of the shared awake flag.
    pub fn is_awake(&self) -> bool {
        self.awake.load(Ordering::Acquire)
    }

    /// Request a wake that bypasses the curfew check.
    pub fn force_wake(&self) {
        self.wake_requested.notify_one();
    }

    /// Stop the watcher. The task forces the display awake on its way out so
    /// the hardware is never left powered off.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(err) = self.task.await {
            warn!(%err, "motion supervisor task did not shut down cleanly");
        }
    }
}

async fn run(
    source: Box<dyn MotionSource>,
    power: Arc<dyn DisplayPower>,
    timings: SleepTimings,
    awake: Arc<AtomicBool>,
    wake_requested: Arc<Notify>,
    cancel: CancellationToken,
) {
    let mut state = SupervisorState::new(source, power, timings, awake);
    // Make sure the panel is actually on before the first slide.
    state.wake(true, Local::now().time());
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = wake_requested.notified() => {
                state.wake(true, Local::now().time());
            }
            _ = tokio::time::sleep(state.timings.poll_interval) => {
                state.sample(Instant::now(), Local::now().time());
            }
        }
    }
    info!("motion supervisor stopping; forcing display awake");
    state.wake(true, Local::now().time());
}

/// Debounce and sleep-tracking state machine, separated from the task shell
/// so time and the pulse source can be driven directly in tests.
struct SupervisorState {
    source: Box<dyn MotionSource>,
    power: Arc<dyn DisplayPower>,
    timings: SleepTimings,
    awake: Arc<AtomicBool>,
    pulse_count: u32,
    last_motion_at: Instant,
}

impl SupervisorState {
    fn new(
        source: Box<dyn MotionSource>,
        power: Arc<dyn DisplayPower>,
        timings: SleepTimings,
        awake: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            power,
            timings,
            awake,
            pulse_count: 0,
            last_motion_at: Instant::now(),
        }
    }

    /// Take one sensor sample and update the debounce/sleep state.
    fn sample(&mut self, now: Instant, local_time: NaiveTime) {
        if self.source.pulse_active() {
            self.pulse_count = self.pulse_count.saturating_add(1);
        } else {
            // The count only survives one continuous active window; a single
            // inactive pulse resets it.
            self.pulse_count = 0;
        }

        if self.pulse_count > self.timings.motion_threshold {
            self.confirmed_motion(now, local_time);
        }

        if self.is_awake() && now.duration_since(self.last_motion_at) > self.timings.sleep_after {
            self.sleep_now();
        }
    }

    fn confirmed_motion(&mut self, now: Instant, local_time: NaiveTime) {
        self.last_motion_at = now;
        if !self.is_awake() {
            self.wake(false, local_time);
        }
    }

    fn wake(&mut self, force: bool, local_time: NaiveTime) {
        if !wake_permitted(local_time, self.timings.curfew_until, force) {
            info!(%local_time, "wake suppressed by curfew");
            return;
        }
        let was_awake = self.is_awake();
        self.awake.store(true, Ordering::Release);
        self.last_motion_at = Instant::now();
        if !was_awake {
            info!("waking display");
        }
        // The logical state updates even if the physical call fails.
        if let Err(err) = self.power.power(true) {
            warn!(%err, "display power-on failed");
        }
    }

    fn sleep_now(&mut self) {
        debug!(
            idle_secs = self.timings.sleep_after.as_secs(),
            "inactivity window elapsed; sleeping"
        );
        self.awake.store(false, Ordering::Release);
        info!("display sleeping");
        if let Err(err) = self.power.power(false) {
            warn!(%err, "display power-off failed");
        }
    }

    fn is_awake(&self) -> bool {
        self.awake.load(Ordering::Acquire)
    }
}
