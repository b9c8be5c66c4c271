use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, ensure};
use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, de};

use crate::error::Error;
use crate::platform::display_power::{BacklightSysfs, DisplayPowerPlan};

/// Top-level YAML configuration, kebab-case keys throughout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Configuration {
    /// Directory scanned (recursively) for photos.
    pub photo_library_path: PathBuf,

    /// Time each slide stays on screen.
    #[serde(default = "Configuration::default_delay", with = "humantime_serde")]
    pub delay: Duration,

    /// Cross-fade duration between slides.
    #[serde(default = "Configuration::default_fade", with = "humantime_serde")]
    pub fade: Duration,

    /// Reshuffle the photo set at startup and on every wrap.
    #[serde(default = "Configuration::default_shuffle")]
    pub shuffle: bool,

    /// Render tick rate; also fixes the fade tick count.
    #[serde(default = "Configuration::default_fps")]
    pub fps: u32,

    /// Amount of image reflection blended at the slide edges.
    #[serde(default)]
    pub edge_blend: f32,

    /// How long transient PLAY/PAUSE/... labels stay on screen.
    #[serde(
        default = "Configuration::default_overlay_duration",
        with = "humantime_serde"
    )]
    pub overlay_duration: Duration,

    #[serde(default)]
    pub sleep: SleepConfig,

    #[serde(default)]
    pub remote: RemoteConfig,
}

impl Configuration {
    pub fn from_yaml_file(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    pub fn validated(self) -> Result<Self> {
        ensure!(!self.delay.is_zero(), "delay must be greater than zero");
        ensure!(self.fps >= 1, "fps must be at least 1");
        ensure!(
            self.fade <= self.delay,
            "fade ({:?}) must not exceed delay ({:?})",
            self.fade,
            self.delay
        );
        ensure!(
            (0.0..=1.0).contains(&self.edge_blend),
            "edge-blend must be within [0, 1]"
        );
        ensure!(
            self.sleep.motion_threshold >= 1,
            "motion-threshold must be at least 1"
        );
        ensure!(
            !self.sleep.poll_interval.is_zero(),
            "poll-interval must be greater than zero"
        );
        Ok(self)
    }

    fn default_delay() -> Duration {
        Duration::from_secs(30)
    }

    fn default_fade() -> Duration {
        Duration::from_secs(2)
    }

    fn default_shuffle() -> bool {
        true
    }

    fn default_fps() -> u32 {
        20
    }

    fn default_overlay_duration() -> Duration {
        Duration::from_secs(2)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SleepConfig {
    /// Inactivity window before the display powers off.
    #[serde(default = "SleepConfig::default_sleep_after", with = "humantime_serde")]
    pub sleep_after: Duration,

    /// Consecutive active pulses required to confirm motion.
    #[serde(default = "SleepConfig::default_motion_threshold")]
    pub motion_threshold: u32,

    /// Motion sensor sampling interval.
    #[serde(
        default = "SleepConfig::default_poll_interval",
        with = "humantime_serde"
    )]
    pub poll_interval: Duration,

    /// Local time of day before which automatic wake is suppressed, e.g.
    /// "07:30". Absent means no curfew.
    #[serde(default, deserialize_with = "deserialize_opt_time")]
    pub curfew_until: Option<NaiveTime>,

    /// Sysfs GPIO value file of the PIR sensor. Absent means no sensor: the
    /// display never sleeps.
    #[serde(default)]
    pub gpio_value_path: Option<PathBuf>,

    #[serde(default)]
    pub display_power: Option<DisplayPowerConfig>,
}

impl SleepConfig {
    fn default_sleep_after() -> Duration {
        Duration::from_secs(20 * 60)
    }

    fn default_motion_threshold() -> u32 {
        10
    }

    fn default_poll_interval() -> Duration {
        Duration::from_millis(50)
    }
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            sleep_after: Self::default_sleep_after(),
            motion_threshold: Self::default_motion_threshold(),
            poll_interval: Self::default_poll_interval(),
            curfew_until: None,
            gpio_value_path: None,
            display_power: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RemoteConfig {
    /// Path of the lircd unix socket. Absent means no remote.
    #[serde(default)]
    pub socket_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DisplayPowerConfig {
    /// Backlight sysfs node, e.g. /sys/class/backlight/.../bl_power.
    #[serde(default)]
    pub sysfs_path: Option<PathBuf>,

    #[serde(default = "DisplayPowerConfig::default_on_value")]
    pub on_value: String,

    #[serde(default = "DisplayPowerConfig::default_off_value")]
    pub off_value: String,

    #[serde(default)]
    pub on_command: Option<String>,

    #[serde(default)]
    pub off_command: Option<String>,
}

impl DisplayPowerConfig {
    // bl_power semantics: 0 = unblank (on), 4 = power down.
    fn default_on_value() -> String {
        "0".to_string()
    }

    fn default_off_value() -> String {
        "4".to_string()
    }

    pub fn to_plan(&self) -> DisplayPowerPlan {
        DisplayPowerPlan {
            sysfs: self.sysfs_path.as_ref().map(|path| BacklightSysfs {
                path: path.clone(),
                on_value: self.on_value.clone(),
                off_value: self.off_value.clone(),
            }),
            on_command: self.on_command.clone(),
            off_command: self.off_command.clone(),
        }
    }
}

fn deserialize_opt_time<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(text) => NaiveTime::parse_from_str(&text, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&text, "%H:%M:%S"))
            .map(Some)
            .map_err(|_| {
                de::Error::custom(format!("invalid time of day '{text}' (expected HH:MM)"))
            }),
    }
}
