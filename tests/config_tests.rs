use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;
use kiosk_frame::config::Configuration;

#[test]
fn parse_minimal_config_uses_defaults() {
    let yaml = r#"
photo-library-path: "/photos"
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.photo_library_path, PathBuf::from("/photos"));
    assert_eq!(cfg.delay, Duration::from_secs(30));
    assert_eq!(cfg.fade, Duration::from_secs(2));
    assert!(cfg.shuffle);
    assert_eq!(cfg.fps, 20);
    assert_eq!(cfg.sleep.sleep_after, Duration::from_secs(20 * 60));
    assert_eq!(cfg.sleep.motion_threshold, 10);
    assert_eq!(cfg.sleep.poll_interval, Duration::from_millis(50));
    assert!(cfg.sleep.curfew_until.is_none());
    assert!(cfg.remote.socket_path.is_none());
    cfg.validated().unwrap();
}

#[test]
fn parse_kebab_case_overrides() {
    let yaml = r#"
photo-library-path: "/photos"
delay: 45s
fade: 1500ms
shuffle: false
fps: 30
edge-blend: 0.25
overlay-duration: 3s
remote:
  socket-path: "/var/run/lirc/lircd"
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.delay, Duration::from_secs(45));
    assert_eq!(cfg.fade, Duration::from_millis(1500));
    assert!(!cfg.shuffle);
    assert_eq!(cfg.fps, 30);
    assert!((cfg.edge_blend - 0.25).abs() < f32::EPSILON);
    assert_eq!(cfg.overlay_duration, Duration::from_secs(3));
    assert_eq!(
        cfg.remote.socket_path,
        Some(PathBuf::from("/var/run/lirc/lircd"))
    );
}

#[test]
fn parse_sleep_section_with_curfew() {
    let yaml = r#"
photo-library-path: "/photos"
sleep:
  sleep-after: 20m
  motion-threshold: 25
  poll-interval: 100ms
  curfew-until: "07:30"
  gpio-value-path: "/sys/class/gpio/gpio15/value"
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.sleep.sleep_after, Duration::from_secs(1200));
    assert_eq!(cfg.sleep.motion_threshold, 25);
    assert_eq!(cfg.sleep.poll_interval, Duration::from_millis(100));
    assert_eq!(
        cfg.sleep.curfew_until,
        Some(NaiveTime::from_hms_opt(7, 30, 0).unwrap())
    );
    assert_eq!(
        cfg.sleep.gpio_value_path,
        Some(PathBuf::from("/sys/class/gpio/gpio15/value"))
    );
}

#[test]
fn curfew_accepts_seconds_form() {
    let yaml = r#"
photo-library-path: "/photos"
sleep:
  curfew-until: "06:15:30"
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(
        cfg.sleep.curfew_until,
        Some(NaiveTime::from_hms_opt(6, 15, 30).unwrap())
    );
}

#[test]
fn garbled_curfew_is_rejected() {
    let yaml = r#"
photo-library-path: "/photos"
sleep:
  curfew-until: "late morning"
"#;
    assert!(serde_yaml::from_str::<Configuration>(yaml).is_err());
}

#[test]
fn parse_display_power_section() {
    let yaml = r#"
photo-library-path: "/photos"
sleep:
  display-power:
    sysfs-path: "/sys/class/backlight/panel/bl_power"
    off-command: "vcgencmd display_power 0"
    on-command: "vcgencmd display_power 1"
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let power = cfg.sleep.display_power.expect("display-power section");
    assert_eq!(
        power.sysfs_path,
        Some(PathBuf::from("/sys/class/backlight/panel/bl_power"))
    );
    // bl_power defaults: 0 unblanks, 4 powers down.
    assert_eq!(power.on_value, "0");
    assert_eq!(power.off_value, "4");
    assert_eq!(power.on_command.as_deref(), Some("vcgencmd display_power 1"));
}

#[test]
fn unknown_keys_are_rejected() {
    let yaml = r#"
photo-library-path: "/photos"
photo-librarry-path: "/typo"
"#;
    assert!(serde_yaml::from_str::<Configuration>(yaml).is_err());
}

#[test]
fn validation_rejects_bad_values() {
    let zero_delay = r#"
photo-library-path: "/photos"
delay: 0s
"#;
    let cfg: Configuration = serde_yaml::from_str(zero_delay).unwrap();
    assert!(cfg.validated().is_err());

    let fade_longer_than_delay = r#"
photo-library-path: "/photos"
delay: 1s
fade: 5s
"#;
    let cfg: Configuration = serde_yaml::from_str(fade_longer_than_delay).unwrap();
    assert!(cfg.validated().is_err());

    let zero_threshold = r#"
photo-library-path: "/photos"
sleep:
  motion-threshold: 0
"#;
    let cfg: Configuration = serde_yaml::from_str(zero_threshold).unwrap();
    assert!(cfg.validated().is_err());
}
