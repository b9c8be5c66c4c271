use std::fs;
use std::path::PathBuf;

use tracing::warn;

use crate::motion::MotionSource;

/// PIR motion sensor exposed through a sysfs GPIO value file ("0"/"1").
///
/// A read failure is reported once; after that the source is treated as
/// permanently inactive rather than crashing the supervisor.
pub struct GpioMotionSource {
    path: PathBuf,
    failed: bool,
}

impl GpioMotionSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            failed: false,
        }
    }
}

impl MotionSource for GpioMotionSource {
    fn pulse_active(&mut self) -> bool {
        if self.failed {
            return false;
        }
        match fs::read_to_string(&self.path) {
            Ok(value) => value.trim() == "1",
            Err(err) => {
                warn!(
                    %err,
                    path = %self.path.display(),
                    "motion sensor unreadable; treating as permanently inactive"
                );
                self.failed = true;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_pulse_from_value_file() {
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("value");
        fs::write(&node, "1\n").unwrap();
        let mut source = GpioMotionSource::new(&node);
        assert!(source.pulse_active());
        fs::write(&node, "0\n").unwrap();
        assert!(!source.pulse_active());
    }

    #[test]
    fn missing_node_degrades_to_permanently_inactive() {
        let mut source = GpioMotionSource::new("/nonexistent/gpio/value");
        assert!(!source.pulse_active());
        assert!(source.failed);
        assert!(!source.pulse_active());
    }
}
