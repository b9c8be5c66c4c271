use std::fs;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, anyhow};

use crate::motion::DisplayPower;

/// How to drive the panel's power rail: a backlight sysfs node, shell
/// commands, or both.
#[derive(Debug, Clone, Default)]
pub struct DisplayPowerPlan {
    pub sysfs: Option<BacklightSysfs>,
    pub on_command: Option<String>,
    pub off_command: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BacklightSysfs {
    pub path: PathBuf,
    pub on_value: String,
    pub off_value: String,
}

impl DisplayPowerPlan {
    /// The Raspberry Pi default: toggle HDMI through `vcgencmd`.
    pub fn vcgencmd() -> Self {
        Self {
            sysfs: None,
            on_command: Some("vcgencmd display_power 1".to_string()),
            off_command: Some("vcgencmd display_power 0".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DisplayPowerController {
    plan: DisplayPowerPlan,
}

impl DisplayPowerController {
    pub fn new(plan: DisplayPowerPlan) -> Result<Self> {
        if plan.sysfs.is_none() && plan.on_command.is_none() && plan.off_command.is_none() {
            return Err(anyhow!(
                "display power plan must configure a sysfs path or a command"
            ));
        }
        if let Some(cmd) = plan.on_command.as_deref() {
            ensure_not_blank(cmd, "on command")?;
        }
        if let Some(cmd) = plan.off_command.as_deref() {
            ensure_not_blank(cmd, "off command")?;
        }
        Ok(Self { plan })
    }

    fn perform(&self, on: bool) -> Result<()> {
        let mut errors = Vec::new();

        if let Some(sysfs) = &self.plan.sysfs {
            let value = if on { &sysfs.on_value } else { &sysfs.off_value };
            if let Err(err) = fs::write(&sysfs.path, value).with_context(|| {
                format!("failed to write '{}' to {}", value, sysfs.path.display())
            }) {
                errors.push(err);
            }
        }

        let command = if on {
            self.plan.on_command.as_deref()
        } else {
            self.plan.off_command.as_deref()
        };
        if let Some(command) = command {
            if let Err(err) = run_command(command) {
                errors.push(err);
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.into_iter().next().unwrap()),
            _ => {
                let message = errors
                    .into_iter()
                    .map(|err| err.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(anyhow!(message))
            }
        }
    }
}

impl DisplayPower for DisplayPowerController {
    fn power(&self, on: bool) -> Result<()> {
        self.perform(on)
    }
}

fn run_command(command: &str) -> Result<()> {
    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .status()
        .with_context(|| format!("failed to spawn shell for command: {command}"))?;

    if status.success() {
        Ok(())
    } else {
        Err(anyhow!(
            "command exited with status {}: {command}",
            status.code().unwrap_or(-1)
        ))
    }
}

fn ensure_not_blank(value: &str, label: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(anyhow!("{label} must not be blank"))
    } else {
        Ok(())
    }
}
