// Timeouts, topics, default gains
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuntimeError};

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Heading samples older than this are not trusted for closed-loop modes
pub const HEADING_TIMEOUT: Duration = Duration::from_millis(100);

// Zenoh topics
pub const TOPIC_CMD_DRIVE: &str = "mecanum/cmd/drive"; // commands
pub const TOPIC_HEADING: &str = "mecanum/state/heading"; // imu yaw
pub const TOPIC_RT_WHEELS: &str = "mecanum/rt/wheels"; // actuation
pub const TOPIC_TELEMETRY: &str = "mecanum/state/telemetry"; // controller diagnostics
pub const TOPIC_HEALTH: &str = "mecanum/state/health"; // health status

// Default control parameters for teleop
pub const DEFAULT_PIVOT_GAIN: f64 = 0.01;
pub const DEFAULT_PIVOT_MAX_SPEED: f64 = 0.5;
// The controller has no deadband, so a nonzero floor turns the robot even on target.
// Keep this at 0 for callers that do not check tolerance themselves.
pub const DEFAULT_PIVOT_MIN_SPEED: f64 = 0.0;
pub const DEFAULT_HEADING_GAIN: f64 = 0.02;

/// Loop timing, optionally loaded from a JSON file and overridden on the command line
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    pub loop_hz: u64,
    pub cmd_timeout_ms: u64,
    pub heading_timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            loop_hz: LOOP_HZ,
            cmd_timeout_ms: CMD_TIMEOUT.as_millis() as u64,
            heading_timeout_ms: HEADING_TIMEOUT.as_millis() as u64,
        }
    }
}

impl RuntimeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RuntimeError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| RuntimeError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Tick period; a zero rate is treated as 1 Hz
    pub fn period(&self) -> Duration {
        Duration::from_millis(1000 / self.loop_hz.max(1))
    }

    pub fn cmd_timeout(&self) -> Duration {
        Duration::from_millis(self.cmd_timeout_ms)
    }

    pub fn heading_timeout(&self) -> Duration {
        Duration::from_millis(self.heading_timeout_ms)
    }
}
