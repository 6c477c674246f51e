// Define message types for the runtime

use serde::{Deserialize, Serialize};

use crate::drive::WheelPowers;

// Command from teleop/scripts -> runtime
// Tagged by "mode" so each variant carries only the parameters its primitive needs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DriveCommand {
    /// Rotate in place toward an absolute heading
    Pivot {
        desired_angle: f64,
        gain: f64,
        max_speed: f64,
        min_speed: f64,
    },
    /// Translate with an open-loop rotation bias
    Slide {
        angle: f64,
        speed: f64,
        #[serde(default)]
        pivot_bias: f64,
    },
    /// Translate while holding an absolute heading
    SlideHold {
        angle: f64,
        speed: f64,
        target_heading: f64,
        heading_gain: f64,
    },
    Stop,
}

impl DriveCommand {
    /// Whether executing this command reads the heading sensor
    pub fn needs_heading(&self) -> bool {
        matches!(self, Self::Pivot { .. } | Self::SlideHold { .. })
    }
}

// Heading sample from the IMU bridge -> runtime, in the sensor's own convention
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HeadingSample {
    pub degrees: f64,
}

// Actuation output from runtime -> motor bridge
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct WheelActuation {
    pub rf: f64,
    pub rb: f64,
    pub lf: f64,
    pub lb: f64,
}

impl From<&WheelPowers> for WheelActuation {
    fn from(powers: &WheelPowers) -> Self {
        Self {
            rf: powers.rf,
            rb: powers.rb,
            lf: powers.lf,
            lb: powers.lb,
        }
    }
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
    HeadingStale,
}
