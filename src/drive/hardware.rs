// Collaborator seams for the drive controller
//
// The controller never talks to devices directly. It is handed a heading sensor,
// four wheel motors and a diagnostics sink at construction. This module defines those
// capabilities and the in-process implementations the runtime and tests use.

use std::collections::BTreeMap;

use tracing::debug;

use super::kinematics::normalize_heading;

/// Sign applied to every raw sensor reading.
///
/// The IMU reports yaw counter-clockwise-positive while the controller works
/// clockwise-positive. This is the only place that convention is bridged.
pub const HEADING_SIGN: f64 = -1.0;

/// Encoder handling modes for a wheel motor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    StopAndResetEncoder,
    RunWithoutEncoder,
}

/// Source of absolute heading in degrees (sensor's own convention and zero)
pub trait HeadingSensor {
    fn read_heading(&mut self) -> f64;
}

/// A single wheel's power output
pub trait WheelMotor {
    fn set_power(&mut self, power: f64);
    fn set_run_mode(&mut self, mode: RunMode);
}

/// Write-only side channel for observability
pub trait Diagnostics {
    fn record(&mut self, key: &str, value: f64);
}

/// Read the sensor and express it in the controller's clockwise-positive frame
pub fn calibrated_heading<S: HeadingSensor + ?Sized>(sensor: &mut S) -> f64 {
    HEADING_SIGN * normalize_heading(sensor.read_heading())
}

/// Heading sensor fed by an external sample stream; reads return the latest sample
#[derive(Debug, Clone, Copy, Default)]
pub struct LatestHeading {
    degrees: f64,
}

impl LatestHeading {
    pub fn new(degrees: f64) -> Self {
        Self { degrees }
    }

    pub fn update(&mut self, degrees: f64) {
        self.degrees = degrees;
    }
}

impl HeadingSensor for LatestHeading {
    fn read_heading(&mut self) -> f64 {
        self.degrees
    }
}

/// Motor output that latches the last commanded power and run mode.
///
/// Mode changes are kept in order so callers can see exactly what was sent.
#[derive(Debug, Clone, Default)]
pub struct LatchedMotor {
    power: f64,
    mode_history: Vec<RunMode>,
}

impl LatchedMotor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn power(&self) -> f64 {
        self.power
    }

    pub fn run_mode(&self) -> Option<RunMode> {
        self.mode_history.last().copied()
    }

    pub fn mode_history(&self) -> &[RunMode] {
        &self.mode_history
    }
}

impl WheelMotor for LatchedMotor {
    fn set_power(&mut self, power: f64) {
        self.power = power;
    }

    fn set_run_mode(&mut self, mode: RunMode) {
        self.mode_history.push(mode);
    }
}

/// Keeps the most recent value per key, for publishing as a snapshot.
///
/// Every record is also emitted as a `debug!` event.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    values: BTreeMap<String, f64>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl Diagnostics for Telemetry {
    fn record(&mut self, key: &str, value: f64) {
        debug!(key, value, "drive diagnostic");
        self.values.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_negates_reading() {
        let mut sensor = LatestHeading::new(30.0);
        assert_eq!(calibrated_heading(&mut sensor), -30.0);

        sensor.update(-45.0);
        assert_eq!(calibrated_heading(&mut sensor), 45.0);
    }

    #[test]
    fn test_calibration_normalizes_first() {
        // 350° raw is -10° after normalizing, then flipped
        let mut sensor = LatestHeading::new(350.0);
        assert_eq!(calibrated_heading(&mut sensor), 10.0);
    }

    #[test]
    fn test_calibration_keeps_full_resolution() {
        // Readings are not quantized to tenths of a degree
        let mut sensor = LatestHeading::new(12.25);
        assert_eq!(calibrated_heading(&mut sensor), -12.25);
    }

    #[test]
    fn test_latched_motor_keeps_mode_order() {
        let mut motor = LatchedMotor::new();
        assert_eq!(motor.run_mode(), None);

        motor.set_run_mode(RunMode::StopAndResetEncoder);
        motor.set_run_mode(RunMode::RunWithoutEncoder);
        motor.set_power(0.25);

        assert_eq!(motor.power(), 0.25);
        assert_eq!(motor.run_mode(), Some(RunMode::RunWithoutEncoder));
        assert_eq!(
            motor.mode_history(),
            &[RunMode::StopAndResetEncoder, RunMode::RunWithoutEncoder]
        );
    }

    #[test]
    fn test_telemetry_keeps_latest() {
        let mut telemetry = Telemetry::new();
        telemetry.record("pivot.heading", 1.0);
        telemetry.record("pivot.heading", 2.0);
        assert_eq!(telemetry.get("pivot.heading"), Some(2.0));
        assert_eq!(telemetry.values().len(), 1);

        telemetry.clear();
        assert_eq!(telemetry.get("pivot.heading"), None);
    }
}
