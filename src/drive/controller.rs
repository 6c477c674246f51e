// Heading-correcting drive controller for the mecanum base
//
// Every primitive computes exactly one control update and returns a continuation flag.
// The caller re-invokes it each tick; passing `active = false` stops the maneuver by
// commanding zero power on that call.

use tracing::{debug, info};

use super::hardware::{calibrated_heading, Diagnostics, HeadingSensor, RunMode, WheelMotor};
use super::kinematics::{mix, translation, wrap_heading_error, WheelPowers};
use crate::messages::DriveCommand;

/// The four wheel outputs, by chassis position
#[derive(Debug, Clone, Default)]
pub struct Wheels<M> {
    pub rf: M,
    pub rb: M,
    pub lf: M,
    pub lb: M,
}

impl<M: WheelMotor> Wheels<M> {
    pub fn new(rf: M, rb: M, lf: M, lb: M) -> Self {
        Self { rf, rb, lf, lb }
    }

    fn write(&mut self, powers: WheelPowers) {
        self.rf.set_power(powers.rf);
        self.rb.set_power(powers.rb);
        self.lf.set_power(powers.lf);
        self.lb.set_power(powers.lb);
    }

    fn set_run_mode(&mut self, mode: RunMode) {
        self.rf.set_run_mode(mode);
        self.rb.set_run_mode(mode);
        self.lf.set_run_mode(mode);
        self.lb.set_run_mode(mode);
    }
}

/// Proportional pivot parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotParams {
    /// Power per degree of heading error
    pub gain: f64,
    pub max_speed: f64,
    pub min_speed: f64,
}

impl PivotParams {
    /// Proportional term before any speed limits
    pub fn raw_magnitude(&self, error: f64) -> f64 {
        (error * self.gain).abs()
    }

    /// `|error * gain|` capped at `max_speed`, then raised to `min_speed`.
    ///
    /// Applied in that order so a `min_speed` above `max_speed` wins instead of panicking
    /// the way `f64::clamp` would.
    pub fn magnitude(&self, error: f64) -> f64 {
        let mut magnitude = self.raw_magnitude(error);
        if magnitude > self.max_speed {
            magnitude = self.max_speed;
        }
        if magnitude < self.min_speed {
            magnitude = self.min_speed;
        }
        magnitude
    }
}

/// Mecanum drive with heading feedback
pub struct MecanumDrive<M, S, D> {
    wheels: Wheels<M>,
    sensor: S,
    diagnostics: D,
    last_powers: WheelPowers,
}

impl<M, S, D> MecanumDrive<M, S, D>
where
    M: WheelMotor,
    S: HeadingSensor,
    D: Diagnostics,
{
    pub fn new(wheels: Wheels<M>, sensor: S, diagnostics: D) -> Self {
        Self {
            wheels,
            sensor,
            diagnostics,
            last_powers: WheelPowers::zero(),
        }
    }

    /// Rotate in place toward `desired_angle` (degrees, clockwise-positive).
    ///
    /// There is no deadband: at zero error the wheels still turn at `min_speed`.
    /// Callers that want to stop on target pass `min_speed = 0` or check tolerance
    /// themselves.
    pub fn pivot_to_heading(
        &mut self,
        desired_angle: f64,
        gain: f64,
        active: bool,
        max_speed: f64,
        min_speed: f64,
    ) -> bool {
        if !active {
            self.stop();
            return false;
        }

        let params = PivotParams {
            gain,
            max_speed,
            min_speed,
        };
        let current = calibrated_heading(&mut self.sensor);
        let difference = wrap_heading_error(desired_angle - current);
        let magnitude = params.magnitude(difference);

        self.write(WheelPowers::pivot(magnitude, difference));

        self.diagnostics.record("pivot.magnitude", params.raw_magnitude(difference));
        self.diagnostics.record("pivot.power", magnitude);
        self.diagnostics.record("pivot.heading", current);
        self.diagnostics.record("pivot.desired", desired_angle);
        self.diagnostics.record("pivot.error", current - desired_angle);
        true
    }

    /// Translate toward `angle` at `speed`, adding `pivot_bias` straight into the mix.
    pub fn slide_with_pivot_bias(
        &mut self,
        angle: f64,
        speed: f64,
        active: bool,
        pivot_bias: f64,
    ) -> bool {
        if !active {
            self.stop();
            return false;
        }

        let (horizontal, vertical) = translation(angle, speed);
        self.write(mix(horizontal, vertical, pivot_bias));
        true
    }

    /// Translate toward `angle` at `speed` while steering back to `target_heading`.
    ///
    /// Output is not clamped; keep speed, heading error and gain in a range the
    /// actuators can take.
    pub fn slide_with_heading_hold(
        &mut self,
        angle: f64,
        speed: f64,
        active: bool,
        target_heading: f64,
        heading_gain: f64,
    ) -> bool {
        if !active {
            self.stop();
            return false;
        }

        let (horizontal, vertical) = translation(angle, speed);
        let current = calibrated_heading(&mut self.sensor);
        let correction = -((target_heading - current) * heading_gain);

        self.write(mix(horizontal, vertical, correction));

        self.diagnostics.record("slide.heading", current);
        self.diagnostics.record("slide.correction", correction);
        true
    }

    /// Run one tick of a wire command. `Stop` always zeroes and reports done.
    pub fn apply(&mut self, command: &DriveCommand, active: bool) -> bool {
        match *command {
            DriveCommand::Pivot {
                desired_angle,
                gain,
                max_speed,
                min_speed,
            } => self.pivot_to_heading(desired_angle, gain, active, max_speed, min_speed),
            DriveCommand::Slide {
                angle,
                speed,
                pivot_bias,
            } => self.slide_with_pivot_bias(angle, speed, active, pivot_bias),
            DriveCommand::SlideHold {
                angle,
                speed,
                target_heading,
                heading_gain,
            } => self.slide_with_heading_hold(angle, speed, active, target_heading, heading_gain),
            DriveCommand::Stop => {
                self.stop();
                false
            }
        }
    }

    /// Direct write to all four wheels, no validation
    pub fn set_all_wheel_powers(&mut self, rf: f64, rb: f64, lf: f64, lb: f64) {
        self.write(WheelPowers::new(rf, rb, lf, lb));
    }

    pub fn stop(&mut self) {
        self.write(WheelPowers::zero());
    }

    /// Reset every encoder, then leave the motors running without encoder feedback
    pub fn reset_encoders(&mut self) {
        info!("Resetting wheel encoders");
        self.wheels.set_run_mode(RunMode::StopAndResetEncoder);
        self.wheels.set_run_mode(RunMode::RunWithoutEncoder);
    }

    /// Powers written by the most recent primitive
    pub fn last_powers(&self) -> WheelPowers {
        self.last_powers
    }

    pub fn wheels(&self) -> &Wheels<M> {
        &self.wheels
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut D {
        &mut self.diagnostics
    }

    fn write(&mut self, powers: WheelPowers) {
        debug!(
            "Setting wheel powers: rf={}, rb={}, lf={}, lb={}",
            powers.rf, powers.rb, powers.lf, powers.lb
        );
        self.wheels.write(powers);
        self.last_powers = powers;
    }
}
