// Drive module for the four-wheel mecanum base
//
// Provides:
// - Mecanum kinematics (polar drive vector + rotation -> wheel powers)
// - Collaborator traits for the heading sensor, wheel motors and diagnostics
// - Heading-correcting drive controller

pub mod controller;
pub mod hardware;
pub mod kinematics;

pub use controller::{MecanumDrive, PivotParams, Wheels};
pub use hardware::{
    calibrated_heading, Diagnostics, HeadingSensor, LatchedMotor, LatestHeading, RunMode,
    Telemetry, WheelMotor, HEADING_SIGN,
};
pub use kinematics::WheelPowers;
