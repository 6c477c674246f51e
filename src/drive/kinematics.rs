// Mecanum kinematics for a four-wheel base
// Converts a joystick-style (angle, speed) vector plus a rotation term into wheel powers.
//
// Angle convention: 0° is forward (pure vertical), positive angles rotate clockwise
// toward +horizontal. This is the joystick heading convention, not math-east CCW.

use std::f64::consts::PI;

/// Scale applied to every mixed wheel term so translation + rotation stays within drive range
const MIX_SCALE: f64 = 0.5;

/// Signed power commands for the four wheels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelPowers {
    pub rf: f64, // right front
    pub rb: f64, // right back
    pub lf: f64, // left front
    pub lb: f64, // left back
}

impl WheelPowers {
    pub fn new(rf: f64, rb: f64, lf: f64, lb: f64) -> Self {
        Self { rf, rb, lf, lb }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// In-place rotation: the right and left sides spin opposite directions.
    ///
    /// A negative heading error (current heading past the target) drives the right
    /// side forward and the left side backward; anything else does the reverse.
    pub fn pivot(magnitude: f64, error: f64) -> Self {
        if error < 0.0 {
            Self::new(magnitude, magnitude, -magnitude, -magnitude)
        } else {
            Self::new(-magnitude, -magnitude, magnitude, magnitude)
        }
    }
}

/// Split a polar drive vector into (horizontal, vertical) components
pub fn polar_to_cartesian(angle_deg: f64, speed: f64) -> (f64, f64) {
    let angle_rad = angle_deg * (PI / 180.0);
    (angle_rad.sin() * speed, angle_rad.cos() * speed)
}

/// How far a stick is pushed from its center
pub fn cartesian_to_radius(x: f64, y: f64) -> f64 {
    (x * x + y * y).sqrt()
}

/// Stick angle in degrees, 0 = forward
///
/// Arguments are (x, y) in that order so the result shares the convention of
/// [`polar_to_cartesian`].
pub fn cartesian_to_angle_degrees(x: f64, y: f64) -> f64 {
    x.atan2(y) * (180.0 / PI)
}

/// Round to two decimal places.
///
/// Ties on the scaled value round up toward +∞, so `0.125 -> 0.13` and
/// `-0.005 -> 0.0`.
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

/// Translation components with floating-point jitter rounded away
pub fn translation(angle_deg: f64, speed: f64) -> (f64, f64) {
    let (horizontal, vertical) = polar_to_cartesian(angle_deg, speed);
    (round_to_hundredths(horizontal), round_to_hundredths(vertical))
}

/// Wrap a heading error so the shortest rotation wins.
///
/// Errors already in [-180, 180] pass through untouched; anything else is shifted by
/// whole turns into (-180, 180].
pub fn wrap_heading_error(difference: f64) -> f64 {
    if (-180.0..=180.0).contains(&difference) {
        return difference;
    }
    180.0 - (180.0 - difference).rem_euclid(360.0)
}

/// Map any absolute heading into [-180, 180)
pub fn normalize_heading(degrees: f64) -> f64 {
    (degrees + 180.0).rem_euclid(360.0) - 180.0
}

/// Move an absolute target heading by `step` degrees, staying in [-180, 180)
///
/// Heading hold does not wrap its error, so targets handed to it must stay in range.
pub fn step_heading(target: f64, step: f64) -> f64 {
    normalize_heading(target + step)
}

/// Standard mecanum mix of a translation and a rotation term
pub fn mix(horizontal: f64, vertical: f64, rotation: f64) -> WheelPowers {
    WheelPowers {
        rf: ((vertical - horizontal) + rotation) * MIX_SCALE,
        rb: ((vertical + horizontal) + rotation) * MIX_SCALE,
        lf: ((vertical + horizontal) - rotation) * MIX_SCALE,
        lb: ((vertical - horizontal) - rotation) * MIX_SCALE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn test_forward_is_pure_vertical() {
        let (h, v) = polar_to_cartesian(0.0, 1.0);
        assert!(close(h, 0.0));
        assert!(close(v, 1.0));
    }

    #[test]
    fn test_clockwise_is_positive_horizontal() {
        let (h, v) = polar_to_cartesian(90.0, 0.8);
        assert!(close(h, 0.8));
        assert!(v.abs() < 1e-12);
    }

    #[test]
    fn test_polar_round_trip() {
        // Angles inside (-180, 180] come back as-is; others come back mod 360
        for &angle in &[-170.0, -90.0, -45.0, 0.0, 30.0, 90.0, 135.0, 180.0, 270.0] {
            for &speed in &[0.25, 0.5, 1.0] {
                let (x, y) = polar_to_cartesian(angle, speed);
                let back = cartesian_to_angle_degrees(x, y);
                let radius = cartesian_to_radius(x, y);

                let delta = (back - angle).rem_euclid(360.0);
                assert!(
                    delta < 1e-6 || (360.0 - delta) < 1e-6,
                    "angle {} came back as {}",
                    angle,
                    back
                );
                assert!(close(radius, speed), "speed {} came back as {}", speed, radius);
            }
        }
    }

    #[test]
    fn test_negative_speed_recovers_magnitude() {
        let (x, y) = polar_to_cartesian(45.0, -0.5);
        assert!(close(cartesian_to_radius(x, y), 0.5));
    }

    #[test]
    fn test_stick_angle_and_radius() {
        assert!(close(cartesian_to_angle_degrees(1.0, 0.0), 90.0));
        assert!(close(cartesian_to_radius(1.0, 0.0), 1.0));
        assert!(close(cartesian_to_angle_degrees(0.0, -1.0).abs(), 180.0));
        assert!(close(cartesian_to_radius(3.0, 4.0), 5.0));
    }

    #[test]
    fn test_round_to_hundredths() {
        assert_eq!(round_to_hundredths(0.12345), 0.12);
        assert_eq!(round_to_hundredths(0.125), 0.13);
        assert_eq!(round_to_hundredths(-0.126), -0.13);
        // Ties go up, so this lands on zero rather than -0.01
        assert_eq!(round_to_hundredths(-0.005), 0.0);
    }

    #[test]
    fn test_translation_damps_jitter() {
        // cos(90°) is ~6e-17, rounding removes it
        let (h, v) = translation(90.0, 1.0);
        assert_eq!(h, 1.0);
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_wrap_heading_error() {
        assert_eq!(wrap_heading_error(350.0), -10.0);
        assert_eq!(wrap_heading_error(-350.0), 10.0);
        assert_eq!(wrap_heading_error(180.0), 180.0);
        assert_eq!(wrap_heading_error(-180.0), -180.0);
        assert_eq!(wrap_heading_error(45.0), 45.0);
        assert_eq!(wrap_heading_error(725.0), 5.0);
    }

    #[test]
    fn test_wrap_survives_non_finite() {
        assert!(wrap_heading_error(f64::INFINITY).is_nan());
        assert!(wrap_heading_error(f64::NAN).is_nan());
    }

    #[test]
    fn test_normalize_heading() {
        assert_eq!(normalize_heading(0.0), 0.0);
        assert_eq!(normalize_heading(190.0), -170.0);
        assert_eq!(normalize_heading(-190.0), 170.0);
        assert_eq!(normalize_heading(180.0), -180.0);
        assert_eq!(normalize_heading(720.0 + 30.0), 30.0);
    }

    #[test]
    fn test_step_heading_stays_in_range() {
        let mut target = 0.0;
        for expected in [90.0, -180.0, -90.0, 0.0, 90.0] {
            target = step_heading(target, 90.0);
            assert_eq!(target, expected);
        }
        for expected in [0.0, -90.0, -180.0, 90.0] {
            target = step_heading(target, -90.0);
            assert_eq!(target, expected);
        }
    }

    #[test]
    fn test_mix_forward() {
        let (h, v) = translation(0.0, 1.0);
        let wheels = mix(h, v, 0.0);
        assert_eq!(wheels, WheelPowers::new(0.5, 0.5, 0.5, 0.5));
    }

    #[test]
    fn test_mix_strafe() {
        let (h, v) = translation(90.0, 1.0);
        let wheels = mix(h, v, 0.0);
        assert_eq!(wheels, WheelPowers::new(-0.5, 0.5, 0.5, -0.5));
    }

    #[test]
    fn test_mix_rotation_only() {
        // Positive rotation spins the right side forward and the left side back
        let wheels = mix(0.0, 0.0, 0.4);
        assert_eq!(wheels, WheelPowers::new(0.2, 0.2, -0.2, -0.2));
    }

    #[test]
    fn test_pivot_sides_oppose() {
        assert_eq!(
            WheelPowers::pivot(0.3, -5.0),
            WheelPowers::new(0.3, 0.3, -0.3, -0.3)
        );
        assert_eq!(
            WheelPowers::pivot(0.3, 5.0),
            WheelPowers::new(-0.3, -0.3, 0.3, 0.3)
        );
        // Zero error takes the non-negative branch
        assert_eq!(
            WheelPowers::pivot(0.1, 0.0),
            WheelPowers::new(-0.1, -0.1, 0.1, 0.1)
        );
    }
}
