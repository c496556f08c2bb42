pub mod madgwick;
pub mod mahony;

pub use madgwick::Madgwick;
pub use mahony::Mahony;

use gearvr_config::FusionConfig;
use glam::{DQuat, DVec3};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown fusion algorithm: {0:?}")]
    UnknownAlgorithm(String),
}

/// Selectable fusion algorithm, fixed for the filter's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Madgwick,
    Mahony,
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Madgwick" => Ok(Algorithm::Madgwick),
            "Mahony" => Ok(Algorithm::Mahony),
            other => Err(ConfigError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Euler decomposition of the current orientation.
///
/// Heading is measured from magnetic north going west (about the vertical
/// axis), pitch about the lateral axis, roll about the forward axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerAngles {
    pub heading: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl EulerAngles {
    pub fn to_degrees(self) -> EulerAngles {
        EulerAngles {
            heading: self.heading.to_degrees(),
            pitch: self.pitch.to_degrees(),
            roll: self.roll.to_degrees(),
        }
    }
}

/// Axis-angle form of the current orientation. The axis is zero when the
/// rotation angle is (numerically) zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAngle {
    pub axis: DVec3,
    pub angle: f64,
}

/// A running orientation estimate over one controller's sensor stream.
///
/// One instance per controller; updates must be serialized by the caller.
/// The two algorithm variants share this interface and are chosen at
/// construction.
#[derive(Debug, Clone)]
pub enum OrientationFilter {
    Madgwick(Madgwick),
    Mahony(Mahony),
}

impl OrientationFilter {
    pub fn madgwick(sample_interval: f64, beta: f64) -> Self {
        OrientationFilter::Madgwick(Madgwick::new(sample_interval, beta))
    }

    pub fn mahony(sample_interval: f64, kp: f64, ki: f64) -> Self {
        OrientationFilter::Mahony(Mahony::new(sample_interval, kp, ki))
    }

    /// Build a filter from configuration. Fails if the configured algorithm
    /// name is not one of the known variants.
    pub fn from_config(config: &FusionConfig) -> Result<Self, ConfigError> {
        let algorithm: Algorithm = config.algorithm.parse()?;
        let filter = match algorithm {
            Algorithm::Madgwick => Self::madgwick(config.sample_interval_s, config.beta),
            Algorithm::Mahony => Self::mahony(config.sample_interval_s, config.kp, config.ki),
        };
        tracing::info!(?algorithm, "Orientation filter created");
        Ok(filter)
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            OrientationFilter::Madgwick(_) => Algorithm::Madgwick,
            OrientationFilter::Mahony(_) => Algorithm::Mahony,
        }
    }

    /// Feed one sensor frame. `gyro` in rad/s; `mag` of `None` or zero runs
    /// the six-axis path; a nonzero `dt` (seconds since the previous frame)
    /// overrides the configured sample interval for this call.
    ///
    /// Never fails: degenerate inputs skip the affected correction step and
    /// the orientation simply stops being corrected until data returns.
    pub fn update(&mut self, gyro: DVec3, accel: DVec3, mag: Option<DVec3>, dt: Option<f64>) {
        match self {
            OrientationFilter::Madgwick(f) => f.update(gyro, accel, mag, dt),
            OrientationFilter::Mahony(f) => f.update(gyro, accel, mag, dt),
        }
    }

    /// Current orientation as a unit quaternion.
    pub fn quaternion(&self) -> DQuat {
        match self {
            OrientationFilter::Madgwick(f) => f.quaternion(),
            OrientationFilter::Mahony(f) => f.quaternion(),
        }
    }

    /// Inverse of the current quaternion, for the caller to hold as a
    /// re-zero reference. Premultiplying later readings by this value maps
    /// the current pose to identity. Filter state is not touched.
    pub fn zero_reference(&self) -> DQuat {
        self.quaternion().conjugate()
    }

    /// Orientation as a rotation axis and angle.
    pub fn axis_angle(&self) -> AxisAngle {
        let q = self.quaternion();
        let angle = 2.0 * q.w.clamp(-1.0, 1.0).acos();
        let sin_half = (angle / 2.0).sin();
        if sin_half.abs() < 1e-12 {
            AxisAngle {
                axis: DVec3::ZERO,
                angle,
            }
        } else {
            AxisAngle {
                axis: DVec3::new(q.x, q.y, q.z) / sin_half,
                angle,
            }
        }
    }

    /// Heading/pitch/roll in radians.
    pub fn euler_angles(&self) -> EulerAngles {
        let q = self.quaternion();
        let ww = q.w * q.w;
        let xx = q.x * q.x;
        let yy = q.y * q.y;
        let zz = q.z * q.z;
        EulerAngles {
            heading: (2.0 * (q.x * q.y + q.z * q.w)).atan2(xx - yy - zz + ww),
            // The argument can drift just past +/-1 after renormalisation.
            pitch: -(2.0 * (q.x * q.z - q.y * q.w)).clamp(-1.0, 1.0).asin(),
            roll: (2.0 * (q.y * q.z + q.x * q.w)).atan2(-xx - yy + zz + ww),
        }
    }

    /// Heading/pitch/roll in degrees.
    pub fn euler_angles_degrees(&self) -> EulerAngles {
        self.euler_angles().to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn unknown_algorithm_name_fails_construction() {
        let mut config = FusionConfig::default();
        config.algorithm = "Kalman".to_string();
        assert_eq!(
            OrientationFilter::from_config(&config).unwrap_err(),
            ConfigError::UnknownAlgorithm("Kalman".to_string())
        );
    }

    #[test]
    fn config_selects_the_variant() {
        let mut config = FusionConfig::default();
        let filter = OrientationFilter::from_config(&config).unwrap();
        assert_eq!(filter.algorithm(), Algorithm::Madgwick);

        config.algorithm = "Mahony".to_string();
        let filter = OrientationFilter::from_config(&config).unwrap();
        assert_eq!(filter.algorithm(), Algorithm::Mahony);
    }

    #[test]
    fn starts_at_identity() {
        let filter = OrientationFilter::madgwick(0.02, 0.352);
        assert_eq!(filter.quaternion(), DQuat::IDENTITY);
    }

    #[test]
    fn at_rest_frames_do_not_drift() {
        // Two frames 0.06868 s apart with zero rotation and zero net force
        // must leave the estimate at identity.
        let mut filter = OrientationFilter::madgwick(0.02, 0.352);
        filter.update(DVec3::ZERO, DVec3::ZERO, None, None);
        filter.update(DVec3::ZERO, DVec3::ZERO, None, Some(0.06868));

        let q = filter.quaternion();
        assert!((q.w - 1.0).abs() < 1e-12);
        assert!(q.x.abs() < 1e-12);
        assert!(q.y.abs() < 1e-12);
        assert!(q.z.abs() < 1e-12);
    }

    #[test]
    fn euler_angles_of_identity_are_zero() {
        let filter = OrientationFilter::mahony(0.02, 1.0, 0.0);
        let e = filter.euler_angles();
        assert_eq!(e.heading, 0.0);
        assert_eq!(e.pitch, 0.0);
        assert_eq!(e.roll, 0.0);
    }

    #[test]
    fn euler_heading_for_quarter_turn_about_z() {
        let mut filter = OrientationFilter::madgwick(1.0, 0.352);
        // Integrate pi/2 about z in small steps, gyro only.
        for _ in 0..1000 {
            filter.update(
                DVec3::new(0.0, 0.0, FRAC_PI_2 / 1000.0),
                DVec3::ZERO,
                None,
                Some(1.0),
            );
        }
        let e = filter.euler_angles();
        assert!((e.heading - FRAC_PI_2).abs() < 1e-3);
        assert!(e.pitch.abs() < 1e-6);
        assert!(e.roll.abs() < 1e-6);

        let deg = filter.euler_angles_degrees();
        assert!((deg.heading - 90.0).abs() < 0.1);
    }

    #[test]
    fn axis_angle_of_identity_is_zero() {
        let filter = OrientationFilter::madgwick(0.02, 0.352);
        let aa = filter.axis_angle();
        assert_eq!(aa.angle, 0.0);
        assert_eq!(aa.axis, DVec3::ZERO);
    }

    #[test]
    fn axis_angle_recovers_rotation_axis() {
        let mut filter = OrientationFilter::mahony(1.0, 1.0, 0.0);
        for _ in 0..1000 {
            filter.update(
                DVec3::new(FRAC_PI_2 / 1000.0, 0.0, 0.0),
                DVec3::ZERO,
                None,
                Some(1.0),
            );
        }
        let aa = filter.axis_angle();
        assert!((aa.angle - FRAC_PI_2).abs() < 1e-3);
        assert!((aa.axis.x - 1.0).abs() < 1e-6);
        assert!(aa.axis.y.abs() < 1e-6);
        assert!(aa.axis.z.abs() < 1e-6);
    }

    #[test]
    fn zero_reference_cancels_current_pose() {
        let mut filter = OrientationFilter::madgwick(0.01, 0.352);
        for _ in 0..20 {
            filter.update(
                DVec3::new(0.4, -0.1, 0.25),
                DVec3::new(0.02, 0.01, 1.0),
                None,
                None,
            );
        }
        let zero_ref = filter.zero_reference();
        let relative = zero_ref * filter.quaternion();
        assert!((relative.w.abs() - 1.0).abs() < 1e-9);
        assert!(relative.x.abs() < 1e-9);
        assert!(relative.y.abs() < 1e-9);
        assert!(relative.z.abs() < 1e-9);
    }
}
