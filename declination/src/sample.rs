use nalgebra::{Quaternion, Vector3};
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::{Error, Result};

/// Seconds. A zero timestamp passed to a pose lookup means "latest available".
pub type Timestamp = f64;

/// Maximum accepted deviation of an orientation's norm from 1.
pub const ORIENTATION_NORM_TOLERANCE: f64 = 1e-3;

/// Name of a coordinate frame. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameId(String);

impl FrameId {
	pub fn new(name: impl Into<String>) -> Result<Self> {
		let name = name.into();

		if name.trim().is_empty() {
			return Err(Error::InvalidFrameId(name));
		}

		Ok(FrameId(name))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Display for FrameId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl AsRef<str> for FrameId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// One inertial measurement: orientation, angular velocity and linear acceleration, all expressed
/// in `frame_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionSample {
	pub stamp: Timestamp,
	pub frame_id: String,
	pub orientation: Quaternion<f64>,
	pub angular_velocity: Vector3<f64>,
	pub linear_acceleration: Vector3<f64>,
}

impl MotionSample {
	pub fn new(stamp: Timestamp, frame_id: impl Into<String>) -> Self {
		MotionSample {
			stamp,
			frame_id: frame_id.into(),
			orientation: Quaternion::identity(),
			angular_velocity: Vector3::zeros(),
			linear_acceleration: Vector3::zeros(),
		}
	}

	/// Rejects samples whose stamp is not finite, whose frame id is empty or whose orientation is
	/// not a finite unit quaternion.
	pub fn validate(&self) -> Result<()> {
		if !self.stamp.is_finite() {
			return Err(Error::InvalidStamp(self.stamp));
		}

		if self.frame_id.trim().is_empty() {
			return Err(Error::InvalidFrameId(self.frame_id.clone()));
		}

		let q = &self.orientation;
		let finite = q.coords.iter().all(|c| c.is_finite());

		if !finite || (q.norm() - 1.).abs() > ORIENTATION_NORM_TOLERANCE {
			return Err(Error::InvalidQuaternion { x: q.i, y: q.j, z: q.k, w: q.w });
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use crate::{Error, FrameId, MotionSample};
	use nalgebra::Quaternion;

	#[test]
	fn frame_id_test() {
		assert_eq!(FrameId::new("base_link").unwrap().as_str(), "base_link");
		assert_eq!(FrameId::new(""), Err(Error::InvalidFrameId(String::new())));
		assert!(FrameId::new("  ").is_err());
	}

	#[test]
	fn validate_test() {
		let mut sample = MotionSample::new(1.5, "imu_link");
		assert!(sample.validate().is_ok());

		sample.orientation = Quaternion::new(0.5, 0.5, 0.5, 0.5);
		assert!(sample.validate().is_ok());

		sample.orientation = Quaternion::new(0., 0., 0., 0.);
		assert!(matches!(sample.validate(), Err(Error::InvalidQuaternion { .. })));

		sample.orientation = Quaternion::new(f64::NAN, 0., 0., 0.);
		assert!(matches!(sample.validate(), Err(Error::InvalidQuaternion { .. })));

		sample.orientation = Quaternion::identity();
		sample.frame_id = String::new();
		assert!(matches!(sample.validate(), Err(Error::InvalidFrameId(_))));

		sample.frame_id = String::from("imu_link");
		sample.stamp = f64::INFINITY;
		assert_eq!(sample.validate(), Err(Error::InvalidStamp(f64::INFINITY)));

		sample.stamp = f64::NAN;
		assert!(matches!(sample.validate(), Err(Error::InvalidStamp(stamp)) if stamp.is_nan()));
	}
}
