use nalgebra::{Isometry3, Quaternion, Vector3};
use std::sync::Arc;

use crate::{Result, Timestamp};

/// Rigid transform mapping data expressed in a source frame into a target frame:
/// `p_target = pose * p_source`.
pub type Pose = Isometry3<f64>;

/// Resolves the pose between two named frames at a given time.
pub trait PoseLookup: Send + Sync {
	/// Returns the pose that maps `source_frame` data into `target_frame`, or
	/// `Error::TransformUnavailable`.
	fn lookup_transform(&self, target_frame: &str, source_frame: &str, time: Timestamp) -> Result<Pose>;

	/// Frame rotation only.
	fn transform_orientation(&self, pose: &Pose, orientation: &Quaternion<f64>) -> Quaternion<f64> {
		pose.rotation.quaternion() * orientation
	}

	/// Free vector: the translation is not applied.
	fn transform_vector(&self, pose: &Pose, vector: &Vector3<f64>) -> Vector3<f64> {
		pose.rotation * vector
	}
}

impl<T: PoseLookup + ?Sized> PoseLookup for &T {
	fn lookup_transform(&self, target_frame: &str, source_frame: &str, time: Timestamp) -> Result<Pose> {
		(**self).lookup_transform(target_frame, source_frame, time)
	}

	fn transform_orientation(&self, pose: &Pose, orientation: &Quaternion<f64>) -> Quaternion<f64> {
		(**self).transform_orientation(pose, orientation)
	}

	fn transform_vector(&self, pose: &Pose, vector: &Vector3<f64>) -> Vector3<f64> {
		(**self).transform_vector(pose, vector)
	}
}

impl<T: PoseLookup + ?Sized> PoseLookup for Arc<T> {
	fn lookup_transform(&self, target_frame: &str, source_frame: &str, time: Timestamp) -> Result<Pose> {
		(**self).lookup_transform(target_frame, source_frame, time)
	}

	fn transform_orientation(&self, pose: &Pose, orientation: &Quaternion<f64>) -> Quaternion<f64> {
		(**self).transform_orientation(pose, orientation)
	}

	fn transform_vector(&self, pose: &Pose, vector: &Vector3<f64>) -> Vector3<f64> {
		(**self).transform_vector(pose, vector)
	}
}
