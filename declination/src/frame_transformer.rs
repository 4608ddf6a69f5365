use crate::{MotionSample, PoseLookup, Result};

/// Re-expresses `sample` in `target_frame` at the sample's own timestamp.
///
/// The orientation is rotated as a frame orientation, the angular velocity and the linear
/// acceleration as free vectors: the translation between both frames is not applied. Fails with
/// `Error::TransformUnavailable` when `lookup` cannot resolve the pose; nothing is retried.
pub fn transform<L: PoseLookup + ?Sized>(sample: &MotionSample,
										 target_frame: &str,
										 lookup: &L) -> Result<MotionSample> {
	let source_frame = sample.frame_id.as_str();
	let stamp = sample.stamp;

	let pose = lookup.lookup_transform(target_frame, source_frame, stamp)?;

	Ok(MotionSample {
		stamp,
		frame_id: target_frame.to_owned(),
		orientation: lookup.transform_orientation(&pose, &sample.orientation),
		angular_velocity: lookup.transform_vector(&pose, &sample.angular_velocity),
		linear_acceleration: lookup.transform_vector(&pose, &sample.linear_acceleration),
	})
}
