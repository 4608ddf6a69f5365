use declination::{MotionSample, StampedTransform};
use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Tolerated quaternion norm below which a transform rotation is rejected.
const MIN_ROTATION_NORM: f64 = 1e-6;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct QuaternionMessage {
	pub x: f64,
	pub y: f64,
	pub z: f64,
	pub w: f64,
}

impl Default for QuaternionMessage {
	fn default() -> Self {
		QuaternionMessage { x: 0., y: 0., z: 0., w: 1. }
	}
}

impl From<QuaternionMessage> for Quaternion<f64> {
	fn from(q: QuaternionMessage) -> Self {
		Quaternion::new(q.w, q.x, q.y, q.z)
	}
}

impl From<&Quaternion<f64>> for QuaternionMessage {
	fn from(q: &Quaternion<f64>) -> Self {
		QuaternionMessage { x: q.i, y: q.j, z: q.k, w: q.w }
	}
}

#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct Vector3Message {
	pub x: f64,
	pub y: f64,
	pub z: f64,
}

impl From<Vector3Message> for Vector3<f64> {
	fn from(v: Vector3Message) -> Self {
		Vector3::new(v.x, v.y, v.z)
	}
}

impl From<&Vector3<f64>> for Vector3Message {
	fn from(v: &Vector3<f64>) -> Self {
		Vector3Message { x: v.x, y: v.y, z: v.z }
	}
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImuMessage {
	pub stamp: f64,
	pub frame_id: String,
	pub orientation: QuaternionMessage,
	#[serde(default)]
	pub angular_velocity: Vector3Message,
	#[serde(default)]
	pub linear_acceleration: Vector3Message,
}

impl From<ImuMessage> for MotionSample {
	fn from(imu: ImuMessage) -> Self {
		MotionSample {
			stamp: imu.stamp,
			frame_id: imu.frame_id,
			orientation: imu.orientation.into(),
			angular_velocity: imu.angular_velocity.into(),
			linear_acceleration: imu.linear_acceleration.into(),
		}
	}
}

impl From<&MotionSample> for ImuMessage {
	fn from(sample: &MotionSample) -> Self {
		ImuMessage {
			stamp: sample.stamp,
			frame_id: sample.frame_id.clone(),
			orientation: (&sample.orientation).into(),
			angular_velocity: (&sample.angular_velocity).into(),
			linear_acceleration: (&sample.linear_acceleration).into(),
		}
	}
}

/// Pose of `child_frame` in `parent_frame`. Also used for the static transforms of the
/// configuration file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransformMessage {
	#[serde(default)]
	pub stamp: f64,
	pub parent_frame: String,
	pub child_frame: String,
	#[serde(default)]
	pub translation: Vector3Message,
	#[serde(default)]
	pub rotation: QuaternionMessage,
	#[serde(default, rename = "static")]
	pub is_static: bool,
}

impl TransformMessage {
	pub fn to_stamped(&self) -> anyhow::Result<StampedTransform> {
		let rotation = UnitQuaternion::try_new(self.rotation.into(), MIN_ROTATION_NORM)
			.ok_or_else(|| anyhow!("Degenerate rotation {:?} from \"{}\" to \"{}\"",
								   self.rotation, self.child_frame, self.parent_frame))?;

		let translation: Vector3<f64> = self.translation.into();

		Ok(StampedTransform {
			stamp: self.stamp,
			parent_frame: self.parent_frame.clone(),
			child_frame: self.child_frame.clone(),
			transform: Isometry3::from_parts(Translation3::from(translation), rotation),
		})
	}
}

/// One line of the input stream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Message {
	Imu(ImuMessage),
	/// Radians.
	Declination(f64),
	Transform(TransformMessage),
}
