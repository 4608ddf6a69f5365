use crate::Timestamp;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
	/// The pose between two frames could not be resolved at the requested time.
	#[error("No transform from \"{source_frame}\" to \"{target_frame}\" at t = {time:.3} s: {reason}")]
	TransformUnavailable {
		target_frame: String,
		source_frame: String,
		time: Timestamp,
		reason: String,
	},

	#[error("Invalid orientation quaternion [{x}, {y}, {z}, {w}]")]
	InvalidQuaternion { x: f64, y: f64, z: f64, w: f64 },

	#[error("Invalid sample stamp {0} s")]
	InvalidStamp(Timestamp),

	#[error("Invalid frame id \"{0}\"")]
	InvalidFrameId(String),

	#[error("Invalid transform: {0}")]
	InvalidTransform(String),

	#[error("Invalid declination {0} rad")]
	InvalidDeclination(f64),

	#[error("Invalid rotation axis \"{0}\" (expected x, y or z)")]
	InvalidAxis(String),
}

impl Error {
	pub fn transform_unavailable(target_frame: &str,
								 source_frame: &str,
								 time: Timestamp,
								 reason: impl Into<String>) -> Self {
		Error::TransformUnavailable {
			target_frame: target_frame.to_owned(),
			source_frame: source_frame.to_owned(),
			time,
			reason: reason.into(),
		}
	}

	pub fn is_transform_unavailable(&self) -> bool {
		matches!(self, Error::TransformUnavailable { .. })
	}
}
