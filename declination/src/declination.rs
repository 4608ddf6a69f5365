use crossbeam_utils::atomic::AtomicCell;
use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};
use std::convert::TryFrom;
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::Error;

/// Axis of the reference frame the declination rotates about.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Axis {
	X,
	Y,
	Z,
}

impl Axis {
	pub fn unit_vector(self) -> Unit<Vector3<f64>> {
		match self {
			Axis::X => Vector3::x_axis(),
			Axis::Y => Vector3::y_axis(),
			Axis::Z => Vector3::z_axis(),
		}
	}
}

impl Default for Axis {
	/// Vertical axis of ENU frames.
	fn default() -> Self {
		Axis::Z
	}
}

impl TryFrom<&str> for Axis {
	type Error = Error;

	fn try_from(name: &str) -> Result<Self, Self::Error> {
		Ok(match name.trim().to_ascii_lowercase().as_str() {
			"x" => Axis::X,
			"y" => Axis::Y,
			"z" => Axis::Z,
			_ => return Err(Error::InvalidAxis(name.to_owned())),
		})
	}
}

impl Display for Axis {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let name = match self {
			Axis::X => "x",
			Axis::Y => "y",
			Axis::Z => "z",
		};

		write!(f, "{}", name)
	}
}

/// Rotation by `angle` radians about `axis`. Replaced as a whole, never mutated.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DeclinationOffset {
	pub angle: f64,
	pub axis: Axis,
	pub rotation: UnitQuaternion<f64>,
}

impl DeclinationOffset {
	pub fn from_angle(axis: Axis, angle: f64) -> Self {
		DeclinationOffset {
			angle,
			axis,
			rotation: UnitQuaternion::from_axis_angle(&axis.unit_vector(), angle),
		}
	}

	/// Returns `offset * orientation`: the offset acts in the reference frame, after the
	/// orientation.
	pub fn compose_with(&self, orientation: &Quaternion<f64>) -> Quaternion<f64> {
		self.rotation.quaternion() * orientation
	}
}

/// Holds the current declination offset. Written by the declination update path, read by every
/// sample; both sides see the offset as a single value.
pub struct DeclinationCorrector {
	current: AtomicCell<DeclinationOffset>,
}

impl DeclinationCorrector {
	pub fn new(axis: Axis, initial_angle: f64) -> Self {
		DeclinationCorrector {
			current: AtomicCell::new(DeclinationOffset::from_angle(axis, initial_angle)),
		}
	}

	pub fn axis(&self) -> Axis {
		self.current.load().axis
	}

	pub fn offset(&self) -> DeclinationOffset {
		self.current.load()
	}

	pub fn set_offset(&self, angle: f64) {
		let axis = self.axis();
		self.current.store(DeclinationOffset::from_angle(axis, angle));
	}

	pub fn apply(&self, orientation: &Quaternion<f64>) -> Quaternion<f64> {
		self.current.load().compose_with(orientation)
	}
}
