use declination::MotionSample;
use std::io;
use std::io::Write;

use crate::messages::{ImuMessage, Message};
use crate::traits::OutputController;

/// Writes each corrected sample as one `{"imu": ...}` JSON line, so the output can feed another
/// node.
pub struct JsonOutputController<W: Write + Send + 'static> {
	writer: W,
}

impl JsonOutputController<io::Stdout> {
	pub fn stdout() -> Self {
		JsonOutputController::new(io::stdout())
	}
}

impl<W: Write + Send + 'static> JsonOutputController<W> {
	pub fn new(writer: W) -> Self {
		JsonOutputController { writer }
	}
}

impl<W: Write + Send + 'static> OutputController<MotionSample> for JsonOutputController<W> {
	fn write_output(&mut self, output: MotionSample) -> anyhow::Result<()> {
		let message = Message::Imu(ImuMessage::from(&output));

		serde_json::to_writer(&mut self.writer, &message)?;
		writeln!(self.writer)?;
		self.writer.flush()?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use crate::messages::Message;
	use crate::output_controllers::json_output_controller::JsonOutputController;
	use crate::traits::OutputController;
	use approx::assert_relative_eq;
	use declination::MotionSample;
	use nalgebra::{UnitQuaternion, Vector3};
	use std::f64::consts::FRAC_PI_2;

	#[test]
	fn write_output_test() {
		let mut controller = JsonOutputController::new(Vec::<u8>::new());

		let mut sample = MotionSample::new(7.5, "base_link");
		sample.orientation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2).into_inner();

		controller.write_output(sample.clone()).unwrap();
		controller.write_output(MotionSample::new(7.6, "base_link")).unwrap();

		let written = String::from_utf8(controller.writer).unwrap();
		let lines: Vec<&str> = written.lines().collect();
		assert_eq!(lines.len(), 2);

		match serde_json::from_str::<Message>(lines[0]).unwrap() {
			Message::Imu(imu) => {
				let parsed = MotionSample::from(imu);
				assert_eq!(parsed.frame_id, "base_link");
				assert_eq!(parsed.stamp, 7.5);
				assert_relative_eq!(parsed.orientation, sample.orientation, epsilon = 1e-12);
			}
			other => panic!("Unexpected message {:?}", other),
		}
	}
}
