use std::io;
use std::io::BufRead;

use crate::messages::Message;
use crate::traits::InputController;

/// Reads one JSON message per line. Blank lines are skipped; malformed lines are reported and
/// skipped.
pub struct JsonInputController<R: BufRead + Send + 'static> {
	reader: R,
	line: String,
	line_number: usize,
}

impl JsonInputController<io::BufReader<io::Stdin>> {
	pub fn stdin() -> Self {
		JsonInputController::new(io::BufReader::new(io::stdin()))
	}
}

impl<R: BufRead + Send + 'static> JsonInputController<R> {
	pub fn new(reader: R) -> Self {
		JsonInputController {
			reader,
			line: String::new(),
			line_number: 0,
		}
	}
}

impl<R: BufRead + Send + 'static> InputController for JsonInputController<R> {
	type Input = Message;

	fn read_input(&mut self) -> anyhow::Result<Option<Message>> {
		loop {
			self.line.clear();

			let read = match self.reader.read_line(&mut self.line) {
				Ok(read) => read,
				// The offending line has been consumed, reading can go on.
				Err(e) if e.kind() == io::ErrorKind::InvalidData => {
					self.line_number += 1;
					return Err(anyhow!("Skipping malformed line {}: {}", self.line_number, e));
				}
				Err(e) => {
					error!("Failed to read input: {}", e);
					return Ok(None);
				}
			};

			if read == 0 {
				info!("End of input after {} lines", self.line_number);
				return Ok(None);
			}

			self.line_number += 1;

			if self.line.trim().is_empty() {
				continue;
			}

			return serde_json::from_str::<Message>(&self.line)
				.map(Some)
				.map_err(|e| anyhow!("Skipping malformed line {}: {}", self.line_number, e));
		}
	}
}
