use crossbeam_channel::{Receiver, Sender};
use std::{fmt::Display, thread, thread::JoinHandle, time::Duration};

/// Controllers that import external data.
pub trait InputController
	where Self: Sized + Send + 'static {
	type Input: Send + 'static;

	/// Returns `Ok(None)` once the source is exhausted.
	fn read_input(&mut self) -> anyhow::Result<Option<Self::Input>>;

	fn read_loop(&mut self, input_sender: Sender<Self::Input>) {
		loop {
			match self.read_input() {
				Ok(Some(input)) => {
					if input_sender.send(input).is_err() {
						break;
					}
				}
				Ok(None) => break,
				Err(e) => error!("{}", e),
			}
		}
	}

	fn spawn(mut self, input_sender: Sender<Self::Input>) -> JoinHandle<()> {
		thread::spawn(move || self.read_loop(input_sender))
	}
}

/// Controllers that route inputs to their consumers.
pub trait Dispatcher<T: Send + 'static>
	where Self: Sized + Send + 'static {
	fn dispatch(&self, input: T) -> anyhow::Result<()>;

	fn dispatch_loop(&self, receiver: Receiver<T>) {
		for input in receiver {
			if let Err(e) = self.dispatch(input) {
				error!("{}", e);
			}
		}
	}

	fn spawn(self, receiver: Receiver<T>) -> JoinHandle<()> {
		thread::spawn(move || self.dispatch_loop(receiver))
	}
}

/// Controllers that export data.
pub trait OutputController<T: Send + 'static>
	where Self: Sized + Send + 'static {
	fn write_output(&mut self, output: T) -> anyhow::Result<()>;

	fn spawn(mut self, output_receiver: Receiver<T>) -> JoinHandle<()> {
		thread::spawn(move || {
			for output in output_receiver.iter() {
				self.write_output(output)
					.map_err(|e| error!("Failed to write output: {}", e))
					.unwrap_or_default();
			}
		})
	}
}

/// Controllers that log internal data.
pub trait Monitor<T: Display>
	where Self: Sized + Send + 'static {
	/// Duration to wait between two successive `monitor` calls.
	fn delay(&self) -> Duration;

	/// Returns `None` once there is nothing left to monitor.
	fn monitor(&mut self) -> Option<T>;

	fn monitor_loop(&mut self) {
		while let Some(data) = self.monitor() {
			info!("{}", data);
			thread::sleep(self.delay());
		}
	}

	fn spawn(mut self) -> JoinHandle<()> {
		thread::spawn(move || self.monitor_loop())
	}
}
