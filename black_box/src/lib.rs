#[macro_use]
extern crate lazy_static;

use chrono::{DateTime, Local};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::{
	collections::VecDeque,
	fs::{File, OpenOptions},
	io,
	io::Write,
	path::{Path, PathBuf},
	thread,
	thread::JoinHandle,
	time::{Duration, Instant},
};

lazy_static! {
	static ref BLACK_BOX_CHANNEL: (Sender<Message>, Receiver<Message>) = unbounded::<Message>();
	static ref BLACK_BOX_LOGGER: BlackBoxLogger = BlackBoxLogger {
		start_instant: Instant::now()
	};
}

enum Message {
	Log(String),
	/// Acknowledged once every record queued before it is written.
	Flush(Option<Sender<()>>),
}

/// Process-wide log sink. Records are buffered by a dedicated thread, then written to the log file
/// and echoed on stderr. Stdout is left to the data stream.
pub struct BlackBox {
	file: File,
	path: PathBuf,
	buffer: VecDeque<String>,
}

impl BlackBox {
	pub fn new(directory: impl AsRef<Path>, prefix: &str) -> io::Result<Self> {
		let path = directory.as_ref().join(log_file_name(prefix, &Local::now()));

		let file = OpenOptions::new()
			.write(true)
			.create(true)
			.truncate(true)
			.open(&path)?;

		Ok(BlackBox {
			file,
			path,
			buffer: VecDeque::<String>::new(),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn try_flush(&mut self) {
		if let Err(e) = self.flush() {
			self.buffer.push_back(format!("Failed to flush black box: {}", e));
		}
	}

	fn flush(&mut self) -> io::Result<()> {
		while let Some(message) = self.buffer.pop_front() {
			eprintln!("{}", message);
			writeln!(self.file, "{}", message)?;
		}

		self.file.flush()
	}

	fn receive_loop(&mut self) {
		const RECEIVE_TIMEOUT: Duration = Duration::from_millis(500);
		const MAX_BUFFER_LEN: usize = 8;

		while let Ok(message) = BLACK_BOX_CHANNEL.1.recv_timeout(RECEIVE_TIMEOUT) {
			match message {
				Message::Log(content) => self.buffer.push_back(content),
				Message::Flush(ack) => {
					self.try_flush();

					if let Some(ack) = ack {
						let _ = ack.send(());
					}
				}
			}

			if self.buffer.len() > MAX_BUFFER_LEN {
				self.try_flush();
			}
		}

		if !self.buffer.is_empty() {
			self.try_flush();
		}
	}

	/// Installs the global logger and starts the writer thread. Fails if a logger is already set.
	pub fn spawn(mut self, level_filter: LevelFilter) -> Result<JoinHandle<()>, SetLoggerError> {
		log::set_logger(&*BLACK_BOX_LOGGER)?;
		log::set_max_level(level_filter);

		Ok(thread::spawn(move || loop {
			self.receive_loop()
		}))
	}
}

/// Writes every record logged so far and waits for the writer thread to confirm it.
///
/// Returns `false` when no confirmation came within `timeout`, for instance because the writer
/// thread was never spawned.
pub fn flush(timeout: Duration) -> bool {
	let (ack_sender, ack_receiver) = bounded::<()>(1);

	if BLACK_BOX_CHANNEL.0.send(Message::Flush(Some(ack_sender))).is_err() {
		return false;
	}

	ack_receiver.recv_timeout(timeout).is_ok()
}

fn log_file_name(prefix: &str, now: &DateTime<Local>) -> String {
	format!("{}_{}.log", prefix, now.format("%Y-%m-%d_%H-%M-%S"))
}

fn format_record(elapsed: Duration, record: &Record) -> String {
	if record.metadata().level() == Level::Error {
		format!(
			"[{:.3}][{:?}][{}] {} ({}:{})",
			elapsed.as_secs_f32(),
			record.level(),
			record.module_path().unwrap_or("unknown"),
			record.args(),
			record.file().unwrap_or("unknown"),
			record.line().unwrap_or(0)
		)
	} else {
		format!(
			"[{:.3}][{:?}][{}] {}",
			elapsed.as_secs_f32(),
			record.level(),
			record.module_path().unwrap_or("unknown"),
			record.args(),
		)
	}
}

struct BlackBoxLogger {
	start_instant: Instant,
}

impl Log for BlackBoxLogger {
	fn enabled(&self, metadata: &Metadata) -> bool {
		metadata.level() <= log::max_level()
	}

	fn log(&self, record: &Record) {
		if self.enabled(record.metadata()) {
			let formatted = format_record(self.start_instant.elapsed(), record);
			let _ = BLACK_BOX_CHANNEL.0.send(Message::Log(formatted));
		}
	}

	fn flush(&self) {
		let _ = BLACK_BOX_CHANNEL.0.send(Message::Flush(None));
	}
}
