use crossbeam_channel::Sender;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::{transform, DeclinationCorrector, Error, FrameId, MotionSample, PoseLookup, Result};

/// Output boundary of the pipeline.
pub trait Sink: Send + Sync {
	fn emit(&self, sample: MotionSample) -> anyhow::Result<()>;
}

impl Sink for Sender<MotionSample> {
	fn emit(&self, sample: MotionSample) -> anyhow::Result<()> {
		self.send(sample)?;
		Ok(())
	}
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct PipelineStatistics {
	pub received: u64,
	pub emitted: u64,
	pub dropped_unavailable: u64,
	pub dropped_invalid: u64,
	pub emit_failures: u64,
	pub declination_updates: u64,
	pub rejected_declinations: u64,
}

impl Display for PipelineStatistics {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f,
			   "Samples received: {}, \
			   emitted: {}, \
			   dropped (no transform): {}, \
			   dropped (invalid): {}, \
			   emit failures: {}, \
			   declination updates: {} ({} rejected)",
			   self.received,
			   self.emitted,
			   self.dropped_unavailable,
			   self.dropped_invalid,
			   self.emit_failures,
			   self.declination_updates,
			   self.rejected_declinations)
	}
}

#[derive(Default)]
struct Counters {
	received: AtomicU64,
	emitted: AtomicU64,
	dropped_unavailable: AtomicU64,
	dropped_invalid: AtomicU64,
	emit_failures: AtomicU64,
	declination_updates: AtomicU64,
	rejected_declinations: AtomicU64,
}

impl Counters {
	fn increment(counter: &AtomicU64) {
		counter.fetch_add(1, Ordering::Relaxed);
	}
}

/// Moves each sample into the target frame, corrects its orientation by the current declination
/// and hands it to the sink.
///
/// `on_sample` and `on_declination_update` may be called concurrently from different threads.
pub struct Pipeline<L: PoseLookup, S: Sink> {
	target_frame: FrameId,
	lookup: L,
	corrector: Arc<DeclinationCorrector>,
	sink: S,
	counters: Counters,
}

impl<L: PoseLookup, S: Sink> Pipeline<L, S> {
	pub fn new(target_frame: FrameId, lookup: L, corrector: Arc<DeclinationCorrector>, sink: S) -> Self {
		Pipeline {
			target_frame,
			lookup,
			corrector,
			sink,
			counters: Counters::default(),
		}
	}

	pub fn target_frame(&self) -> &FrameId {
		&self.target_frame
	}

	pub fn corrector(&self) -> &Arc<DeclinationCorrector> {
		&self.corrector
	}

	/// Validates, transforms and corrects one sample without emitting it.
	///
	/// Only the orientation is corrected; angular velocity and linear acceleration are left as the
	/// frame transform produced them.
	pub fn process(&self, sample: &MotionSample) -> Result<MotionSample> {
		sample.validate()?;

		let mut output = transform(sample, self.target_frame.as_str(), &self.lookup)?;
		output.orientation = self.corrector.apply(&output.orientation);

		Ok(output)
	}

	/// Returns whether the sample was emitted. Failures are logged and the sample is dropped.
	pub fn on_sample(&self, sample: MotionSample) -> bool {
		Counters::increment(&self.counters.received);

		let output = match self.process(&sample) {
			Ok(output) => output,
			Err(e) => {
				if e.is_transform_unavailable() {
					Counters::increment(&self.counters.dropped_unavailable);
				} else {
					Counters::increment(&self.counters.dropped_invalid);
				}

				warn!("Dropping sample stamped {:.3} s: {}", sample.stamp, e);
				return false;
			}
		};

		trace!("{:?}", &output);

		match self.sink.emit(output) {
			Ok(()) => {
				Counters::increment(&self.counters.emitted);
				true
			}
			Err(e) => {
				Counters::increment(&self.counters.emit_failures);
				error!("Failed to emit sample: {}", e);
				false
			}
		}
	}

	pub fn on_declination_update(&self, angle: f64) -> Result<()> {
		if !angle.is_finite() {
			Counters::increment(&self.counters.rejected_declinations);
			return Err(Error::InvalidDeclination(angle));
		}

		self.corrector.set_offset(angle);
		Counters::increment(&self.counters.declination_updates);

		info!("Declination set to {:.5} rad ({:.2}°) about {}", angle, angle.to_degrees(), self.corrector.axis());

		Ok(())
	}

	pub fn statistics(&self) -> PipelineStatistics {
		let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);

		PipelineStatistics {
			received: load(&self.counters.received),
			emitted: load(&self.counters.emitted),
			dropped_unavailable: load(&self.counters.dropped_unavailable),
			dropped_invalid: load(&self.counters.dropped_invalid),
			emit_failures: load(&self.counters.emit_failures),
			declination_updates: load(&self.counters.declination_updates),
			rejected_declinations: load(&self.counters.rejected_declinations),
		}
	}
}
