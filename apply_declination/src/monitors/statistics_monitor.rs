use declination::{Pipeline, PipelineStatistics, PoseLookup, Sink};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crate::traits::Monitor;

/// Periodically logs the pipeline counters. Stops once the pipeline is dropped.
pub struct StatisticsMonitor<L: PoseLookup, S: Sink> {
	pipeline: Weak<Pipeline<L, S>>,
	period: Duration,
}

impl<L: PoseLookup, S: Sink> StatisticsMonitor<L, S> {
	pub fn new(pipeline: &Arc<Pipeline<L, S>>, period: Duration) -> Self {
		StatisticsMonitor {
			pipeline: Arc::downgrade(pipeline),
			period,
		}
	}
}

impl<L: PoseLookup + 'static, S: Sink + 'static> Monitor<PipelineStatistics> for StatisticsMonitor<L, S> {
	fn delay(&self) -> Duration {
		self.period
	}

	fn monitor(&mut self) -> Option<PipelineStatistics> {
		self.pipeline
			.upgrade()
			.map(|pipeline| pipeline.statistics())
	}
}
