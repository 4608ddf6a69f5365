use declination::{Axis, FrameId};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::messages::TransformMessage;

pub const DEFAULT_CONFIG_FILE_PATH: &str = "config.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NodeConfig {
	pub log_level_filter: String,
	pub log_directory: String,
	/// Frame every output sample is expressed in.
	pub target_frame: String,
	/// Radians, used until the first declination message arrives.
	pub default_declination: f64,
	pub declination_axis: String,
	/// Seconds of dynamic transform history kept for lookups.
	pub transform_cache_duration: f64,
	pub statistics_period_secs: u64,
	pub static_transforms: Vec<TransformMessage>,
}

pub trait TryIntoLevelFilter {
	fn try_into_level_filter(&self) -> Result<LevelFilter, ()>;
}

impl TryIntoLevelFilter for String {
	fn try_into_level_filter(&self) -> Result<LevelFilter, ()> {
		Ok(match self.as_str() {
			"none" => LevelFilter::Off,
			"error" => LevelFilter::Error,
			"warn" => LevelFilter::Warn,
			"info" => LevelFilter::Info,
			"debug" => LevelFilter::Debug,
			"all" => LevelFilter::Trace,
			_ => return Err(()),
		})
	}
}

impl Default for NodeConfig {
	fn default() -> Self {
		NodeConfig {
			log_level_filter: String::from("info"),
			log_directory: String::from("."),
			target_frame: String::from("base_link"),
			default_declination: 0.,
			declination_axis: String::from("z"),
			transform_cache_duration: 10.,
			statistics_period_secs: 10,
			static_transforms: Vec::new(),
		}
	}
}

impl NodeConfig {
	pub fn level_filter(&self) -> anyhow::Result<LevelFilter> {
		self.log_level_filter
			.try_into_level_filter()
			.map_err(|_| anyhow!("Invalid log level filter \"{}\"", self.log_level_filter))
	}

	pub fn target_frame(&self) -> anyhow::Result<FrameId> {
		Ok(FrameId::new(self.target_frame.as_str())?)
	}

	pub fn declination_axis(&self) -> anyhow::Result<Axis> {
		Ok(Axis::try_from(self.declination_axis.as_str())?)
	}

	pub fn statistics_period(&self) -> Duration {
		Duration::from_secs(self.statistics_period_secs)
	}

	/// Checks every value needed before the first sample is processed.
	pub fn validate(&self) -> anyhow::Result<()> {
		self.level_filter()?;
		self.target_frame()?;
		self.declination_axis()?;

		if !self.default_declination.is_finite() {
			return Err(anyhow!("Invalid default declination {}", self.default_declination));
		}

		if !(self.transform_cache_duration >= 0.) {
			return Err(anyhow!("Invalid transform cache duration {}", self.transform_cache_duration));
		}

		if self.statistics_period_secs == 0 {
			return Err(anyhow!("Statistics period must be at least one second"));
		}

		for transform in &self.static_transforms {
			transform.to_stamped()?;
		}

		Ok(())
	}
}

pub fn read(path: &Path) -> anyhow::Result<NodeConfig> {
	let config_file = File::open(path)
		.map_err(|e| anyhow!("Failed to open configuration file \"{}\": {}", path.display(), e))?;

	let config: NodeConfig = serde_json::from_reader(config_file)
		.map_err(|e| anyhow!("Failed to parse configuration file \"{}\": {}", path.display(), e))?;

	Ok(config)
}

pub fn save(config: &NodeConfig, path: &Path) -> anyhow::Result<()> {
	let mut config_file = OpenOptions::new()
		.create(true)
		.write(true)
		.truncate(true)
		.open(path)?;

	writeln!(config_file, "{}", serde_json::to_string_pretty(config)?)?;

	Ok(())
}
