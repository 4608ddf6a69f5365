#[macro_use]
extern crate anyhow;

#[macro_use]
extern crate log;

use crossbeam_channel::unbounded;
use declination::{DeclinationCorrector, MotionSample, Pipeline, StampedTransform, TransformTree};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use black_box::BlackBox;

use crate::config::NodeConfig;
use crate::input_controllers::json_input_controller::JsonInputController;
use crate::messages::Message;
use crate::monitors::statistics_monitor::StatisticsMonitor;
use crate::node::{spawn_declination_loop, spawn_sample_loop, spawn_transform_loop, MessageDispatcher};
use crate::output_controllers::json_output_controller::JsonOutputController;
use crate::traits::{Dispatcher, InputController, Monitor, OutputController};

mod config;
mod input_controllers;
mod messages;
mod monitors;
mod node;
mod output_controllers;
mod traits;

fn main() -> anyhow::Result<()> {
	// Command line arguments
	const CONFIG_ARG: &str = "config";
	const WRITE_DEFAULT_CONFIG_ARG: &str = "write-default-config";
	const DECLINATION_ARG: &str = "declination";
	const TARGET_FRAME_ARG: &str = "target-frame";

	let args = clap::App::new("apply_declination")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Rotates IMU orientations into a target frame and corrects them by the magnetic declination")
		.arg(clap::Arg::new(CONFIG_ARG)
			.short('c')
			.long("config")
			.help("Configuration file")
			.takes_value(true)
			.default_value(config::DEFAULT_CONFIG_FILE_PATH))
		.arg(clap::Arg::new(WRITE_DEFAULT_CONFIG_ARG)
			.long("write-default-config")
			.help("Write the default configuration to the configuration file and exit")
			.takes_value(false))
		.arg(clap::Arg::new(DECLINATION_ARG)
			.long("declination")
			.help("Initial declination in radians, overrides the configuration")
			.takes_value(true)
			.allow_hyphen_values(true))
		.arg(clap::Arg::new(TARGET_FRAME_ARG)
			.long("target-frame")
			.help("Output frame, overrides the configuration")
			.takes_value(true))
		.get_matches();

	let config_path = Path::new(args.value_of(CONFIG_ARG).unwrap_or(config::DEFAULT_CONFIG_FILE_PATH));

	if args.is_present(WRITE_DEFAULT_CONFIG_ARG) {
		config::save(&NodeConfig::default(), config_path)?;
		eprintln!("Default configuration written to \"{}\"", config_path.display());
		return Ok(());
	}

	// Configuration
	let mut config = config::read(config_path)?;

	if let Some(declination) = args.value_of(DECLINATION_ARG) {
		config.default_declination = declination
			.parse()
			.map_err(|e| anyhow!("Invalid declination \"{}\": {}", declination, e))?;
	}

	if let Some(target_frame) = args.value_of(TARGET_FRAME_ARG) {
		config.target_frame = target_frame.to_owned();
	}

	config.validate()?;

	// Log
	BlackBox::new(&config.log_directory, "apply_declination")?
		.spawn(config.level_filter()?)
		.map_err(|e| anyhow!("Failed to install the logger: {}", e))?;

	info!("apply_declination {}", env!("CARGO_PKG_VERSION"));

	// Transforms
	let tree = Arc::new(TransformTree::new(config.transform_cache_duration));

	for transform in &config.static_transforms {
		tree.set_transform(transform.to_stamped()?, true)?;
	}

	info!("Known frames: {:?}", tree.frames());

	// Output controller
	let (output_sender, output_receiver) = unbounded::<MotionSample>();

	let output_handle = JsonOutputController::stdout()
		.spawn(output_receiver);

	// Pipeline
	let corrector = Arc::new(DeclinationCorrector::new(config.declination_axis()?, config.default_declination));

	let pipeline = Arc::new(Pipeline::new(config.target_frame()?,
										  Arc::clone(&tree),
										  corrector,
										  output_sender));

	info!("Publishing in \"{}\" with an initial declination of {:.5} rad about {}",
		  pipeline.target_frame(),
		  config.default_declination,
		  pipeline.corrector().axis());

	let (sample_sender, sample_receiver) = unbounded::<MotionSample>();
	let (declination_sender, declination_receiver) = unbounded::<f64>();
	let (transform_sender, transform_receiver) = unbounded::<(StampedTransform, bool)>();

	let loop_handles = vec![
		spawn_sample_loop(Arc::clone(&pipeline), sample_receiver),
		spawn_declination_loop(Arc::clone(&pipeline), declination_receiver),
		spawn_transform_loop(Arc::clone(&tree), transform_receiver),
	];

	// Monitor
	StatisticsMonitor::new(&pipeline, config.statistics_period())
		.spawn();

	// Dispatcher
	let (message_sender, message_receiver) = unbounded::<Message>();

	let dispatcher_handle = MessageDispatcher { sample_sender, declination_sender, transform_sender }
		.spawn(message_receiver);

	// Input controller
	let input_handle = JsonInputController::stdin()
		.spawn(message_sender);

	// Shutdown once the input is exhausted, draining every queued message first
	let join = |name: &str, handle: std::thread::JoinHandle<()>| {
		if handle.join().is_err() {
			error!("{} thread panicked", name);
		}
	};

	join("Input", input_handle);
	join("Dispatcher", dispatcher_handle);

	for handle in loop_handles {
		join("Pipeline", handle);
	}

	info!("{}", pipeline.statistics());

	// Releases the output sender
	drop(pipeline);
	join("Output", output_handle);

	const LOG_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

	if !black_box::flush(LOG_FLUSH_TIMEOUT) {
		eprintln!("Timed out flushing the log file");
	}

	Ok(())
}
