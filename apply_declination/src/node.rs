use crossbeam_channel::{Receiver, Sender};
use declination::{MotionSample, Pipeline, PoseLookup, Sink, StampedTransform, TransformTree};
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

use crate::messages::Message;
use crate::traits::Dispatcher;

/// Splits the input stream so samples, declination updates and transforms are each handled on
/// their own thread.
pub struct MessageDispatcher {
	pub sample_sender: Sender<MotionSample>,
	pub declination_sender: Sender<f64>,
	pub transform_sender: Sender<(StampedTransform, bool)>,
}

impl Dispatcher<Message> for MessageDispatcher {
	fn dispatch(&self, message: Message) -> anyhow::Result<()> {
		match message {
			Message::Imu(imu) => self.sample_sender.send(imu.into())?,
			Message::Declination(angle) => self.declination_sender.send(angle)?,
			Message::Transform(transform) => {
				let stamped = transform.to_stamped()?;
				self.transform_sender.send((stamped, transform.is_static))?
			}
		}

		Ok(())
	}
}

pub fn spawn_sample_loop<L, S>(pipeline: Arc<Pipeline<L, S>>, receiver: Receiver<MotionSample>) -> JoinHandle<()>
	where L: PoseLookup + 'static, S: Sink + 'static {
	thread::spawn(move || {
		for sample in receiver {
			pipeline.on_sample(sample);
		}
	})
}

pub fn spawn_declination_loop<L, S>(pipeline: Arc<Pipeline<L, S>>, receiver: Receiver<f64>) -> JoinHandle<()>
	where L: PoseLookup + 'static, S: Sink + 'static {
	thread::spawn(move || {
		for angle in receiver {
			if let Err(e) = pipeline.on_declination_update(angle) {
				error!("{}", e);
			}
		}
	})
}

pub fn spawn_transform_loop(tree: Arc<TransformTree>, receiver: Receiver<(StampedTransform, bool)>) -> JoinHandle<()> {
	thread::spawn(move || {
		for (transform, is_static) in receiver {
			if let Err(e) = tree.set_transform(transform, is_static) {
				error!("{}", e);
			}
		}
	})
}
