#[macro_use]
extern crate log;

pub use crate::declination::{Axis, DeclinationCorrector, DeclinationOffset};
pub use crate::error::{Error, Result};
pub use crate::frame_transformer::transform;
pub use crate::pipeline::{Pipeline, PipelineStatistics, Sink};
pub use crate::pose_lookup::{Pose, PoseLookup};
pub use crate::sample::{FrameId, MotionSample, Timestamp, ORIENTATION_NORM_TOLERANCE};
pub use crate::transform_tree::{StampedTransform, TransformTree, MAX_TREE_DEPTH};

mod declination;
mod error;
mod frame_transformer;
mod pipeline;
mod pose_lookup;
mod sample;
mod transform_tree;
