use crossbeam_utils::sync::ShardedLock;
use nalgebra::{Isometry3, Translation3};
use std::collections::{HashMap, VecDeque};
use std::sync::PoisonError;

use crate::{Error, Pose, PoseLookup, Result, Timestamp};

/// Maximum number of edges walked from a frame to the root. Also stops lookups on a cyclic tree.
pub const MAX_TREE_DEPTH: usize = 1000;

/// Pose of `child_frame` relative to `parent_frame`: maps child data into the parent frame.
#[derive(Debug, Clone, PartialEq)]
pub struct StampedTransform {
	pub stamp: Timestamp,
	pub parent_frame: String,
	pub child_frame: String,
	pub transform: Pose,
}

#[derive(Debug)]
enum History {
	Static(Pose),
	Dynamic(VecDeque<(Timestamp, Pose)>),
}

impl History {
	/// Returns `false` when the entry is already older than the cache window and was pruned.
	fn insert(&mut self, stamp: Timestamp, pose: Pose, cache_duration: f64) -> bool {
		if let History::Static(_) = self {
			*self = History::Dynamic(VecDeque::new());
		}

		let entries = match self {
			History::Dynamic(entries) => entries,
			History::Static(_) => return false,
		};

		match entries.iter().rposition(|(t, _)| *t <= stamp) {
			Some(i) if entries[i].0 == stamp => entries[i] = (stamp, pose),
			Some(i) => entries.insert(i + 1, (stamp, pose)),
			None => entries.push_front((stamp, pose)),
		}

		if let Some(&(newest, _)) = entries.back() {
			while entries.front().map_or(false, |(t, _)| *t < newest - cache_duration) {
				entries.pop_front();
			}
		}

		entries.front().map_or(false, |(t, _)| *t <= stamp)
	}

	fn pose_at(&self, time: Timestamp) -> std::result::Result<Pose, String> {
		let entries = match self {
			History::Static(pose) => return Ok(*pose),
			History::Dynamic(entries) => entries,
		};

		let (oldest, newest, newest_pose) = match (entries.front(), entries.back()) {
			(Some(&(oldest, _)), Some(&(newest, pose))) => (oldest, newest, pose),
			_ => return Err(String::from("no data buffered")),
		};

		if time == 0. {
			return Ok(newest_pose);
		}

		if time < oldest {
			return Err(format!("requested time is {:.3} s before the oldest data", oldest - time));
		}

		if time > newest {
			return Err(format!("requested time is {:.3} s after the newest data", time - newest));
		}

		// `oldest <= time <= newest`, so `i` exists and `i > 0` unless `time == oldest`
		let i = entries.iter().position(|(t, _)| *t >= time).unwrap_or(entries.len() - 1);
		let (t1, p1) = entries[i];

		if t1 == time || i == 0 {
			return Ok(p1);
		}

		let (t0, p0) = entries[i - 1];

		Ok(interpolate(&p0, &p1, (time - t0) / (t1 - t0)))
	}
}

fn interpolate(from: &Pose, to: &Pose, ratio: f64) -> Pose {
	let translation = from.translation.vector.lerp(&to.translation.vector, ratio);

	// Antipodal rotations have no unique slerp path.
	let rotation = from.rotation
		.try_slerp(&to.rotation, ratio, 1.0e-9)
		.unwrap_or(if ratio < 0.5 { from.rotation } else { to.rotation });

	Isometry3::from_parts(Translation3::from(translation), rotation)
}

#[derive(Debug)]
struct Edge {
	parent: String,
	history: History,
}

/// In-memory tree of frames, each frame holding the pose relative to its parent over time.
///
/// Static edges are valid at every time. Dynamic edges keep `cache_duration` seconds of history
/// behind their newest entry and are interpolated between buffered entries, never extrapolated.
pub struct TransformTree {
	cache_duration: f64,
	edges: ShardedLock<HashMap<String, Edge>>,
}

impl TransformTree {
	pub fn new(cache_duration: f64) -> Self {
		TransformTree {
			cache_duration: cache_duration.max(0.),
			edges: ShardedLock::new(HashMap::new()),
		}
	}

	pub fn cache_duration(&self) -> f64 {
		self.cache_duration
	}

	pub fn set_transform(&self, stamped: StampedTransform, is_static: bool) -> Result<()> {
		let StampedTransform { stamp, parent_frame, child_frame, transform } = stamped;

		if parent_frame.trim().is_empty() || child_frame.trim().is_empty() {
			return Err(Error::InvalidTransform(
				format!("empty frame id (parent \"{}\", child \"{}\")", parent_frame, child_frame)));
		}

		if parent_frame == child_frame {
			return Err(Error::InvalidTransform(format!("frame \"{}\" cannot be its own parent", child_frame)));
		}

		let finite = transform.translation.vector.iter()
			.chain(transform.rotation.coords.iter())
			.all(|c| c.is_finite());

		if !finite || !stamp.is_finite() {
			return Err(Error::InvalidTransform(
				format!("non-finite transform from \"{}\" to \"{}\"", child_frame, parent_frame)));
		}

		let mut edges = self.edges.write().unwrap_or_else(PoisonError::into_inner);

		if let Some(edge) = edges.get_mut(&child_frame) {
			if edge.parent == parent_frame {
				if is_static {
					edge.history = History::Static(transform);
				} else if !edge.history.insert(stamp, transform, self.cache_duration) {
					warn!("Dropped transform \"{}\" -> \"{}\" stamped {:.3} s: older than the cached history",
						  parent_frame, child_frame, stamp);
				}

				return Ok(());
			}

			warn!("Frame \"{}\" moved from parent \"{}\" to \"{}\"", child_frame, edge.parent, parent_frame);
		}

		let mut history = History::Static(transform);
		if !is_static {
			history = History::Dynamic(VecDeque::new());
			history.insert(stamp, transform, self.cache_duration);
		}

		debug!("Added {} edge \"{}\" -> \"{}\"",
			   if is_static { "static" } else { "dynamic" }, parent_frame, child_frame);

		edges.insert(child_frame, Edge { parent: parent_frame, history });

		Ok(())
	}

	/// Sorted names of every frame appearing in the tree.
	pub fn frames(&self) -> Vec<String> {
		let edges = self.edges.read().unwrap_or_else(PoisonError::into_inner);

		let mut frames: Vec<String> = edges.iter()
			.flat_map(|(child, edge)| vec![child.clone(), edge.parent.clone()])
			.collect();

		frames.sort();
		frames.dedup();
		frames
	}

	/// Drops every dynamic edge. Static edges are kept.
	pub fn clear(&self) {
		let mut edges = self.edges.write().unwrap_or_else(PoisonError::into_inner);
		edges.retain(|_, edge| matches!(edge.history, History::Static(_)));
	}

	fn is_known(edges: &HashMap<String, Edge>, frame: &str) -> bool {
		edges.contains_key(frame) || edges.values().any(|edge| edge.parent == frame)
	}

	/// `[frame, parent, grandparent, ..., root]`
	fn chain<'a>(edges: &'a HashMap<String, Edge>, frame: &'a str) -> std::result::Result<Vec<&'a str>, String> {
		let mut chain = vec![frame];
		let mut current = frame;

		while let Some(edge) = edges.get(current) {
			if chain.len() > MAX_TREE_DEPTH {
				return Err(format!("exceeded maximum depth {} walking up from \"{}\"", MAX_TREE_DEPTH, frame));
			}

			current = edge.parent.as_str();
			chain.push(current);
		}

		Ok(chain)
	}

	/// Pose mapping `chain[0]` data into `chain[ancestor_index]`.
	fn pose_to_ancestor(edges: &HashMap<String, Edge>,
						chain: &[&str],
						ancestor_index: usize,
						time: Timestamp) -> std::result::Result<Pose, String> {
		let mut pose = Pose::identity();

		for frame in &chain[..ancestor_index] {
			let edge = &edges[*frame];
			let edge_pose = edge.history
				.pose_at(time)
				.map_err(|reason| format!("\"{}\" -> \"{}\": {}", edge.parent, frame, reason))?;

			pose = edge_pose * pose;
		}

		Ok(pose)
	}

	fn resolve(&self, target_frame: &str, source_frame: &str, time: Timestamp) -> std::result::Result<Pose, String> {
		let edges = self.edges.read().unwrap_or_else(PoisonError::into_inner);

		for frame in &[source_frame, target_frame] {
			if !Self::is_known(&edges, frame) {
				return Err(format!("frame \"{}\" does not exist", frame));
			}
		}

		let source_chain = Self::chain(&edges, source_frame)?;
		let target_chain = Self::chain(&edges, target_frame)?;

		let source_index = source_chain.iter()
			.position(|frame| target_chain.contains(frame))
			.ok_or_else(|| String::from("frames are not connected"))?;

		let ancestor = source_chain[source_index];
		let target_index = target_chain.iter()
			.position(|frame| *frame == ancestor)
			.ok_or_else(|| String::from("frames are not connected"))?;

		let source_pose = Self::pose_to_ancestor(&edges, &source_chain, source_index, time)?;
		let target_pose = Self::pose_to_ancestor(&edges, &target_chain, target_index, time)?;

		Ok(target_pose.inverse() * source_pose)
	}
}

impl Default for TransformTree {
	fn default() -> Self {
		const DEFAULT_CACHE_DURATION: f64 = 10.;
		TransformTree::new(DEFAULT_CACHE_DURATION)
	}
}

impl PoseLookup for TransformTree {
	fn lookup_transform(&self, target_frame: &str, source_frame: &str, time: Timestamp) -> Result<Pose> {
		if !time.is_finite() {
			return Err(Error::transform_unavailable(target_frame, source_frame, time, "non-finite time"));
		}

		if target_frame == source_frame && !target_frame.is_empty() {
			return Ok(Pose::identity());
		}

		self.resolve(target_frame, source_frame, time)
			.map_err(|reason| Error::transform_unavailable(target_frame, source_frame, time, reason))
	}
}
