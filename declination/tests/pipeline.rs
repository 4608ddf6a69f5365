use approx::relative_eq;
use assert_approx_eq::assert_approx_eq;
use crossbeam_channel::unbounded;
use declination::{Axis, DeclinationCorrector, FrameId, MotionSample, Pipeline, PoseLookup, StampedTransform,
				  TransformTree};
use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use std::f64::consts::{FRAC_PI_2, PI};
use std::sync::Arc;
use std::thread;

/// `angle_to` goes through `acos`, which amplifies rounding near zero.
const ANGLE_TOLERANCE: f64 = 1e-6;

fn yaw(angle: f64) -> UnitQuaternion<f64> {
	UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle)
}

/// `base_link` <- `imu_link`, rotated 90° about the vertical axis.
fn imu_tree() -> Arc<TransformTree> {
	let tree = Arc::new(TransformTree::default());

	tree.set_transform(StampedTransform {
		stamp: 0.,
		parent_frame: String::from("base_link"),
		child_frame: String::from("imu_link"),
		transform: Isometry3::from_parts(Translation3::new(0.05, 0., 0.12), yaw(FRAC_PI_2)),
	}, true).unwrap();

	tree
}

fn imu_sample(stamp: f64) -> MotionSample {
	MotionSample {
		stamp,
		frame_id: String::from("imu_link"),
		orientation: Quaternion::identity(),
		angular_velocity: Vector3::new(0., 0., 0.2),
		linear_acceleration: Vector3::new(1., 0., 9.81),
	}
}

fn assert_same_rotation(actual: &Quaternion<f64>, expected: &UnitQuaternion<f64>) {
	let actual = UnitQuaternion::from_quaternion(*actual);
	let fail_message = format!(
		"quaternions did not match:\n\
		actual: {:?}\n\
		expect: {:?}",
		actual, expected
	);

	assert!(actual.angle_to(expected) < ANGLE_TOLERANCE, "{}", fail_message);
}

#[test]
fn end_to_end_test() {
	let (sender, receiver) = unbounded::<MotionSample>();
	let corrector = Arc::new(DeclinationCorrector::new(Axis::Z, 0.));
	let pipeline = Pipeline::new(FrameId::new("base_link").unwrap(), imu_tree(), corrector, sender);

	assert!(pipeline.on_sample(imu_sample(1.5)));

	let output = receiver.try_recv().unwrap();
	assert_eq!(output.frame_id, "base_link");
	assert_eq!(output.stamp, 1.5);
	assert_same_rotation(&output.orientation, &yaw(FRAC_PI_2));
	assert!(relative_eq!(output.angular_velocity, Vector3::new(0., 0., 0.2), epsilon = 1e-12));
	assert!(relative_eq!(output.linear_acceleration, Vector3::new(0., 1., 9.81), epsilon = 1e-12));

	pipeline.on_declination_update(FRAC_PI_2).unwrap();
	assert!(pipeline.on_sample(imu_sample(1.6)));

	let output = receiver.try_recv().unwrap();
	assert_eq!(output.frame_id, "base_link");
	assert_same_rotation(&output.orientation, &yaw(PI));

	// Declination leaves the vectors untouched.
	assert!(relative_eq!(output.linear_acceleration, Vector3::new(0., 1., 9.81), epsilon = 1e-12));
}

#[test]
fn unavailable_transform_drops_test() {
	let (sender, receiver) = unbounded::<MotionSample>();
	let corrector = Arc::new(DeclinationCorrector::new(Axis::Z, 0.3));
	let pipeline = Pipeline::new(FrameId::new("base_link").unwrap(), imu_tree(), corrector, sender);

	let mut sample = imu_sample(2.);
	sample.frame_id = String::from("unknown_link");

	assert!(!pipeline.on_sample(sample));
	assert!(receiver.try_recv().is_err());

	// The pipeline keeps serving samples afterwards.
	assert!(pipeline.on_sample(imu_sample(2.1)));
	assert_eq!(receiver.len(), 1);

	let statistics = pipeline.statistics();
	assert_eq!(statistics.dropped_unavailable, 1);
	assert_eq!(statistics.emitted, 1);
}

#[test]
fn non_finite_stamp_drops_test() {
	let tree = Arc::new(TransformTree::default());

	for (stamp, angle) in &[(1., 0.), (2., FRAC_PI_2)] {
		tree.set_transform(StampedTransform {
			stamp: *stamp,
			parent_frame: String::from("base_link"),
			child_frame: String::from("imu_link"),
			transform: Isometry3::from_parts(Translation3::identity(), yaw(*angle)),
		}, false).unwrap();
	}

	let (sender, receiver) = unbounded::<MotionSample>();
	let corrector = Arc::new(DeclinationCorrector::new(Axis::Z, 0.));
	let pipeline = Pipeline::new(FrameId::new("base_link").unwrap(), Arc::clone(&tree), corrector, sender);

	assert!(declination::transform(&imu_sample(f64::NAN), "base_link", &tree)
		.unwrap_err()
		.is_transform_unavailable());

	assert!(!pipeline.on_sample(imu_sample(f64::NAN)));
	assert!(!pipeline.on_sample(imu_sample(f64::INFINITY)));
	assert!(receiver.try_recv().is_err());

	assert!(pipeline.on_sample(imu_sample(1.5)));
	let output = receiver.try_recv().unwrap();
	assert!(output.orientation.coords.iter().all(|c| c.is_finite()));
	assert_same_rotation(&output.orientation, &yaw(FRAC_PI_2 / 2.));

	let statistics = pipeline.statistics();
	assert_eq!(statistics.dropped_invalid, 2);
	assert_eq!(statistics.emitted, 1);
}

#[test]
fn transform_tree_round_trip_test() {
	let tree = imu_tree();
	let input = MotionSample {
		stamp: 4.,
		frame_id: String::from("imu_link"),
		orientation: UnitQuaternion::from_euler_angles(0.7, -0.1, 2.).into_inner(),
		angular_velocity: Vector3::new(0.3, -0.6, 0.05),
		linear_acceleration: Vector3::new(-0.4, 0.2, 9.7),
	};

	let there = declination::transform(&input, "base_link", &tree).unwrap();
	let back = declination::transform(&there, "imu_link", &tree).unwrap();

	assert_eq!(back.frame_id, "imu_link");
	assert!(relative_eq!(back.orientation, input.orientation, epsilon = 1e-12));
	assert!(relative_eq!(back.angular_velocity, input.angular_velocity, epsilon = 1e-12));
	assert!(relative_eq!(back.linear_acceleration, input.linear_acceleration, epsilon = 1e-12));

	let pose = tree.lookup_transform("base_link", "imu_link", 4.).unwrap();
	let inverse = tree.lookup_transform("imu_link", "base_link", 4.).unwrap();
	assert!(relative_eq!(pose * inverse, Isometry3::identity(), epsilon = 1e-12));
}

#[test]
fn concurrent_updates_test() {
	const WRITERS: usize = 4;
	const READERS: usize = 4;
	const ITERATIONS: usize = 20_000;

	let angles: Vec<f64> = (0..16).map(|i| -PI + i as f64 * 0.37).collect();
	let corrector = Arc::new(DeclinationCorrector::new(Axis::Z, angles[0]));

	let writers: Vec<_> = (0..WRITERS)
		.map(|w| {
			let corrector = Arc::clone(&corrector);
			let angles = angles.clone();

			thread::spawn(move || {
				for i in 0..ITERATIONS {
					corrector.set_offset(angles[(i + w) % angles.len()]);
				}
			})
		})
		.collect();

	let readers: Vec<_> = (0..READERS)
		.map(|_| {
			let corrector = Arc::clone(&corrector);
			let angles = angles.clone();

			thread::spawn(move || {
				let orientation = UnitQuaternion::from_euler_angles(0.2, 0.1, -0.4);

				for _ in 0..ITERATIONS {
					let offset = corrector.offset();
					assert!(angles.contains(&offset.angle), "Unexpected offset angle {}", offset.angle);

					// The stored rotation always belongs to the stored angle.
					assert_eq!(offset.rotation, yaw(offset.angle));

					let corrected = corrector.apply(orientation.quaternion());
					assert!(corrected.coords.iter().all(|c| c.is_finite()));
					assert_approx_eq!(corrected.norm(), 1., 1e-9);

					let corrected = UnitQuaternion::from_quaternion(corrected);
					assert!(angles.iter().any(|angle| (yaw(*angle) * orientation).angle_to(&corrected) < ANGLE_TOLERANCE),
							"Corrected orientation matches none of the offsets");
				}
			})
		})
		.collect();

	for handle in writers.into_iter().chain(readers) {
		handle.join().unwrap();
	}
}

#[test]
fn concurrent_pipeline_test() {
	let (sender, receiver) = unbounded::<MotionSample>();
	let corrector = Arc::new(DeclinationCorrector::new(Axis::Z, 0.));
	let pipeline = Arc::new(Pipeline::new(FrameId::new("base_link").unwrap(), imu_tree(), corrector, sender));

	const SAMPLES: usize = 2_000;

	let samples = {
		let pipeline = Arc::clone(&pipeline);
		thread::spawn(move || {
			for i in 0..SAMPLES {
				pipeline.on_sample(imu_sample(i as f64 * 0.01));
			}
		})
	};

	let updates = {
		let pipeline = Arc::clone(&pipeline);
		thread::spawn(move || {
			for i in 0..SAMPLES {
				let angle = if i % 2 == 0 { 0. } else { FRAC_PI_2 };
				pipeline.on_declination_update(angle).unwrap();
			}
		})
	};

	samples.join().unwrap();
	updates.join().unwrap();

	assert_eq!(receiver.len(), SAMPLES);

	for output in receiver.try_iter() {
		let orientation = UnitQuaternion::from_quaternion(output.orientation);
		let yaw_90 = orientation.angle_to(&yaw(FRAC_PI_2)) < ANGLE_TOLERANCE;
		let yaw_180 = orientation.angle_to(&yaw(PI)) < ANGLE_TOLERANCE;
		assert!(yaw_90 || yaw_180);
	}

	assert_eq!(pipeline.statistics().declination_updates, SAMPLES as u64);
}
