//! Skeleton simulator
//!
//! Builds skeletons by walking the bone topology from the head down, so the
//! segment lengths of a profile come back out of the extractor exactly when
//! there is no jitter.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use stature_core::{MeasurementVector, TrackingId};
use stature_skeleton::{
    BodyFrame, Joint, JointType, Position3D, Side, Skeleton, TrackingState, BONES,
    HEAD_DIVERGENCE,
};

/// Segment lengths of a body, in meters
#[derive(Clone, Debug, PartialEq)]
pub struct BodyProfile {
    /// Head joint to the neck (spine-shoulder) joint
    pub head_to_neck: f64,
    pub upper_spine: f64,
    pub lower_spine: f64,
    /// Neck to either shoulder
    pub half_shoulder: f64,
    /// Spine base to either hip
    pub half_hip: f64,
    pub upper_arm: f64,
    pub forearm: f64,
    pub hand: f64,
    pub hand_tip: f64,
    pub thigh: f64,
    pub shin: f64,
    pub foot: f64,
}

impl BodyProfile {
    pub fn tall_adult() -> Self {
        BodyProfile {
            head_to_neck: 0.30,
            upper_spine: 0.32,
            lower_spine: 0.14,
            half_shoulder: 0.20,
            half_hip: 0.10,
            upper_arm: 0.31,
            forearm: 0.27,
            hand: 0.08,
            hand_tip: 0.10,
            thigh: 0.47,
            shin: 0.45,
            foot: 0.12,
        }
    }

    pub fn short_adult() -> Self {
        BodyProfile {
            head_to_neck: 0.27,
            upper_spine: 0.28,
            lower_spine: 0.12,
            half_shoulder: 0.18,
            half_hip: 0.09,
            upper_arm: 0.28,
            forearm: 0.24,
            hand: 0.07,
            hand_tip: 0.09,
            thigh: 0.42,
            shin: 0.39,
            foot: 0.11,
        }
    }

    pub fn child() -> Self {
        BodyProfile {
            head_to_neck: 0.20,
            upper_spine: 0.19,
            lower_spine: 0.08,
            half_shoulder: 0.12,
            half_hip: 0.07,
            upper_arm: 0.18,
            forearm: 0.15,
            hand: 0.05,
            hand_tip: 0.06,
            thigh: 0.28,
            shin: 0.26,
            foot: 0.08,
        }
    }

    /// Every segment multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        BodyProfile {
            head_to_neck: self.head_to_neck * factor,
            upper_spine: self.upper_spine * factor,
            lower_spine: self.lower_spine * factor,
            half_shoulder: self.half_shoulder * factor,
            half_hip: self.half_hip * factor,
            upper_arm: self.upper_arm * factor,
            forearm: self.forearm * factor,
            hand: self.hand * factor,
            hand_tip: self.hand_tip * factor,
            thigh: self.thigh * factor,
            shin: self.shin * factor,
            foot: self.foot * factor,
        }
    }

    pub fn leg_length(&self) -> f64 {
        self.thigh + self.shin + self.foot
    }

    pub fn arm_length(&self) -> f64 {
        self.upper_arm + self.forearm + self.hand + self.hand_tip
    }

    /// Measurements a noise-free skeleton of this profile yields
    pub fn expected(&self) -> MeasurementVector {
        let torso = self.upper_spine + self.lower_spine;
        MeasurementVector {
            height: self.head_to_neck + torso + self.leg_length() + HEAD_DIVERGENCE,
            leg_length: self.leg_length(),
            arm_length: self.arm_length(),
            shoulder_width: 2.0 * self.half_shoulder,
            torso_length: torso,
        }
    }

    /// Direction (unit vector) and length of the bone ending at `child`
    fn segment(&self, child: JointType) -> ([f64; 3], f64) {
        const DOWN: [f64; 3] = [0.0, -1.0, 0.0];
        const RIGHT: [f64; 3] = [1.0, 0.0, 0.0];
        const LEFT: [f64; 3] = [-1.0, 0.0, 0.0];
        const TOWARD_SENSOR: [f64; 3] = [0.0, 0.0, -1.0];

        match child {
            JointType::Head => ([0.0; 3], 0.0),
            JointType::Neck | JointType::SpineShoulder => (DOWN, self.head_to_neck / 2.0),
            JointType::SpineMid => (DOWN, self.upper_spine),
            JointType::SpineBase => (DOWN, self.lower_spine),
            JointType::ShoulderRight => (RIGHT, self.half_shoulder),
            JointType::ShoulderLeft => (LEFT, self.half_shoulder),
            JointType::HipRight => (RIGHT, self.half_hip),
            JointType::HipLeft => (LEFT, self.half_hip),
            JointType::ElbowRight | JointType::ElbowLeft => (DOWN, self.upper_arm),
            JointType::WristRight | JointType::WristLeft => (DOWN, self.forearm),
            JointType::HandRight | JointType::HandLeft => (DOWN, self.hand),
            JointType::HandTipRight | JointType::HandTipLeft => (DOWN, self.hand_tip),
            JointType::ThumbRight => (RIGHT, self.hand / 2.0),
            JointType::ThumbLeft => (LEFT, self.hand / 2.0),
            JointType::KneeRight | JointType::KneeLeft => (DOWN, self.thigh),
            JointType::AnkleRight | JointType::AnkleLeft => (DOWN, self.shin),
            JointType::FootRight | JointType::FootLeft => (TOWARD_SENSOR, self.foot),
        }
    }
}

/// Simulated subject: who, what body, where
#[derive(Clone, Debug)]
pub struct Subject {
    pub tracking_id: TrackingId,
    pub profile: BodyProfile,
    /// Head joint position
    pub head: Position3D,
}

impl Subject {
    /// Subject standing `depth` meters from the sensor, ankles on the floor
    pub fn standing(tracking_id: TrackingId, profile: BodyProfile, x: f64, depth: f64) -> Self {
        let head_y = profile.head_to_neck
            + profile.upper_spine
            + profile.lower_spine
            + profile.thigh
            + profile.shin;
        Subject {
            tracking_id,
            profile,
            head: Position3D::new(x, head_y, depth),
        }
    }
}

/// Seeded skeleton generator
pub struct SkeletonSimulator {
    rng: StdRng,
    /// Per-coordinate jitter bound in meters
    jitter: f64,
    /// Side whose limbs the sensor only infers
    degraded: Option<Side>,
    frame_interval_ms: u64,
    next_timestamp_ms: u64,
}

impl SkeletonSimulator {
    pub fn new(seed: u64) -> Self {
        SkeletonSimulator {
            rng: StdRng::seed_from_u64(seed),
            jitter: 0.0,
            degraded: None,
            frame_interval_ms: 33,
            next_timestamp_ms: 0,
        }
    }

    /// Add uniform noise of up to `meters` to every coordinate
    pub fn with_jitter(mut self, meters: f64) -> Self {
        self.jitter = meters.abs();
        self
    }

    /// Report the limbs of `side` as inferred
    pub fn with_degraded_side(mut self, side: Side) -> Self {
        self.degraded = Some(side);
        self
    }

    fn noise(&mut self) -> [f64; 3] {
        if self.jitter == 0.0 {
            return [0.0; 3];
        }
        let dist = Uniform::new_inclusive(-self.jitter, self.jitter);
        [
            dist.sample(&mut self.rng),
            dist.sample(&mut self.rng),
            dist.sample(&mut self.rng),
        ]
    }

    /// Build one skeleton for a subject
    pub fn skeleton(&mut self, subject: &Subject) -> Skeleton {
        let mut exact = vec![Position3D::zero(); JointType::count()];
        exact[JointType::Head as usize] = subject.head;

        for (parent, child) in BONES {
            let ([dx, dy, dz], length) = subject.profile.segment(child);
            exact[child as usize] =
                exact[parent as usize].offset(dx * length, dy * length, dz * length);
        }

        let inferred: Vec<&[JointType]> = match self.degraded {
            Some(side) => vec![side.arm(), side.leg()],
            None => Vec::new(),
        };
        self.finish(subject.tracking_id, &exact, &inferred)
    }

    fn finish(
        &mut self,
        tracking_id: TrackingId,
        exact: &[Position3D],
        inferred: &[&[JointType]],
    ) -> Skeleton {
        let mut skeleton = Skeleton::new(tracking_id);
        for &joint in JointType::all() {
            let [nx, ny, nz] = self.noise();
            let state = if inferred.iter().any(|chain| chain.contains(&joint)) {
                TrackingState::Inferred
            } else {
                TrackingState::Tracked
            };
            skeleton.set_joint(
                joint,
                Joint::new(exact[joint as usize].offset(nx, ny, nz), state),
            );
        }
        skeleton
    }

    /// Next frame holding every subject, plus empty body slots up to six
    pub fn frame(&mut self, subjects: &[Subject]) -> BodyFrame {
        let mut bodies: Vec<Skeleton> = subjects.iter().map(|s| self.skeleton(s)).collect();
        while bodies.len() < 6 {
            bodies.push(Skeleton::untracked());
        }

        let timestamp_ms = self.next_timestamp_ms;
        self.next_timestamp_ms += self.frame_interval_ms;
        BodyFrame::new(timestamp_ms, bodies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use stature_skeleton::{extract_detailed, extract_measurements, gaze_target};

    fn close(a: &MeasurementVector, b: &MeasurementVector) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn test_noise_free_skeleton_matches_profile() {
        for profile in [
            BodyProfile::tall_adult(),
            BodyProfile::short_adult(),
            BodyProfile::child(),
        ] {
            let subject = Subject::standing(TrackingId::new(1), profile.clone(), 0.0, 2.5);
            let skeleton = SkeletonSimulator::new(0).skeleton(&subject);
            let m = extract_measurements(&skeleton);
            assert!(close(&m, &profile.expected()), "{:?} vs {:?}", m, profile.expected());
        }
    }

    #[test]
    fn test_feet_on_floor() {
        let subject = Subject::standing(TrackingId::new(1), BodyProfile::tall_adult(), 0.3, 2.0);
        let skeleton = SkeletonSimulator::new(0).skeleton(&subject);
        let foot = skeleton.joint(JointType::FootLeft).position;
        assert!(foot.y.abs() < 1e-9);
        assert!((foot.z - (2.0 - 0.12)).abs() < 1e-9);
    }

    #[test]
    fn test_jitter_is_bounded_and_seeded() {
        let subject = Subject::standing(TrackingId::new(1), BodyProfile::tall_adult(), 0.0, 2.0);
        let exact = SkeletonSimulator::new(0).skeleton(&subject);

        let a = SkeletonSimulator::new(7).with_jitter(0.01).skeleton(&subject);
        let b = SkeletonSimulator::new(7).with_jitter(0.01).skeleton(&subject);
        assert_eq!(a, b);

        for (joint, reading) in a.iter() {
            let d = exact.joint(joint).position;
            assert!((reading.position.x - d.x).abs() <= 0.01 + 1e-12);
            assert!((reading.position.y - d.y).abs() <= 0.01 + 1e-12);
            assert!((reading.position.z - d.z).abs() <= 0.01 + 1e-12);
        }
    }

    #[test]
    fn test_degraded_side_switches_limbs() {
        let subject = Subject::standing(TrackingId::new(1), BodyProfile::tall_adult(), 0.0, 2.0);
        let right_degraded = SkeletonSimulator::new(0)
            .with_degraded_side(Side::Right)
            .skeleton(&subject);

        let e = extract_detailed(&right_degraded);
        assert_eq!(e.leg_side, Side::Left);
        assert_eq!(e.arm_side, Side::Left);
        assert_eq!(
            right_degraded.joint(JointType::KneeRight).state,
            TrackingState::Inferred
        );
    }

    #[test]
    fn test_frame_has_six_slots_and_advances_time() {
        let mut sim = SkeletonSimulator::new(1);
        let subjects = [
            Subject::standing(TrackingId::new(1), BodyProfile::tall_adult(), -0.5, 2.0),
            Subject::standing(TrackingId::new(2), BodyProfile::child(), 0.5, 2.5),
        ];

        let first = sim.frame(&subjects);
        let second = sim.frame(&subjects);

        assert_eq!(first.bodies.len(), 6);
        assert_eq!(first.tracked().count(), 2);
        assert_eq!(second.timestamp_ms - first.timestamp_ms, 33);

        let gaze = gaze_target(&first).unwrap();
        assert!((gaze.x + 0.5).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_measurements_ignore_placement(
            factor in 0.5f64..1.5,
            x in -1.5f64..1.5,
            depth in 1.0f64..4.0,
        ) {
            let profile = BodyProfile::tall_adult().scaled(factor);
            let subject = Subject::standing(TrackingId::new(1), profile.clone(), x, depth);
            let m = extract_measurements(&SkeletonSimulator::new(0).skeleton(&subject));
            prop_assert!(m.distance(&profile.expected()) < 1e-9);
        }
    }
}
