//! Body measurement extraction
//!
//! Every measurement is a sum of straight segments along a fixed chain of
//! joints. Limbs come in pairs; the side with more fully tracked joints wins,
//! and a tie goes to the right side.

use stature_core::MeasurementVector;

use crate::{JointType, Skeleton};

/// Gap between the head joint and the top of the skull, in meters
pub const HEAD_DIVERGENCE: f64 = 0.1;

/// Head down to the spine base. The sensor's SpineShoulder is the neck.
pub const SPINE: [JointType; 4] = [
    JointType::Head,
    JointType::SpineShoulder,
    JointType::SpineMid,
    JointType::SpineBase,
];

pub const TORSO: [JointType; 3] = [
    JointType::SpineShoulder,
    JointType::SpineMid,
    JointType::SpineBase,
];

pub const SHOULDERS: [JointType; 3] = [
    JointType::ShoulderLeft,
    JointType::SpineShoulder,
    JointType::ShoulderRight,
];

pub const LEFT_LEG: [JointType; 4] = [
    JointType::HipLeft,
    JointType::KneeLeft,
    JointType::AnkleLeft,
    JointType::FootLeft,
];

pub const RIGHT_LEG: [JointType; 4] = [
    JointType::HipRight,
    JointType::KneeRight,
    JointType::AnkleRight,
    JointType::FootRight,
];

pub const LEFT_ARM: [JointType; 5] = [
    JointType::ShoulderLeft,
    JointType::ElbowLeft,
    JointType::WristLeft,
    JointType::HandLeft,
    JointType::HandTipLeft,
];

pub const RIGHT_ARM: [JointType; 5] = [
    JointType::ShoulderRight,
    JointType::ElbowRight,
    JointType::WristRight,
    JointType::HandRight,
    JointType::HandTipRight,
];

/// Body side of a paired limb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn leg(self) -> &'static [JointType] {
        match self {
            Side::Left => &LEFT_LEG,
            Side::Right => &RIGHT_LEG,
        }
    }

    pub fn arm(self) -> &'static [JointType] {
        match self {
            Side::Left => &LEFT_ARM,
            Side::Right => &RIGHT_ARM,
        }
    }
}

/// Left only when it has strictly more tracked joints
pub fn choose_side(left_tracked: usize, right_tracked: usize) -> Side {
    if left_tracked > right_tracked {
        Side::Left
    } else {
        Side::Right
    }
}

/// Distance between two joints of a skeleton
pub fn joint_distance(skeleton: &Skeleton, a: JointType, b: JointType) -> f64 {
    skeleton.joint(a).distance(&skeleton.joint(b))
}

/// Sum of consecutive joint distances along `chain`
pub fn chain_length(skeleton: &Skeleton, chain: &[JointType]) -> f64 {
    chain
        .windows(2)
        .map(|pair| joint_distance(skeleton, pair[0], pair[1]))
        .sum()
}

/// Joints of `chain` whose state is Tracked (Inferred does not count)
pub fn tracked_count(skeleton: &Skeleton, chain: &[JointType]) -> usize {
    chain
        .iter()
        .filter(|&&joint| skeleton.joint(joint).is_tracked())
        .count()
}

fn better_side(skeleton: &Skeleton, left: &[JointType], right: &[JointType]) -> Side {
    choose_side(tracked_count(skeleton, left), tracked_count(skeleton, right))
}

/// Measurements plus the limb sides they were taken from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extraction {
    pub measurements: MeasurementVector,
    pub leg_side: Side,
    pub arm_side: Side,
}

/// Extract measurements and report which sides were used
pub fn extract_detailed(skeleton: &Skeleton) -> Extraction {
    let leg_side = better_side(skeleton, &LEFT_LEG, &RIGHT_LEG);
    let arm_side = better_side(skeleton, &LEFT_ARM, &RIGHT_ARM);

    let leg_length = chain_length(skeleton, leg_side.leg());
    let arm_length = chain_length(skeleton, arm_side.arm());

    let measurements = MeasurementVector {
        height: chain_length(skeleton, &SPINE) + leg_length + HEAD_DIVERGENCE,
        leg_length,
        arm_length,
        shoulder_width: chain_length(skeleton, &SHOULDERS),
        torso_length: chain_length(skeleton, &TORSO),
    };

    Extraction {
        measurements,
        leg_side,
        arm_side,
    }
}

/// Extract body measurements from one skeleton snapshot
pub fn extract_measurements(skeleton: &Skeleton) -> MeasurementVector {
    extract_detailed(skeleton).measurements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Joint, TrackingState};
    use proptest::prelude::*;
    use stature_core::TrackingId;

    fn place(skeleton: &mut Skeleton, joint: JointType, x: f64, y: f64, z: f64) {
        skeleton.set_joint(joint, Joint::tracked(x, y, z));
    }

    /// Upright body facing the sensor, every joint tracked
    fn upright() -> Skeleton {
        let mut s = Skeleton::new(TrackingId::new(1));
        place(&mut s, JointType::Head, 0.0, 1.8, 0.0);
        place(&mut s, JointType::SpineShoulder, 0.0, 1.5, 0.0);
        place(&mut s, JointType::SpineMid, 0.0, 1.0, 0.0);
        place(&mut s, JointType::SpineBase, 0.0, 0.9, 0.0);

        place(&mut s, JointType::ShoulderLeft, -0.2, 1.5, 0.0);
        place(&mut s, JointType::ShoulderRight, 0.2, 1.5, 0.0);

        // Right leg: 0.4 + 0.4 + 0.1 = 0.9
        place(&mut s, JointType::HipRight, 0.1, 0.9, 0.0);
        place(&mut s, JointType::KneeRight, 0.1, 0.5, 0.0);
        place(&mut s, JointType::AnkleRight, 0.1, 0.1, 0.0);
        place(&mut s, JointType::FootRight, 0.1, 0.0, 0.0);

        // Left leg: 0.45 + 0.45 + 0.1 = 1.0
        place(&mut s, JointType::HipLeft, -0.1, 1.0, 0.0);
        place(&mut s, JointType::KneeLeft, -0.1, 0.55, 0.0);
        place(&mut s, JointType::AnkleLeft, -0.1, 0.1, 0.0);
        place(&mut s, JointType::FootLeft, -0.1, 0.0, 0.0);

        // Right arm hangs down: 0.3 + 0.25 + 0.05 + 0.1 = 0.7
        place(&mut s, JointType::ElbowRight, 0.2, 1.2, 0.0);
        place(&mut s, JointType::WristRight, 0.2, 0.95, 0.0);
        place(&mut s, JointType::HandRight, 0.2, 0.9, 0.0);
        place(&mut s, JointType::HandTipRight, 0.2, 0.8, 0.0);

        // Left arm stretched sideways: 0.3 + 0.3 + 0.1 + 0.1 = 0.8
        place(&mut s, JointType::ElbowLeft, -0.5, 1.5, 0.0);
        place(&mut s, JointType::WristLeft, -0.8, 1.5, 0.0);
        place(&mut s, JointType::HandLeft, -0.9, 1.5, 0.0);
        place(&mut s, JointType::HandTipLeft, -1.0, 1.5, 0.0);
        s
    }

    fn demote(s: &mut Skeleton, chain: &[JointType], state: TrackingState) {
        for &joint in chain {
            s.set_state(joint, state);
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_chain_length() {
        let s = upright();
        assert!(close(chain_length(&s, &SPINE), 0.9));
        assert!(close(chain_length(&s, &TORSO), 0.6));
        assert!(close(chain_length(&s, &SHOULDERS), 0.4));
        assert!(close(chain_length(&s, &RIGHT_LEG), 0.9));
        assert!(close(chain_length(&s, &LEFT_LEG), 1.0));
        assert_eq!(chain_length(&s, &[JointType::Head]), 0.0);
        assert_eq!(chain_length(&s, &[]), 0.0);
    }

    #[test]
    fn test_tie_goes_right() {
        let e = extract_detailed(&upright());
        assert_eq!(e.leg_side, Side::Right);
        assert_eq!(e.arm_side, Side::Right);
        assert!(close(e.measurements.leg_length, 0.9));
        assert!(close(e.measurements.arm_length, 0.7));
    }

    #[test]
    fn test_height_example() {
        // Right leg fully tracked, left leg not tracked at all.
        let mut s = upright();
        demote(&mut s, &LEFT_LEG, TrackingState::NotTracked);

        let m = extract_measurements(&s);
        assert!(close(m.height, 0.9 + 0.9 + 0.1), "height {}", m.height);
        assert!(close(m.shoulder_width, 0.4));
        assert!(close(m.torso_length, 0.6));
    }

    #[test]
    fn test_left_wins_with_more_tracked_joints() {
        let mut s = upright();
        s.set_state(JointType::KneeRight, TrackingState::Inferred);
        s.set_state(JointType::ElbowRight, TrackingState::NotTracked);

        let e = extract_detailed(&s);
        assert_eq!(e.leg_side, Side::Left);
        assert_eq!(e.arm_side, Side::Left);
        assert!(close(e.measurements.leg_length, 1.0));
        assert!(close(e.measurements.arm_length, 0.8));
        assert!(close(e.measurements.height, 0.9 + 1.0 + HEAD_DIVERGENCE));
    }

    #[test]
    fn test_inferred_does_not_count_as_tracked() {
        let mut s = upright();
        demote(&mut s, &LEFT_LEG, TrackingState::Inferred);
        assert_eq!(tracked_count(&s, &LEFT_LEG), 0);
        assert_eq!(tracked_count(&s, &RIGHT_LEG), 4);
    }

    #[test]
    fn test_untracked_joints_still_contribute_positions() {
        // The right knee is lost and reported at the origin.
        let mut s = upright();
        s.set_joint(JointType::KneeRight, Joint::default());
        demote(&mut s, &LEFT_LEG, TrackingState::NotTracked);

        let e = extract_detailed(&s);
        assert_eq!(e.leg_side, Side::Right);
        let expected = Joint::tracked(0.1, 0.9, 0.0).distance(&Joint::default())
            + Joint::default().distance(&Joint::tracked(0.1, 0.1, 0.0))
            + 0.1;
        assert!(close(e.measurements.leg_length, expected));
    }

    #[test]
    fn test_empty_skeleton_is_degenerate() {
        let m = extract_measurements(&Skeleton::new(TrackingId::new(3)));
        assert!(close(m.height, HEAD_DIVERGENCE));
        assert!(!m.is_complete());
    }

    #[test]
    fn test_choose_side() {
        assert_eq!(choose_side(3, 2), Side::Left);
        assert_eq!(choose_side(2, 3), Side::Right);
        assert_eq!(choose_side(2, 2), Side::Right);
        assert_eq!(choose_side(0, 0), Side::Right);
    }

    fn arb_position() -> impl Strategy<Value = (f64, f64, f64)> {
        (-2.0f64..2.0, -0.5f64..2.5, 0.5f64..4.5)
    }

    fn arb_state() -> impl Strategy<Value = TrackingState> {
        prop_oneof![
            Just(TrackingState::NotTracked),
            Just(TrackingState::Inferred),
            Just(TrackingState::Tracked),
        ]
    }

    fn arb_skeleton() -> impl Strategy<Value = Skeleton> {
        proptest::collection::vec((arb_position(), arb_state()), JointType::count()).prop_map(
            |readings| {
                let mut s = Skeleton::new(TrackingId::new(1));
                for (&joint, ((x, y, z), state)) in JointType::all().iter().zip(readings) {
                    s.set_joint(joint, Joint::new(crate::Position3D::new(x, y, z), state));
                }
                s
            },
        )
    }

    proptest! {
        #[test]
        fn prop_height_at_least_leg(s in arb_skeleton()) {
            let m = extract_measurements(&s);
            prop_assert!(m.height >= m.leg_length);
        }

        #[test]
        fn prop_extraction_is_pure(s in arb_skeleton()) {
            let copy = s.clone();
            prop_assert_eq!(extract_measurements(&s), extract_measurements(&copy));
        }

        #[test]
        fn prop_joint_distance_symmetric(s in arb_skeleton(), a in 0usize..25, b in 0usize..25) {
            let ja = JointType::all()[a];
            let jb = JointType::all()[b];
            prop_assert_eq!(joint_distance(&s, ja, jb), joint_distance(&s, jb, ja));
        }
    }
}
