//! Bone topology - which joints are connected

use crate::JointType;

/// A bone is a segment between two joints, parent first
pub type Bone = (JointType, JointType);

/// Bones of the sensor body, parent before child
pub const BONES: [Bone; 24] = [
    // Torso
    (JointType::Head, JointType::Neck),
    (JointType::Neck, JointType::SpineShoulder),
    (JointType::SpineShoulder, JointType::SpineMid),
    (JointType::SpineMid, JointType::SpineBase),
    (JointType::SpineShoulder, JointType::ShoulderRight),
    (JointType::SpineShoulder, JointType::ShoulderLeft),
    (JointType::SpineBase, JointType::HipRight),
    (JointType::SpineBase, JointType::HipLeft),
    // Right arm
    (JointType::ShoulderRight, JointType::ElbowRight),
    (JointType::ElbowRight, JointType::WristRight),
    (JointType::WristRight, JointType::HandRight),
    (JointType::HandRight, JointType::HandTipRight),
    (JointType::WristRight, JointType::ThumbRight),
    // Left arm
    (JointType::ShoulderLeft, JointType::ElbowLeft),
    (JointType::ElbowLeft, JointType::WristLeft),
    (JointType::WristLeft, JointType::HandLeft),
    (JointType::HandLeft, JointType::HandTipLeft),
    (JointType::WristLeft, JointType::ThumbLeft),
    // Right leg
    (JointType::HipRight, JointType::KneeRight),
    (JointType::KneeRight, JointType::AnkleRight),
    (JointType::AnkleRight, JointType::FootRight),
    // Left leg
    (JointType::HipLeft, JointType::KneeLeft),
    (JointType::KneeLeft, JointType::AnkleLeft),
    (JointType::AnkleLeft, JointType::FootLeft),
];
