//! Skeleton snapshot - joints of one tracked body in one frame
//!
//! The sensor allocates and refreshes these every frame. Nothing in this
//! crate mutates a snapshot after it has been handed over.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stature_core::TrackingId;

/// Joint identifier for the sensor's 25-joint body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JointType {
    SpineBase,
    SpineMid,
    Neck,
    Head,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
    SpineShoulder,
    HandTipLeft,
    ThumbLeft,
    HandTipRight,
    ThumbRight,
}

impl JointType {
    /// All joints in sensor order
    pub fn all() -> &'static [JointType] {
        &[
            JointType::SpineBase,
            JointType::SpineMid,
            JointType::Neck,
            JointType::Head,
            JointType::ShoulderLeft,
            JointType::ElbowLeft,
            JointType::WristLeft,
            JointType::HandLeft,
            JointType::ShoulderRight,
            JointType::ElbowRight,
            JointType::WristRight,
            JointType::HandRight,
            JointType::HipLeft,
            JointType::KneeLeft,
            JointType::AnkleLeft,
            JointType::FootLeft,
            JointType::HipRight,
            JointType::KneeRight,
            JointType::AnkleRight,
            JointType::FootRight,
            JointType::SpineShoulder,
            JointType::HandTipLeft,
            JointType::ThumbLeft,
            JointType::HandTipRight,
            JointType::ThumbRight,
        ]
    }

    /// Number of joints
    pub fn count() -> usize {
        25
    }
}

/// Sensor confidence in a joint position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackingState {
    #[default]
    NotTracked,
    Inferred,
    Tracked,
}

/// Camera-space position in meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Distance to another position
    pub fn distance(&self, other: &Position3D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Offset by a displacement
    pub fn offset(&self, dx: f64, dy: f64, dz: f64) -> Position3D {
        Position3D::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Inferred joints can report a negative depth; raise z to at least `min`
    pub fn clamp_depth(&self, min: f64) -> Position3D {
        Position3D {
            z: if self.z < min { min } else { self.z },
            ..*self
        }
    }
}

/// One joint reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Joint {
    pub position: Position3D,
    #[serde(default)]
    pub state: TrackingState,
}

impl Joint {
    pub fn new(position: Position3D, state: TrackingState) -> Self {
        Self { position, state }
    }

    pub fn tracked(x: f64, y: f64, z: f64) -> Self {
        Self::new(Position3D::new(x, y, z), TrackingState::Tracked)
    }

    pub fn inferred(x: f64, y: f64, z: f64) -> Self {
        Self::new(Position3D::new(x, y, z), TrackingState::Inferred)
    }

    pub fn is_tracked(&self) -> bool {
        self.state == TrackingState::Tracked
    }

    /// Distance between two joint positions, regardless of confidence
    pub fn distance(&self, other: &Joint) -> f64 {
        self.position.distance(&other.position)
    }
}

/// All joints of one body in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SkeletonRepr", into = "SkeletonRepr")]
pub struct Skeleton {
    /// Sensor id for this body
    pub tracking_id: TrackingId,

    /// Is the body currently tracked at all?
    pub is_tracked: bool,

    /// Joint readings (indexed by JointType)
    joints: Vec<Joint>,
}

impl Skeleton {
    /// Create a tracked skeleton with every joint at the origin, not tracked
    pub fn new(tracking_id: TrackingId) -> Self {
        Self {
            tracking_id,
            is_tracked: true,
            joints: vec![Joint::default(); JointType::count()],
        }
    }

    /// A body slot the sensor is not tracking
    pub fn untracked() -> Self {
        Self {
            is_tracked: false,
            ..Self::new(TrackingId::ZERO)
        }
    }

    /// Get a joint by type
    pub fn joint(&self, joint: JointType) -> Joint {
        self.joints.get(joint as usize).copied().unwrap_or_default()
    }

    /// Set a joint
    pub fn set_joint(&mut self, joint: JointType, reading: Joint) {
        let idx = joint as usize;
        if idx < self.joints.len() {
            self.joints[idx] = reading;
        }
    }

    /// Builder form of `set_joint`
    pub fn with_joint(mut self, joint: JointType, reading: Joint) -> Self {
        self.set_joint(joint, reading);
        self
    }

    /// Override the tracking state of one joint, keeping its position
    pub fn set_state(&mut self, joint: JointType, state: TrackingState) {
        let mut reading = self.joint(joint);
        reading.state = state;
        self.set_joint(joint, reading);
    }

    /// Iterate over (type, joint) pairs
    pub fn iter(&self) -> impl Iterator<Item = (JointType, Joint)> + '_ {
        JointType::all().iter().map(move |&t| (t, self.joint(t)))
    }
}

#[derive(Serialize, Deserialize)]
struct SkeletonRepr {
    tracking_id: TrackingId,
    #[serde(default = "default_tracked")]
    is_tracked: bool,
    #[serde(default)]
    joints: BTreeMap<JointType, Joint>,
}

fn default_tracked() -> bool {
    true
}

impl From<SkeletonRepr> for Skeleton {
    fn from(repr: SkeletonRepr) -> Self {
        let mut skeleton = Skeleton::new(repr.tracking_id);
        skeleton.is_tracked = repr.is_tracked;
        for (joint, reading) in repr.joints {
            skeleton.set_joint(joint, reading);
        }
        skeleton
    }
}

impl From<Skeleton> for SkeletonRepr {
    fn from(skeleton: Skeleton) -> Self {
        SkeletonRepr {
            tracking_id: skeleton.tracking_id,
            is_tracked: skeleton.is_tracked,
            joints: skeleton.iter().collect(),
        }
    }
}

/// Every body slot reported by the sensor for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyFrame {
    /// Sensor-relative time in milliseconds
    pub timestamp_ms: u64,
    pub bodies: Vec<Skeleton>,
}

impl BodyFrame {
    pub fn new(timestamp_ms: u64, bodies: Vec<Skeleton>) -> Self {
        Self {
            timestamp_ms,
            bodies,
        }
    }

    /// The first body slot with tracking on
    pub fn first_tracked(&self) -> Option<&Skeleton> {
        self.bodies.iter().find(|b| b.is_tracked)
    }

    /// All tracked bodies
    pub fn tracked(&self) -> impl Iterator<Item = &Skeleton> {
        self.bodies.iter().filter(|b| b.is_tracked)
    }
}
