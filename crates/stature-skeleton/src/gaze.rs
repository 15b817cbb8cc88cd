//! Gaze target - where a robot should look to meet the subject
//!
//! The head joint gives the horizontal and vertical aim; the spine midpoint
//! gives a depth that stays stable while the head moves.

use serde::{Deserialize, Serialize};

use crate::{BodyFrame, JointType, Skeleton};

/// Smallest depth reported for a subject, in meters
pub const MIN_DEPTH: f64 = 0.1;

/// Aim point for the first tracked subject
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeTarget {
    /// Head x in camera space
    pub x: f64,
    /// Head y in camera space
    pub y: f64,
    /// Spine-mid z, never below `MIN_DEPTH`
    pub depth: f64,
}

impl GazeTarget {
    pub fn from_skeleton(skeleton: &Skeleton) -> Self {
        let head = skeleton.joint(JointType::Head).position;
        let spine = skeleton
            .joint(JointType::SpineMid)
            .position
            .clamp_depth(MIN_DEPTH);

        GazeTarget {
            x: head.x,
            y: head.y,
            depth: spine.z,
        }
    }

    /// Horizontal and vertical angles in radians from the sensor axis
    pub fn angles(&self) -> (f64, f64) {
        (self.x.atan2(self.depth), self.y.atan2(self.depth))
    }
}

/// Gaze target of the first tracked body, or `None` when nobody is tracked
pub fn gaze_target(frame: &BodyFrame) -> Option<GazeTarget> {
    frame.first_tracked().map(GazeTarget::from_skeleton)
}
