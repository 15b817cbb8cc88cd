//! Stature Skeleton
//!
//! Skeleton snapshots as delivered once per sensor frame, and the pure
//! functions that turn one snapshot into body measurements.
//!
//! # Measurements
//!
//! - Height: head down the spine, plus the better tracked leg, plus a fixed
//!   head-top offset
//! - Leg and arm length: the better tracked side's chain
//! - Shoulder width: left shoulder, neck, right shoulder
//! - Torso: neck down to the spine base
//!
//! Nothing here rejects a poorly tracked skeleton. Check
//! `MeasurementVector::is_complete` before trusting a result.

pub mod extract;
pub mod gaze;
pub mod pose;
pub mod topology;

pub use extract::*;
pub use gaze::*;
pub use pose::*;
pub use topology::*;
