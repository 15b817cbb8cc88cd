//! Identity types
//!
//! A `TrackingId` is assigned by the sensor to a body for as long as it stays
//! in view. A `SubjectId` labels a row of the known-identities store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sensor-assigned body id, stable for one tracking session
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingId(pub u64);

impl TrackingId {
    pub const ZERO: TrackingId = TrackingId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        TrackingId(id)
    }

    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tracking({})", self.0)
    }
}

/// Decimal, as written into the id column of the stores
impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Label of a known subject
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub String);

impl SubjectId {
    pub fn new(label: impl Into<String>) -> Self {
        SubjectId(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<TrackingId> for SubjectId {
    fn from(id: TrackingId) -> Self {
        SubjectId(id.to_string())
    }
}

impl fmt::Debug for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subject({})", self.0)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
