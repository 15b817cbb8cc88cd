//! Body measurements derived from one skeleton snapshot

use serde::{Deserialize, Serialize};

use crate::SubjectId;

/// Factor applied to meter-based measurements before they are persisted
pub const STORE_SCALE: f64 = 1000.0;

/// Anthropometric scalars for one subject, in meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasurementVector {
    /// Head top to floor
    pub height: f64,
    /// Hip to foot along the chosen leg
    pub leg_length: f64,
    /// Shoulder to hand tip along the chosen arm
    pub arm_length: f64,
    /// Left shoulder to right shoulder through the neck
    pub shoulder_width: f64,
    /// Neck to spine base
    pub torso_length: f64,
}

impl MeasurementVector {
    /// Number of dimensions
    pub const DIMENSIONS: usize = 5;

    pub fn new(
        height: f64,
        leg_length: f64,
        arm_length: f64,
        shoulder_width: f64,
        torso_length: f64,
    ) -> Self {
        Self {
            height,
            leg_length,
            arm_length,
            shoulder_width,
            torso_length,
        }
    }

    /// Dimensions in store column order
    pub fn as_array(&self) -> [f64; Self::DIMENSIONS] {
        [
            self.height,
            self.leg_length,
            self.arm_length,
            self.shoulder_width,
            self.torso_length,
        ]
    }

    pub fn from_array(values: [f64; Self::DIMENSIONS]) -> Self {
        let [height, leg_length, arm_length, shoulder_width, torso_length] = values;
        Self::new(height, leg_length, arm_length, shoulder_width, torso_length)
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> {
        self.as_array().into_iter()
    }

    /// Every dimension is finite and strictly positive.
    ///
    /// A vector failing this carries at least one chain that collapsed onto
    /// a single point, which happens when the sensor reports untracked joints
    /// at the origin.
    pub fn is_complete(&self) -> bool {
        self.iter().all(|v| v.is_finite() && v > 0.0)
    }

    /// Multiply every dimension by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self::from_array(self.as_array().map(|v| v * factor))
    }

    /// Meters to store units
    pub fn to_store_units(&self) -> Self {
        self.scaled(STORE_SCALE)
    }

    /// Euclidean distance over all dimensions
    pub fn distance(&self, other: &MeasurementVector) -> f64 {
        self.iter()
            .zip(other.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}

/// Verdict of matching a measurement vector against known subjects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Recognized(SubjectId),
    Unrecognized,
}

impl Identity {
    pub fn is_recognized(&self) -> bool {
        matches!(self, Identity::Recognized(_))
    }

    pub fn subject(&self) -> Option<&SubjectId> {
        match self {
            Identity::Recognized(subject) => Some(subject),
            Identity::Unrecognized => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_array_order_matches_fields() {
        let m = MeasurementVector::new(1.8, 0.9, 0.7, 0.4, 0.6);
        assert_eq!(m.as_array(), [1.8, 0.9, 0.7, 0.4, 0.6]);
        assert_eq!(MeasurementVector::from_array(m.as_array()), m);
    }

    #[test]
    fn test_completeness() {
        assert!(MeasurementVector::new(1.8, 0.9, 0.7, 0.4, 0.6).is_complete());
        assert!(!MeasurementVector::default().is_complete());
        assert!(!MeasurementVector::new(1.8, 0.0, 0.7, 0.4, 0.6).is_complete());
        assert!(!MeasurementVector::new(f64::NAN, 0.9, 0.7, 0.4, 0.6).is_complete());
    }

    #[test]
    fn test_store_units() {
        let m = MeasurementVector::new(1.5, 0.5, 0.25, 0.125, 1.0).to_store_units();
        assert_eq!(m.as_array(), [1500.0, 500.0, 250.0, 125.0, 1000.0]);
    }

    #[test]
    fn test_distance_known_value() {
        let a = MeasurementVector::new(0.0, 0.0, 0.0, 0.0, 0.0);
        let b = MeasurementVector::new(3.0, 4.0, 0.0, 0.0, 0.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_identity_subject() {
        let id = Identity::Recognized(SubjectId::new("7"));
        assert!(id.is_recognized());
        assert_eq!(id.subject().map(|s| s.as_str()), Some("7"));
        assert_eq!(Identity::Unrecognized.subject(), None);
    }

    proptest! {
        #[test]
        fn prop_distance_symmetric(
            a in proptest::array::uniform5(0.0f64..3.0),
            b in proptest::array::uniform5(0.0f64..3.0),
        ) {
            let a = MeasurementVector::from_array(a);
            let b = MeasurementVector::from_array(b);
            prop_assert_eq!(a.distance(&b), b.distance(&a));
            prop_assert!(a.distance(&a) == 0.0);
        }
    }
}
