//! Identity record - one row of a measurement store

use stature_core::{MeasurementVector, TrackingId};

/// Running average of one subject's measurements, in store units
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityRecord {
    /// Tracking id for session rows, subject label for known rows
    pub id: String,
    /// Averaged measurements, scaled by `STORE_SCALE`
    pub measurements: MeasurementVector,
    /// Number of folds since the row was seeded
    pub count: u64,
}

impl IdentityRecord {
    pub fn new(id: impl Into<String>, measurements: MeasurementVector, count: u64) -> Self {
        Self {
            id: id.into(),
            measurements,
            count,
        }
    }

    /// First row for a session, from a raw measurement in meters
    pub fn seed(id: impl Into<String>, raw: &MeasurementVector) -> Self {
        Self::new(id, raw.to_store_units(), 0)
    }

    /// Session row keyed by tracking id
    pub fn for_session(tracking_id: TrackingId, raw: &MeasurementVector) -> Self {
        Self::seed(tracking_id.to_string(), raw)
    }

    /// Fold one raw measurement (meters) into the running average.
    ///
    /// The counter is bumped first, then each dimension becomes
    /// `(avg * (count - 1) + new) / count`. The first fold after a seed
    /// therefore replaces the seeded value.
    pub fn fold(&mut self, raw: &MeasurementVector) {
        self.count += 1;
        let n = self.count as f64;
        let previous = self.measurements.as_array();
        let incoming = raw.to_store_units().as_array();

        let mut averaged = [0.0; MeasurementVector::DIMENSIONS];
        for (i, slot) in averaged.iter_mut().enumerate() {
            *slot = (previous[i] * (n - 1.0) + incoming[i]) / n;
        }
        self.measurements = MeasurementVector::from_array(averaged);
    }

    /// Same measurements under a different label
    pub fn relabel(&self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self.clone()
        }
    }
}
