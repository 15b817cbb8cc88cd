//! Identity matcher
//!
//! Each tracking session accumulates a running average in the unknown store.
//! Once enough observations are folded in, the average is compared against
//! every known subject. A close enough match recognizes the session; anything
//! else enrolls it as a new known subject. Either way the session is then
//! resolved and stops touching the stores.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use stature_core::{
    Identity, MeasurementVector, StatureError, StatureResult, SubjectId, TrackingId,
};
use tracing::{debug, info};

use crate::{IdentityRecord, RecordStore};

/// Matcher tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Folds a session needs before it is classified (strictly more than this)
    pub min_observations: u64,
    /// Largest accepted distance to a known subject, in store units
    pub match_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_observations: 100,
            match_threshold: 0.01,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> StatureResult<()> {
        if self.min_observations == 0 {
            return Err(StatureError::InvalidConfig(
                "min_observations must be at least 1".into(),
            ));
        }
        if !self.match_threshold.is_finite() || self.match_threshold <= 0.0 {
            return Err(StatureError::InvalidConfig(format!(
                "match_threshold must be positive, got {}",
                self.match_threshold
            )));
        }
        Ok(())
    }
}

/// Closest known record to `query` and its distance. Earlier rows win ties.
pub fn nearest<'a>(
    query: &MeasurementVector,
    known: &'a [IdentityRecord],
) -> Option<(&'a IdentityRecord, f64)> {
    let mut best: Option<(&IdentityRecord, f64)> = None;
    for record in known {
        let distance = record.measurements.distance(query);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((record, distance));
        }
    }
    best
}

/// Classify a query vector (store units) against known records
pub fn classify(
    query: &MeasurementVector,
    known: &[IdentityRecord],
    threshold: f64,
) -> Identity {
    match nearest(query, known) {
        Some((record, distance)) if distance < threshold => {
            Identity::Recognized(SubjectId::new(record.id.clone()))
        }
        _ => Identity::Unrecognized,
    }
}

/// What one observation did
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Degenerate measurement, nothing stored
    Skipped,
    /// Folded into the session average
    Accumulating { count: u64 },
    /// Matched a known subject
    Recognized(SubjectId),
    /// Added as a new known subject
    Enrolled(SubjectId),
    /// Session was already resolved to this subject
    Resolved(SubjectId),
}

impl Observation {
    /// Subject this observation resolved to, if any
    pub fn subject(&self) -> Option<&SubjectId> {
        match self {
            Observation::Recognized(s) | Observation::Enrolled(s) | Observation::Resolved(s) => {
                Some(s)
            }
            Observation::Skipped | Observation::Accumulating { .. } => None,
        }
    }
}

/// Matcher statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatcherStats {
    pub observations: u64,
    pub skipped: u64,
    pub recognized: u64,
    pub enrolled: u64,
}

/// Owns the unknown and known stores and resolves sessions
pub struct IdentityMatcher<S: RecordStore> {
    unknown: S,
    known: S,
    config: MatcherConfig,
    resolved: HashMap<TrackingId, SubjectId>,
    stats: MatcherStats,
}

impl<S: RecordStore> IdentityMatcher<S> {
    pub fn new(unknown: S, known: S) -> Self {
        Self::with_config(unknown, known, MatcherConfig::default())
    }

    pub fn with_config(unknown: S, known: S, config: MatcherConfig) -> Self {
        Self {
            unknown,
            known,
            config,
            resolved: HashMap::new(),
            stats: MatcherStats::default(),
        }
    }

    /// Feed one raw measurement (meters) for a session
    pub fn observe(
        &mut self,
        tracking_id: TrackingId,
        raw: &MeasurementVector,
    ) -> StatureResult<Observation> {
        self.stats.observations += 1;

        if !raw.is_complete() {
            self.stats.skipped += 1;
            debug!(?tracking_id, "skipping degenerate measurement");
            return Ok(Observation::Skipped);
        }

        if let Some(subject) = self.resolved.get(&tracking_id) {
            return Ok(Observation::Resolved(subject.clone()));
        }

        let key = tracking_id.to_string();
        let Some(mut record) = self.unknown.find(&key)? else {
            self.unknown
                .upsert(IdentityRecord::for_session(tracking_id, raw))?;
            debug!(?tracking_id, "session seeded");
            return Ok(Observation::Accumulating { count: 0 });
        };

        record.fold(raw);

        if record.count <= self.config.min_observations {
            let count = record.count;
            self.unknown.upsert(record)?;
            return Ok(Observation::Accumulating { count });
        }

        // Read the known store before writing anything, so a bad known store
        // leaves the session row as it was.
        let known = self.known.load()?;
        let identity = classify(&record.measurements, &known, self.config.match_threshold);
        self.unknown.upsert(record.clone())?;

        let observation = match identity {
            Identity::Recognized(subject) => {
                self.stats.recognized += 1;
                info!(?tracking_id, %subject, "recognized");
                Observation::Recognized(subject)
            }
            Identity::Unrecognized => {
                let subject = SubjectId::from(tracking_id);
                self.known.append(record.relabel(subject.as_str()))?;
                self.stats.enrolled += 1;
                info!(?tracking_id, %subject, known = known.len() + 1, "enrolled");
                Observation::Enrolled(subject)
            }
        };

        if let Some(subject) = observation.subject() {
            self.resolved.insert(tracking_id, subject.clone());
        }
        Ok(observation)
    }

    /// Classify a raw measurement (meters) against the known store without
    /// touching any session
    pub fn identify(&self, raw: &MeasurementVector) -> StatureResult<Identity> {
        let known = self.known.load()?;
        Ok(classify(
            &raw.to_store_units(),
            &known,
            self.config.match_threshold,
        ))
    }

    /// Forget that a session was resolved
    pub fn end_session(&mut self, tracking_id: TrackingId) -> bool {
        self.resolved.remove(&tracking_id).is_some()
    }

    /// Forget every resolved session
    pub fn end_all_sessions(&mut self) -> usize {
        let ended = self.resolved.len();
        self.resolved.clear();
        ended
    }

    pub fn resolution(&self, tracking_id: TrackingId) -> Option<&SubjectId> {
        self.resolved.get(&tracking_id)
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn stats(&self) -> &MatcherStats {
        &self.stats
    }

    pub fn unknown(&self) -> &S {
        &self.unknown
    }

    pub fn known(&self) -> &S {
        &self.known
    }
}
