//! End-to-end scenarios
//!
//! A scenario drives simulated subjects through an observer and collects
//! the final observation of every session.

use std::collections::HashMap;

use stature_core::{MeasurementVector, TrackingId};
use stature_identity::{IdentityMatcher, MatcherConfig, MemoryStore, Observation, RecordStore};
use stature_runtime::{Observer, ObserverOutput, SensorEvent};

use crate::{SkeletonSimulator, Subject};

/// Outcome of one visit
#[derive(Clone, Debug, Default)]
pub struct SessionReport {
    /// Every observation of the session, in order
    pub observations: Vec<Observation>,
    /// Last raw measurement extracted for the session
    pub last_measurement: Option<MeasurementVector>,
}

impl SessionReport {
    /// The first observation that resolved the session
    pub fn resolution(&self) -> Option<&Observation> {
        self.observations
            .iter()
            .find(|o| matches!(o, Observation::Recognized(_) | Observation::Enrolled(_)))
    }
}

/// Subjects visiting one observer
pub struct Scenario<S: RecordStore> {
    observer: Observer<S>,
    simulator: SkeletonSimulator,
}

impl Scenario<MemoryStore> {
    /// Scenario over fresh in-memory stores
    pub fn in_memory(config: MatcherConfig, simulator: SkeletonSimulator) -> Self {
        let matcher = IdentityMatcher::with_config(MemoryStore::new(), MemoryStore::new(), config);
        Scenario::new(Observer::new(matcher), simulator)
    }
}

impl<S: RecordStore> Scenario<S> {
    pub fn new(observer: Observer<S>, simulator: SkeletonSimulator) -> Self {
        Scenario {
            observer,
            simulator,
        }
    }

    /// Keep `subjects` in view for `frames` frames
    pub fn visit(&mut self, subjects: &[Subject], frames: usize) -> HashMap<TrackingId, SessionReport> {
        let mut reports: HashMap<TrackingId, SessionReport> = HashMap::new();

        for _ in 0..frames {
            let frame = self.simulator.frame(subjects);
            for output in self.observer.handle(SensorEvent::frame(frame)) {
                if let ObserverOutput::Observation {
                    tracking_id,
                    measurements,
                    observation,
                    ..
                } = output
                {
                    let report = reports.entry(tracking_id).or_default();
                    report.observations.push(observation);
                    report.last_measurement = Some(measurements);
                }
            }
        }
        reports
    }

    /// The sensor drops out and comes back
    pub fn sensor_blink(&mut self) -> Vec<ObserverOutput> {
        let mut outputs = self.observer.handle(SensorEvent::available(false));
        outputs.extend(self.observer.handle(SensorEvent::available(true)));
        outputs
    }

    pub fn observer(&self) -> &Observer<S> {
        &self.observer
    }

    pub fn into_observer(self) -> Observer<S> {
        self.observer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BodyProfile;
    use stature_core::SubjectId;
    use stature_runtime::{ObserverService, RuntimeConfig};
    use stature_identity::StoreConfig;
    use tempfile::tempdir;

    fn quick() -> MatcherConfig {
        MatcherConfig {
            min_observations: 10,
            match_threshold: 0.01,
        }
    }

    fn alice(id: u64) -> Subject {
        Subject::standing(TrackingId::new(id), BodyProfile::tall_adult(), -0.4, 2.2)
    }

    fn bob(id: u64) -> Subject {
        Subject::standing(TrackingId::new(id), BodyProfile::short_adult(), 0.4, 2.6)
    }

    #[test]
    fn test_first_visit_enrolls() {
        let mut scenario = Scenario::in_memory(quick(), SkeletonSimulator::new(1));
        let reports = scenario.visit(&[alice(100)], 15);

        let report = &reports[&TrackingId::new(100)];
        assert_eq!(
            report.resolution(),
            Some(&Observation::Enrolled(SubjectId::new("100")))
        );
        assert_eq!(report.observations.len(), 15);
        assert!(matches!(report.observations[14], Observation::Resolved(_)));
    }

    #[test]
    fn test_two_people_then_return_visit() {
        let mut scenario = Scenario::in_memory(quick(), SkeletonSimulator::new(2));
        scenario.visit(&[alice(1), bob(2)], 12);

        // Both leave; the sensor hands out new ids when they come back.
        let outputs = scenario.sensor_blink();
        assert_eq!(outputs[0], ObserverOutput::SensorLost { sessions_ended: 2 });

        let reports = scenario.visit(&[bob(3), alice(4)], 12);
        assert_eq!(
            reports[&TrackingId::new(3)].resolution(),
            Some(&Observation::Recognized(SubjectId::new("2")))
        );
        assert_eq!(
            reports[&TrackingId::new(4)].resolution(),
            Some(&Observation::Recognized(SubjectId::new("1")))
        );
        assert_eq!(scenario.observer().matcher().known().len().unwrap(), 2);
    }

    #[test]
    fn test_sensor_noise_defeats_tight_threshold() {
        // Millimeter noise moves the session averages far more than the
        // 0.01 acceptance radius, so a return visit enrolls again.
        let sim = SkeletonSimulator::new(3).with_jitter(0.002);
        let mut scenario = Scenario::in_memory(quick(), sim);

        scenario.visit(&[alice(1)], 12);
        let reports = scenario.visit(&[alice(2)], 12);

        assert_eq!(
            reports[&TrackingId::new(2)].resolution(),
            Some(&Observation::Enrolled(SubjectId::new("2")))
        );
    }

    #[test]
    fn test_looser_threshold_recognizes_noisy_return() {
        let config = MatcherConfig {
            min_observations: 50,
            match_threshold: 25.0,
        };
        let sim = SkeletonSimulator::new(4).with_jitter(0.002);
        let mut scenario = Scenario::in_memory(config, sim);

        scenario.visit(&[alice(1), bob(2)], 55);
        let reports = scenario.visit(&[alice(3)], 55);

        assert_eq!(
            reports[&TrackingId::new(3)].resolution(),
            Some(&Observation::Recognized(SubjectId::new("1")))
        );
    }

    #[test]
    fn test_measurements_track_profile() {
        let mut scenario = Scenario::in_memory(quick(), SkeletonSimulator::new(5));
        let reports = scenario.visit(&[bob(9)], 1);

        let measured = reports[&TrackingId::new(9)].last_measurement.unwrap();
        assert!(measured.distance(&BodyProfile::short_adult().expected()) < 1e-9);
    }

    #[tokio::test]
    async fn test_service_over_file_stores() {
        let dir = tempdir().unwrap();
        let config = RuntimeConfig {
            store: StoreConfig::in_directory(dir.path()),
            matcher: quick(),
            ..RuntimeConfig::default()
        };

        let observer = Observer::from_config(&config).unwrap();
        let (handle, mut outputs, task) = ObserverService::spawn(observer, config.channel_capacity);

        let consumer = tokio::spawn(async move {
            let mut resolved = Vec::new();
            while let Some(output) = outputs.recv().await {
                if let Some(Observation::Enrolled(subject)) = output.observation() {
                    resolved.push(subject.clone());
                }
            }
            resolved
        });

        let mut sim = SkeletonSimulator::new(6);
        for _ in 0..12 {
            handle
                .send(SensorEvent::frame(sim.frame(&[alice(21), bob(22)])))
                .await
                .unwrap();
        }
        handle.shutdown().await.unwrap();
        task.await.unwrap();

        let mut enrolled = consumer.await.unwrap();
        enrolled.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(enrolled, vec![SubjectId::new("21"), SubjectId::new("22")]);

        let known = std::fs::read_to_string(config.store.known_path()).unwrap();
        assert_eq!(known.lines().count(), 2);
        assert!(known.lines().all(|l| l.split(';').count() == 7));
    }
}
