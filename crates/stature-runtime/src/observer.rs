//! Observer - the runtime loop
//!
//! Sensor events are queued by the caller and processed in `tick`. Outputs
//! are collected with `pop_output`. Nothing here is shared between threads;
//! see `ObserverService` for the task that owns an observer.

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use stature_core::{StatureResult, TrackingId};
use stature_identity::{FileStore, IdentityMatcher, Observation, RecordStore};
use stature_skeleton::{extract_measurements, gaze_target, BodyFrame};
use tracing::{debug, info, warn};

use crate::{ObserverOutput, RuntimeConfig, SensorEvent};

/// Observer buffer limits
#[derive(Clone, Debug)]
pub struct ObserverConfig {
    /// Maximum queued sensor events
    pub max_event_buffer: usize,
    /// Maximum queued outputs
    pub max_output_buffer: usize,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        let runtime = RuntimeConfig::default();
        ObserverConfig {
            max_event_buffer: runtime.max_event_buffer,
            max_output_buffer: runtime.max_output_buffer,
        }
    }
}

impl From<&RuntimeConfig> for ObserverConfig {
    fn from(config: &RuntimeConfig) -> Self {
        ObserverConfig {
            max_event_buffer: config.max_event_buffer,
            max_output_buffer: config.max_output_buffer,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub ticks: u64,
    pub events_queued: u64,
    pub events_dropped: u64,
    pub frames: u64,
    pub frames_while_unavailable: u64,
    pub bodies: u64,
    pub observations: u64,
    pub skipped: u64,
    pub recognized: u64,
    pub enrolled: u64,
    pub store_errors: u64,
    pub outputs_dropped: u64,
    pub sessions_ended: u64,
    pub sensor_losses: u64,
    pub last_tick_duration: Duration,
}

/// Turns sensor frames into identity observations
pub struct Observer<S: RecordStore> {
    matcher: IdentityMatcher<S>,
    config: ObserverConfig,
    /// Whether the sensor is currently delivering frames
    sensor_available: bool,
    /// Tracking ids in view as of the last frame
    active: HashSet<TrackingId>,
    incoming: VecDeque<SensorEvent>,
    outgoing: VecDeque<ObserverOutput>,
    stats: RuntimeStats,
}

impl Observer<FileStore> {
    /// Observer over the file stores named in `config`
    pub fn from_config(config: &RuntimeConfig) -> StatureResult<Self> {
        config.validate()?;
        let (unknown, known) = config.store.open();
        let matcher = IdentityMatcher::with_config(unknown, known, config.matcher);
        Ok(Observer::with_config(matcher, ObserverConfig::from(config)))
    }
}

impl<S: RecordStore> Observer<S> {
    pub fn new(matcher: IdentityMatcher<S>) -> Self {
        Self::with_config(matcher, ObserverConfig::default())
    }

    pub fn with_config(matcher: IdentityMatcher<S>, config: ObserverConfig) -> Self {
        Observer {
            matcher,
            config,
            sensor_available: true,
            active: HashSet::new(),
            incoming: VecDeque::new(),
            outgoing: VecDeque::new(),
            stats: RuntimeStats::default(),
        }
    }

    /// Queue a sensor event. Returns false when the buffer is full and the
    /// event was dropped.
    pub fn queue(&mut self, event: SensorEvent) -> bool {
        if self.incoming.len() < self.config.max_event_buffer {
            self.incoming.push_back(event);
            self.stats.events_queued += 1;
            true
        } else {
            self.stats.events_dropped += 1;
            false
        }
    }

    /// Next output (if any)
    pub fn pop_output(&mut self) -> Option<ObserverOutput> {
        self.outgoing.pop_front()
    }

    /// Take every pending output
    pub fn drain_outputs(&mut self) -> Vec<ObserverOutput> {
        self.outgoing.drain(..).collect()
    }

    /// Execute one tick of the loop
    pub fn tick(&mut self) {
        let start = Instant::now();
        self.stats.ticks += 1;

        // Stage 1: Drain queued events
        let events: Vec<SensorEvent> = self.incoming.drain(..).collect();

        for event in events {
            match event {
                // Stage 2: Availability
                SensorEvent::Availability { available } => self.set_availability(available),
                SensorEvent::Frame(frame) => self.process_frame(&frame),
            }
        }

        self.stats.last_tick_duration = start.elapsed();
    }

    /// Queue one event and tick
    pub fn handle(&mut self, event: SensorEvent) -> Vec<ObserverOutput> {
        self.queue(event);
        self.tick();
        self.drain_outputs()
    }

    fn set_availability(&mut self, available: bool) {
        if available == self.sensor_available {
            return;
        }
        self.sensor_available = available;

        if available {
            info!("sensor available");
            self.emit(ObserverOutput::SensorRestored);
        } else {
            // No retry: every session in flight is over.
            self.matcher.end_all_sessions();
            let sessions_ended = self.active.len();
            self.active.clear();
            self.stats.sensor_losses += 1;
            warn!(sessions_ended, "sensor not available");
            self.emit(ObserverOutput::SensorLost { sessions_ended });
        }
    }

    fn process_frame(&mut self, frame: &BodyFrame) {
        self.stats.frames += 1;
        if !self.sensor_available {
            self.stats.frames_while_unavailable += 1;
            debug!(timestamp_ms = frame.timestamp_ms, "dropping frame, sensor unavailable");
            return;
        }

        // Stages 3 and 4: Extract and match every tracked body
        for body in frame.tracked() {
            self.stats.bodies += 1;
            self.active.insert(body.tracking_id);

            let measurements = extract_measurements(body);
            match self.matcher.observe(body.tracking_id, &measurements) {
                Ok(observation) => {
                    self.record(&observation);
                    self.emit(ObserverOutput::Observation {
                        tracking_id: body.tracking_id,
                        timestamp_ms: frame.timestamp_ms,
                        measurements,
                        observation,
                    });
                }
                Err(e) => {
                    self.stats.store_errors += 1;
                    warn!(tracking_id = ?body.tracking_id, error = %e, "observation aborted");
                    self.emit(ObserverOutput::Failed {
                        tracking_id: body.tracking_id,
                        timestamp_ms: frame.timestamp_ms,
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Bodies missing from this frame have left the field of view
        let present: HashSet<TrackingId> = frame.tracked().map(|b| b.tracking_id).collect();
        let mut departed: Vec<TrackingId> = self.active.difference(&present).copied().collect();
        departed.sort();
        for tracking_id in departed {
            self.active.remove(&tracking_id);
            self.matcher.end_session(tracking_id);
            self.stats.sessions_ended += 1;
            debug!(?tracking_id, "body left, session ended");
            self.emit(ObserverOutput::SessionEnded {
                tracking_id,
                timestamp_ms: frame.timestamp_ms,
            });
        }

        // Stage 5: Gaze target
        if let Some(target) = gaze_target(frame) {
            self.emit(ObserverOutput::Gaze {
                timestamp_ms: frame.timestamp_ms,
                target,
            });
        }
    }

    fn record(&mut self, observation: &Observation) {
        self.stats.observations += 1;
        match observation {
            Observation::Skipped => self.stats.skipped += 1,
            Observation::Recognized(_) => self.stats.recognized += 1,
            Observation::Enrolled(_) => self.stats.enrolled += 1,
            Observation::Accumulating { .. } | Observation::Resolved(_) => {}
        }
    }

    /// Stage 6: Queue an output, dropping the oldest when full
    fn emit(&mut self, output: ObserverOutput) {
        if self.outgoing.len() >= self.config.max_output_buffer {
            self.outgoing.pop_front();
            self.stats.outputs_dropped += 1;
        }
        self.outgoing.push_back(output);
    }

    pub fn sensor_available(&self) -> bool {
        self.sensor_available
    }

    pub fn active_sessions(&self) -> usize {
        self.active.len()
    }

    pub fn matcher(&self) -> &IdentityMatcher<S> {
        &self.matcher
    }

    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }
}
