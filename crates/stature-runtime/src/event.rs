//! Inbound sensor events and outbound observer outputs

use serde::{Deserialize, Serialize};
use stature_core::{MeasurementVector, TrackingId};
use stature_identity::Observation;
use stature_skeleton::{BodyFrame, GazeTarget};

/// Message from the sensor side. The observer is its only consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SensorEvent {
    /// A new body frame
    Frame(BodyFrame),
    /// The sensor was paused, unplugged, or came back
    Availability { available: bool },
}

impl SensorEvent {
    pub fn frame(frame: BodyFrame) -> Self {
        SensorEvent::Frame(frame)
    }

    pub fn available(available: bool) -> Self {
        SensorEvent::Availability { available }
    }
}

/// What the observer reports back
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverOutput {
    /// One tracked body went through the matcher
    Observation {
        tracking_id: TrackingId,
        timestamp_ms: u64,
        measurements: MeasurementVector,
        observation: Observation,
    },
    /// The store could not be read or written for this body; the frame
    /// continues with the next body
    Failed {
        tracking_id: TrackingId,
        timestamp_ms: u64,
        reason: String,
    },
    /// A body from earlier frames is no longer in view
    SessionEnded {
        tracking_id: TrackingId,
        timestamp_ms: u64,
    },
    /// Where to look for the first tracked body
    Gaze {
        timestamp_ms: u64,
        target: GazeTarget,
    },
    /// Sensor went away; every open session ended
    SensorLost { sessions_ended: usize },
    SensorRestored,
}

impl ObserverOutput {
    pub fn tracking_id(&self) -> Option<TrackingId> {
        match self {
            ObserverOutput::Observation { tracking_id, .. }
            | ObserverOutput::Failed { tracking_id, .. }
            | ObserverOutput::SessionEnded { tracking_id, .. } => Some(*tracking_id),
            _ => None,
        }
    }

    pub fn observation(&self) -> Option<&Observation> {
        match self {
            ObserverOutput::Observation { observation, .. } => Some(observation),
            _ => None,
        }
    }
}
