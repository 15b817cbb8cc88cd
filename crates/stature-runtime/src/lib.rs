//! Stature Runtime - Observer orchestration
//!
//! Sensor frames arrive as explicit events with a single consumer. Each tick
//! runs the same stages:
//! 1. Drain queued sensor events
//! 2. Track sensor availability
//! 3. Extract measurements from every tracked body
//! 4. Feed the identity matcher
//! 5. Compute the gaze target
//! 6. Queue outputs for the caller
//!
//! `ObserverService` moves the observer onto one blocking tokio task, which
//! then is the only writer of the store files.

pub mod config;
pub mod event;
pub mod logging;
pub mod observer;
pub mod service;

pub use config::*;
pub use event::*;
pub use logging::*;
pub use observer::*;
pub use service::*;
