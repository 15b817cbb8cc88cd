//! Stature Core - Fundamental types and primitives
//!
//! This crate defines the core types shared by the measurement and
//! identification crates:
//! - Identifiers (TrackingId, SubjectId)
//! - Body measurement vectors and the identity verdict
//! - Error taxonomy

pub mod error;
pub mod id;
pub mod measurement;

pub use error::*;
pub use id::*;
pub use measurement::*;
