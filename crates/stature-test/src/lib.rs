//! Stature Test Harness
//!
//! This crate provides:
//! - Body profiles with known segment lengths
//! - A seeded skeleton simulator with jitter and tracking loss
//! - End-to-end scenarios through the observer and its stores

pub mod scenario;
pub mod simulator;

pub use scenario::*;
pub use simulator::*;
