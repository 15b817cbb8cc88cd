//! Stature Identity - recognize people by their body measurements
//!
//! This crate implements the identity matcher:
//! - Identity records with running-average measurements
//! - Semicolon-delimited flat-file tables
//! - Record stores with a single-writer read-modify-write contract
//! - Nearest-neighbour classification against known subjects

pub mod matcher;
pub mod record;
pub mod store;
pub mod table;

pub use matcher::*;
pub use record::*;
pub use store::*;
pub use table::*;
