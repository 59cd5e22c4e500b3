//! Relay kernel: pure in-memory components with no transport knowledge.
//!
//! # Locking
//! The live table, the recorder and the catalog each own one lock. No lock is
//! ever held across a call into another component.

pub mod error;
pub mod ingest;
pub mod relay;
pub mod replay;
pub mod state;
pub mod telemetry;
pub mod time;
