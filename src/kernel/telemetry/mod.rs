//! Telemetry data model and inbound wire shapes.
//!
//! `receivedAt` is always stamped by the relay. Producer clocks are never
//! trusted for staleness decisions.

pub mod metrics;
pub mod payload;
pub mod sample;

pub use metrics::{IngestMetrics, IngestStats};
pub use payload::{parse_payload, parse_value, ParsedPayload, SkippedRecord};
pub use sample::{EntityId, Orientation, TelemetrySample, Vec3};
