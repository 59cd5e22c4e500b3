pub mod client;

pub use client::{IngestAck, RelayClient, WireSample};
