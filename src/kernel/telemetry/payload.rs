//! Inbound payload shapes.
//!
//! Producers send either one telemetry object or `{ "players": [...] }`.
//! The shape is auto-detected per payload; there is no version flag.
//! Batches are applied best-effort: a bad record is skipped, the rest survive.

use serde::Deserialize;
use serde_json::Value;

use super::sample::{Orientation, TelemetrySample, Vec3};
use crate::kernel::error::{RelayError, RelayResult};

const BATCH_KEY: &str = "players";

/// Wire form of one record. Producer timestamps are not modelled and so are dropped.
#[derive(Debug, Deserialize)]
struct RawSample {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    x: f64,
    y: f64,
    z: f64,
    #[serde(default)]
    velocity: Option<Vec3>,
    #[serde(default)]
    angles: Option<Orientation>,
    #[serde(default)]
    orientation: Option<Orientation>,
}

impl RawSample {
    fn into_sample(self) -> Result<TelemetrySample, String> {
        let id = self
            .id
            .or(self.name)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "missing `id`/`name`".to_string())?;

        let position = Vec3::new(self.x, self.y, self.z);
        if !position.is_finite() {
            return Err(format!("non-finite position for '{}'", id));
        }

        let velocity = self.velocity.unwrap_or_default();
        if !velocity.is_finite() {
            return Err(format!("non-finite velocity for '{}'", id));
        }

        let orientation = self.angles.or(self.orientation);
        if let Some(o) = &orientation {
            if !o.is_finite() {
                return Err(format!("non-finite orientation for '{}'", id));
            }
        }

        let mut sample = TelemetrySample::new(id, position).with_velocity(velocity);
        sample.orientation = orientation;
        Ok(sample)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ParsedPayload {
    pub samples: Vec<TelemetrySample>,
    pub skipped: Vec<SkippedRecord>,
}

fn parse_record(value: Value) -> Result<TelemetrySample, String> {
    let raw: RawSample = serde_json::from_value(value).map_err(|e| e.to_string())?;
    raw.into_sample()
}

/// Parses raw bytes into validated samples. `received_at` is left unset; the
/// router stamps it.
pub fn parse_payload(raw: &[u8]) -> RelayResult<ParsedPayload> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| RelayError::MalformedPayload(format!("not valid JSON: {}", e)))?;
    parse_value(value)
}

pub fn parse_value(value: Value) -> RelayResult<ParsedPayload> {
    let mut object = match value {
        Value::Object(map) => map,
        other => {
            return Err(RelayError::MalformedPayload(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    let Some(batch) = object.remove(BATCH_KEY) else {
        let sample = parse_record(Value::Object(object)).map_err(RelayError::MalformedPayload)?;
        return Ok(ParsedPayload {
            samples: vec![sample],
            skipped: Vec::new(),
        });
    };

    let Value::Array(records) = batch else {
        return Err(RelayError::MalformedPayload(format!(
            "`{}` must be an array, got {}",
            BATCH_KEY,
            json_kind(&batch)
        )));
    };
    if records.is_empty() {
        return Err(RelayError::MalformedPayload(format!("`{}` is empty", BATCH_KEY)));
    }

    let mut samples = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();
    for (index, record) in records.into_iter().enumerate() {
        match parse_record(record) {
            Ok(sample) => samples.push(sample),
            Err(reason) => skipped.push(SkippedRecord { index, reason }),
        }
    }

    if samples.is_empty() {
        return Err(RelayError::MalformedPayload(format!(
            "all {} records in batch were malformed",
            skipped.len()
        )));
    }

    Ok(ParsedPayload {
        samples,
        skipped,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
