//! Normalization of raw feed payloads into [`DemandSignal`]s.
//!
//! Each source type ships its own payload shape; this module knows the
//! per-source field layout and validates the three things every signal must
//! have: a parseable timestamp, an in-bounds location, and a usable
//! magnitude. No persistence happens here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use demandcast_core::{DemandError, DemandResult, RestaurantId};

use crate::signal::{DemandSignal, GeoPoint, SourceType};

/// A signal payload as delivered by an external feed, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSignal {
    pub restaurant_id: RestaurantId,
    /// Stable source code (see [`SourceType::code`]).
    pub source_code: String,
    /// Source-specific shape; validated field by field during ingestion.
    pub payload: JsonValue,
}

/// Rectangular service region used to reject signals that are clearly not
/// about this restaurant's surroundings.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south_west: GeoPoint,
    pub north_east: GeoPoint,
}

impl GeoBounds {
    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.south_west.latitude() <= point.latitude()
            && point.latitude() <= self.north_east.latitude()
            && self.south_west.longitude() <= point.longitude()
            && point.longitude() <= self.north_east.longitude()
    }
}

/// Stateless ingestor for raw feed payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalIngestor {
    /// Optional service region; signals located outside it are rejected.
    region: Option<GeoBounds>,
}

impl SignalIngestor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: GeoBounds) -> Self {
        self.region = Some(region);
        self
    }

    /// Validate and normalize one raw payload.
    pub fn ingest(&self, raw: &RawSignal) -> DemandResult<DemandSignal> {
        let source = SourceType::from_code(&raw.source_code)?;

        let timestamp = extract_timestamp(source, &raw.payload)?;
        let location = extract_location(source, &raw.payload)?;
        let magnitude = extract_magnitude(source, &raw.payload)?;

        if let Some(region) = &self.region {
            if !region.contains(&location) {
                return Err(DemandError::validation(format!(
                    "signal location ({}, {}) outside configured service region",
                    location.latitude(),
                    location.longitude()
                )));
            }
        }

        Ok(DemandSignal {
            restaurant_id: raw.restaurant_id,
            timestamp,
            location,
            magnitude,
            source,
        })
    }

    /// Normalize a batch, collecting failures instead of aborting.
    ///
    /// Callers decide whether partial ingestion is acceptable; the engine
    /// logs and skips, strict callers can treat a non-empty error list as
    /// fatal.
    pub fn ingest_all(&self, raws: &[RawSignal]) -> (Vec<DemandSignal>, Vec<DemandError>) {
        let mut signals = Vec::with_capacity(raws.len());
        let mut errors = Vec::new();
        for raw in raws {
            match self.ingest(raw) {
                Ok(signal) => signals.push(signal),
                Err(e) => errors.push(e),
            }
        }
        (signals, errors)
    }
}

fn timestamp_field(source: SourceType) -> &'static str {
    match source {
        SourceType::EventFeed | SourceType::Holiday => "starts_at",
        SourceType::Gps => "recorded_at",
        SourceType::Weather => "observed_at",
        SourceType::Manual => "at",
    }
}

fn magnitude_field(source: SourceType) -> &'static str {
    match source {
        SourceType::EventFeed => "attendance",
        SourceType::Gps => "dwell_count",
        SourceType::Weather => "impact",
        SourceType::Holiday => "weight",
        SourceType::Manual => "magnitude",
    }
}

fn extract_timestamp(source: SourceType, payload: &JsonValue) -> DemandResult<DateTime<Utc>> {
    let field = timestamp_field(source);
    let raw = payload
        .get(field)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| {
            DemandError::validation(format!("{source} payload missing timestamp field `{field}`"))
        })?;

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DemandError::validation(format!("unparseable timestamp `{raw}`: {e}")))
}

fn extract_location(source: SourceType, payload: &JsonValue) -> DemandResult<GeoPoint> {
    // Event feeds nest coordinates under the venue; everything else carries
    // them at the top level.
    let holder = match source {
        SourceType::EventFeed => payload.get("venue").ok_or_else(|| {
            DemandError::validation("event_feed payload missing `venue` object")
        })?,
        _ => payload,
    };

    let lat = number_field(holder, "lat", source)?;
    let lon = number_field(holder, "lon", source)?;
    GeoPoint::new(lat, lon)
}

fn extract_magnitude(source: SourceType, payload: &JsonValue) -> DemandResult<f64> {
    let field = magnitude_field(source);
    let magnitude = number_field(payload, field, source)?;
    if !magnitude.is_finite() || magnitude < 0.0 {
        return Err(DemandError::validation(format!(
            "{source} magnitude `{field}` must be a finite non-negative number, got {magnitude}"
        )));
    }
    Ok(magnitude)
}

fn number_field(holder: &JsonValue, field: &str, source: SourceType) -> DemandResult<f64> {
    holder
        .get(field)
        .and_then(JsonValue::as_f64)
        .ok_or_else(|| {
            DemandError::validation(format!("{source} payload missing numeric field `{field}`"))
        })
}
