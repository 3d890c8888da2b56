use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use demandcast_core::{DemandError, DemandResult, RestaurantId};

/// Known external feed kinds.
///
/// Closed enum with stable string codes: raw payloads carry the code, the
/// rest of the core only ever sees the typed variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    EventFeed,
    Gps,
    Weather,
    Holiday,
    Manual,
}

impl SourceType {
    pub fn code(&self) -> &'static str {
        match self {
            SourceType::EventFeed => "event_feed",
            SourceType::Gps => "gps",
            SourceType::Weather => "weather",
            SourceType::Holiday => "holiday",
            SourceType::Manual => "manual",
        }
    }

    pub fn from_code(code: &str) -> DemandResult<Self> {
        match code {
            "event_feed" => Ok(SourceType::EventFeed),
            "gps" => Ok(SourceType::Gps),
            "weather" => Ok(SourceType::Weather),
            "holiday" => Ok(SourceType::Holiday),
            "manual" => Ok(SourceType::Manual),
            other => Err(DemandError::validation(format!(
                "unknown signal source code: {other}"
            ))),
        }
    }
}

impl core::fmt::Display for SourceType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// WGS84 point. Constructed only through `new`, so a held value is always
/// finite and within |lat| <= 90, |lon| <= 180.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> DemandResult<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(DemandError::validation(
                "location coordinates must be finite numbers",
            ));
        }
        if latitude.abs() > 90.0 {
            return Err(DemandError::validation(format!(
                "latitude {latitude} out of bounds (|lat| <= 90)"
            )));
        }
        if longitude.abs() > 180.0 {
            return Err(DemandError::validation(format!(
                "longitude {longitude} out of bounds (|lon| <= 180)"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Normalized demand observation.
///
/// Ephemeral: produced by the ingestor, consumed immediately by the
/// aggregation engine, never persisted directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSignal {
    pub restaurant_id: RestaurantId,
    pub timestamp: DateTime<Utc>,
    pub location: GeoPoint,
    /// Non-negative, finite demand weight (attendance, dwell count, ...).
    pub magnitude: f64,
    pub source: SourceType,
}
