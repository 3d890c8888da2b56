use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use demandcast_core::{DemandError, DemandResult, InsightId, RestaurantId};
use demandcast_signals::{GeoPoint, SourceType};

/// Per-source slice of a day's aggregated signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceBreakdown {
    pub source: SourceType,
    pub count: u64,
    pub total_magnitude: f64,
}

/// Structured aggregation payload of one restaurant-day.
///
/// This is the `data` blob the store keeps; it is deterministic for a given
/// signal multiset (see [`crate::AggregationJob`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightData {
    pub signal_count: u64,
    pub total_magnitude: f64,
    pub mean_magnitude: f64,
    /// Hour of day (0-23, UTC) with the greatest summed magnitude; earliest
    /// hour wins ties. `None` on signal-free days.
    pub peak_hour: Option<u32>,
    /// Sorted by descending total magnitude, then source code.
    pub sources: Vec<SourceBreakdown>,
}

impl InsightData {
    /// Payload for a day with no signals. Callers never special-case
    /// "no events that day"; they get zeros instead of an error.
    pub fn empty() -> Self {
        Self {
            signal_count: 0,
            total_magnitude: 0.0,
            mean_magnitude: 0.0,
            peak_hour: None,
            sources: Vec::new(),
        }
    }

    /// Breakdown entry with the greatest total magnitude, if any.
    pub fn top_source(&self) -> Option<&SourceBreakdown> {
        self.sources.first()
    }
}

/// Daily aggregated demand summary for one restaurant.
///
/// One row per (restaurant, date); re-aggregation replaces the prior row
/// via the store's upsert, never duplicates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandInsight {
    pub id: InsightId,
    pub restaurant_id: RestaurantId,
    pub date: NaiveDate,
    /// Magnitude-weighted centroid of the contributing signals.
    pub location: Option<GeoPoint>,
    pub summary: Option<String>,
    pub data: InsightData,
}

impl DemandInsight {
    /// Serialize the structured payload into the opaque blob shape the
    /// persistence collaborator stores.
    pub fn data_json(&self) -> DemandResult<JsonValue> {
        serde_json::to_value(&self.data)
            .map_err(|e| DemandError::persistence(format!("insight payload serialization: {e}")))
    }
}
