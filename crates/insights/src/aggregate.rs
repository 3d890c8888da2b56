//! Daily signal aggregation.
//!
//! Model:
//! - One call covers one restaurant and one calendar date.
//! - Signals are canonically ordered before any arithmetic, so the output
//!   is identical for any permutation of the same input multiset.
//! - An empty signal set produces a zero-valued payload, not an error.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Timelike};

use demandcast_core::{DemandError, DemandResult, InsightId, RestaurantId};
use demandcast_signals::{DemandSignal, GeoPoint, SourceType};

use crate::insight::{DemandInsight, InsightData, SourceBreakdown};

/// Deterministic aggregation of one day's signals into a [`DemandInsight`].
#[derive(Debug, Clone)]
pub struct AggregationJob {
    restaurant_id: RestaurantId,
    date: NaiveDate,
    signals: Vec<DemandSignal>,
}

impl AggregationJob {
    pub fn new(restaurant_id: RestaurantId, date: NaiveDate, signals: Vec<DemandSignal>) -> Self {
        Self {
            restaurant_id,
            date,
            signals,
        }
    }

    /// Aggregate into a fresh insight (new id; the store's upsert keyed on
    /// (restaurant, date) handles replacement).
    pub fn run(&self) -> DemandResult<DemandInsight> {
        for signal in &self.signals {
            if signal.restaurant_id != self.restaurant_id {
                return Err(DemandError::validation(
                    "signal restaurant_id does not match aggregation target",
                ));
            }
            let signal_date = signal.timestamp.date_naive();
            if signal_date != self.date {
                return Err(DemandError::validation(format!(
                    "signal dated {signal_date} passed to aggregation for {}",
                    self.date
                )));
            }
        }

        if self.signals.is_empty() {
            return Ok(DemandInsight {
                id: InsightId::new(),
                restaurant_id: self.restaurant_id,
                date: self.date,
                location: None,
                summary: Some("no demand signals recorded".to_string()),
                data: InsightData::empty(),
            });
        }

        let mut ordered = self.signals.clone();
        sort_canonical(&mut ordered);

        let count = ordered.len() as u64;
        let total: f64 = ordered.iter().map(|s| s.magnitude).sum();
        let mean = total / count as f64;

        let data = InsightData {
            signal_count: count,
            total_magnitude: total,
            mean_magnitude: mean,
            peak_hour: peak_hour(&ordered),
            sources: source_breakdown(&ordered),
        };

        let summary = render_summary(&data);
        let location = centroid(&ordered, total)?;

        Ok(DemandInsight {
            id: InsightId::new(),
            restaurant_id: self.restaurant_id,
            date: self.date,
            location: Some(location),
            summary: Some(summary),
            data,
        })
    }
}

/// Canonical signal order: timestamp, source code, magnitude, coordinates.
///
/// Float accumulation is order-sensitive, so every reduction below runs over
/// this ordering to keep re-aggregation byte-identical.
fn sort_canonical(signals: &mut [DemandSignal]) {
    signals.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.source.code().cmp(b.source.code()))
            .then_with(|| a.magnitude.total_cmp(&b.magnitude))
            .then_with(|| a.location.latitude().total_cmp(&b.location.latitude()))
            .then_with(|| a.location.longitude().total_cmp(&b.location.longitude()))
    });
}

fn peak_hour(signals: &[DemandSignal]) -> Option<u32> {
    let mut by_hour = [0.0f64; 24];
    for signal in signals {
        by_hour[signal.timestamp.hour() as usize] += signal.magnitude;
    }

    // Earliest hour wins ties (strict greater-than while scanning forward).
    let mut best = 0usize;
    for (hour, weight) in by_hour.iter().enumerate() {
        if *weight > by_hour[best] {
            best = hour;
        }
    }
    Some(best as u32)
}

fn source_breakdown(signals: &[DemandSignal]) -> Vec<SourceBreakdown> {
    let mut grouped: BTreeMap<SourceType, (u64, f64)> = BTreeMap::new();
    for signal in signals {
        let entry = grouped.entry(signal.source).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += signal.magnitude;
    }

    let mut breakdown: Vec<SourceBreakdown> = grouped
        .into_iter()
        .map(|(source, (count, total_magnitude))| SourceBreakdown {
            source,
            count,
            total_magnitude,
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.total_magnitude
            .total_cmp(&a.total_magnitude)
            .then_with(|| a.source.code().cmp(b.source.code()))
    });
    breakdown
}

/// Magnitude-weighted centroid; falls back to the unweighted mean when the
/// day's total magnitude is zero.
fn centroid(signals: &[DemandSignal], total_magnitude: f64) -> DemandResult<GeoPoint> {
    let (mut lat, mut lon) = (0.0f64, 0.0f64);

    if total_magnitude > 0.0 {
        for signal in signals {
            let w = signal.magnitude / total_magnitude;
            lat += w * signal.location.latitude();
            lon += w * signal.location.longitude();
        }
    } else {
        let n = signals.len() as f64;
        for signal in signals {
            lat += signal.location.latitude() / n;
            lon += signal.location.longitude() / n;
        }
    }

    // Convex combination of valid points; clamp guards rounding drift at
    // the boundary.
    GeoPoint::new(lat.clamp(-90.0, 90.0), lon.clamp(-180.0, 180.0))
}

fn render_summary(data: &InsightData) -> String {
    let top = match data.top_source() {
        Some(s) => s.source.code(),
        None => "none",
    };
    let peak = match data.peak_hour {
        Some(h) => format!("{h:02}:00 UTC"),
        None => "n/a".to_string(),
    };
    format!(
        "{} signal(s), total demand weight {:.1} (mean {:.1}); top source: {top}; peak hour: {peak}",
        data.signal_count, data.total_magnitude, data.mean_magnitude
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn restaurant() -> RestaurantId {
        RestaurantId::new()
    }

    fn day() -> NaiveDate {
        "2024-05-04".parse().unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        format!("2024-05-04T{hour:02}:{minute:02}:00Z").parse().unwrap()
    }

    fn signal(
        restaurant_id: RestaurantId,
        hour: u32,
        magnitude: f64,
        source: SourceType,
    ) -> DemandSignal {
        DemandSignal {
            restaurant_id,
            timestamp: at(hour, 0),
            location: GeoPoint::new(40.0 + hour as f64 * 0.01, -74.0).unwrap(),
            magnitude,
            source,
        }
    }

    #[test]
    fn empty_signal_set_yields_zero_payload() {
        let insight = AggregationJob::new(restaurant(), day(), vec![]).run().unwrap();

        assert_eq!(insight.data, InsightData::empty());
        assert_eq!(insight.location, None);
        assert_eq!(insight.summary.as_deref(), Some("no demand signals recorded"));
        assert_eq!(insight.date, day());
    }

    #[test]
    fn aggregates_counts_totals_and_mean() {
        let r = restaurant();
        let signals = vec![
            signal(r, 12, 10.0, SourceType::Gps),
            signal(r, 18, 30.0, SourceType::EventFeed),
        ];
        let insight = AggregationJob::new(r, day(), signals).run().unwrap();

        assert_eq!(insight.data.signal_count, 2);
        assert_eq!(insight.data.total_magnitude, 40.0);
        assert_eq!(insight.data.mean_magnitude, 20.0);
        assert_eq!(insight.data.peak_hour, Some(18));
        assert!(insight.location.is_some());
    }

    #[test]
    fn source_breakdown_sorted_by_weight_then_code() {
        let r = restaurant();
        let signals = vec![
            signal(r, 10, 5.0, SourceType::Weather),
            signal(r, 11, 5.0, SourceType::Gps),
            signal(r, 12, 50.0, SourceType::EventFeed),
        ];
        let insight = AggregationJob::new(r, day(), signals).run().unwrap();

        let codes: Vec<&str> = insight
            .data
            .sources
            .iter()
            .map(|s| s.source.code())
            .collect();
        // event_feed heaviest; gps/weather tie on magnitude, code order breaks it.
        assert_eq!(codes, vec!["event_feed", "gps", "weather"]);
        assert_eq!(insight.data.top_source().unwrap().source, SourceType::EventFeed);
    }

    #[test]
    fn peak_hour_tie_prefers_earliest() {
        let r = restaurant();
        let signals = vec![
            signal(r, 19, 25.0, SourceType::Manual),
            signal(r, 7, 25.0, SourceType::Manual),
        ];
        let insight = AggregationJob::new(r, day(), signals).run().unwrap();
        assert_eq!(insight.data.peak_hour, Some(7));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let r = restaurant();
        let signals = vec![
            signal(r, 9, 3.5, SourceType::Gps),
            signal(r, 13, 7.25, SourceType::Weather),
            signal(r, 20, 120.0, SourceType::EventFeed),
        ];

        let a = AggregationJob::new(r, day(), signals.clone()).run().unwrap();
        let b = AggregationJob::new(r, day(), signals).run().unwrap();

        // Identical apart from the generated id.
        assert_eq!(a.data, b.data);
        assert_eq!(a.summary, b.summary);
        assert_eq!(a.location, b.location);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn aggregation_is_order_insensitive() {
        let r = restaurant();
        let signals = vec![
            signal(r, 9, 3.5, SourceType::Gps),
            signal(r, 13, 7.25, SourceType::Weather),
            signal(r, 20, 120.0, SourceType::EventFeed),
            signal(r, 20, 0.5, SourceType::Holiday),
        ];
        let mut reversed = signals.clone();
        reversed.reverse();

        let a = AggregationJob::new(r, day(), signals).run().unwrap();
        let b = AggregationJob::new(r, day(), reversed).run().unwrap();

        assert_eq!(a.data, b.data);
        assert_eq!(a.summary, b.summary);
        assert_eq!(a.location, b.location);
    }

    #[test]
    fn rejects_signal_from_other_date() {
        let r = restaurant();
        let mut s = signal(r, 12, 1.0, SourceType::Manual);
        s.timestamp = "2024-05-05T00:30:00Z".parse().unwrap();

        let err = AggregationJob::new(r, day(), vec![s]).run().unwrap_err();
        assert!(matches!(err, DemandError::Validation(_)));
    }

    #[test]
    fn rejects_signal_from_other_restaurant() {
        let r = restaurant();
        let s = signal(restaurant(), 12, 1.0, SourceType::Manual);

        let err = AggregationJob::new(r, day(), vec![s]).run().unwrap_err();
        assert!(matches!(err, DemandError::Validation(_)));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 128,
                ..ProptestConfig::default()
            })]

            /// Property: any permutation of a signal set aggregates to the
            /// same payload and summary.
            #[test]
            fn shuffling_signals_does_not_change_the_insight(
                magnitudes in prop::collection::vec(0.0f64..1000.0, 1..20),
                rotation in 0usize..20,
            ) {
                let r = restaurant();
                let signals: Vec<DemandSignal> = magnitudes
                    .iter()
                    .enumerate()
                    .map(|(i, m)| signal(r, (i % 24) as u32, *m, SourceType::Gps))
                    .collect();

                let mut rotated = signals.clone();
                let len = rotated.len();
                rotated.rotate_left(rotation % len);

                let a = AggregationJob::new(r, day(), signals).run().unwrap();
                let b = AggregationJob::new(r, day(), rotated).run().unwrap();

                prop_assert_eq!(a.data, b.data);
                prop_assert_eq!(a.summary, b.summary);
            }
        }
    }
}
