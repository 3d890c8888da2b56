use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;

use demandcast_core::{DateRange, ForecastVersionId, ProductId, RestaurantId};
use demandcast_forecast::{ForecastRun, SaleRecord};
use demandcast_insights::DemandInsight;

use super::r#trait::{DemandStore, StoreError};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct InsightKey {
    restaurant_id: RestaurantId,
    date: NaiveDate,
}

/// In-memory demand store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryDemandStore {
    insights: RwLock<HashMap<InsightKey, DemandInsight>>,
    forecasts: RwLock<HashMap<ForecastVersionId, ForecastRun>>,
    history: RwLock<HashMap<RestaurantId, Vec<SaleRecord>>>,
}

impl InMemoryDemandStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed sales history for a restaurant (test/dev helper; in production
    /// the CRUD application owns sales writes).
    pub fn seed_history(&self, restaurant_id: RestaurantId, records: Vec<SaleRecord>) {
        let mut history = match self.history.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        history.entry(restaurant_id).or_default().extend(records);
    }

    /// Number of stored insights across all restaurants (test helper).
    pub fn insight_count(&self) -> usize {
        self.insights.read().map(|m| m.len()).unwrap_or(0)
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

impl DemandStore for InMemoryDemandStore {
    fn save_insight(&self, insight: DemandInsight) -> Result<(), StoreError> {
        let key = InsightKey {
            restaurant_id: insight.restaurant_id,
            date: insight.date,
        };
        let mut insights = self.insights.write().map_err(poisoned)?;
        insights.insert(key, insight);
        Ok(())
    }

    fn save_forecast_version(&self, run: &ForecastRun) -> Result<(), StoreError> {
        for item in &run.items {
            if item.version_id != run.version_id {
                return Err(StoreError::Backend(format!(
                    "item {} carries version {} but run is {}",
                    item.id, item.version_id, run.version_id
                )));
            }
        }

        let mut forecasts = self.forecasts.write().map_err(poisoned)?;
        if forecasts.contains_key(&run.version_id) {
            return Err(StoreError::Conflict(format!(
                "forecast version {} already exists",
                run.version_id
            )));
        }
        // Single map insert under the write lock: all items or none.
        forecasts.insert(run.version_id, run.clone());
        Ok(())
    }

    fn load_history(
        &self,
        restaurant_id: RestaurantId,
        product_ids: &[ProductId],
        range: DateRange,
    ) -> Result<Vec<SaleRecord>, StoreError> {
        let history = self.history.read().map_err(poisoned)?;
        let mut records: Vec<SaleRecord> = history
            .get(&restaurant_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| range.contains(r.date))
                    .filter(|r| product_ids.is_empty() || product_ids.contains(&r.product_id))
                    .copied()
                    .collect()
            })
            .unwrap_or_default();

        records.sort_by(|a, b| {
            a.product_id
                .cmp(&b.product_id)
                .then_with(|| a.date.cmp(&b.date))
        });
        Ok(records)
    }

    fn load_insights(
        &self,
        restaurant_id: RestaurantId,
        range: DateRange,
    ) -> Result<Vec<DemandInsight>, StoreError> {
        let insights = self.insights.read().map_err(poisoned)?;
        let mut rows: Vec<DemandInsight> = insights
            .iter()
            .filter(|(key, _)| key.restaurant_id == restaurant_id && range.contains(key.date))
            .map(|(_, insight)| insight.clone())
            .collect();

        rows.sort_by_key(|i| i.date);
        Ok(rows)
    }

    fn load_forecast_version(
        &self,
        version_id: ForecastVersionId,
    ) -> Result<Option<ForecastRun>, StoreError> {
        let forecasts = self.forecasts.read().map_err(poisoned)?;
        Ok(forecasts.get(&version_id).cloned())
    }

    fn load_insight(
        &self,
        restaurant_id: RestaurantId,
        date: NaiveDate,
    ) -> Result<Option<DemandInsight>, StoreError> {
        let insights = self.insights.read().map_err(poisoned)?;
        Ok(insights
            .get(&InsightKey {
                restaurant_id,
                date,
            })
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use demandcast_core::{ForecastItemId, InsightId};
    use demandcast_forecast::ForecastItem;
    use demandcast_insights::InsightData;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn insight(restaurant_id: RestaurantId, date: &str, count: u64) -> DemandInsight {
        DemandInsight {
            id: InsightId::new(),
            restaurant_id,
            date: d(date),
            location: None,
            summary: Some(format!("{count} signal(s)")),
            data: InsightData {
                signal_count: count,
                total_magnitude: count as f64 * 10.0,
                mean_magnitude: 10.0,
                peak_hour: Some(12),
                sources: vec![],
            },
        }
    }

    fn run(restaurant_id: RestaurantId) -> ForecastRun {
        let version_id = ForecastVersionId::new();
        ForecastRun {
            version_id,
            restaurant_id,
            generated_at: Utc::now(),
            items: vec![ForecastItem {
                id: ForecastItemId::new(),
                version_id,
                product_id: ProductId::new(),
                period_index: 0,
                period_label: "2024-01-09".to_string(),
                quantity: 11,
            }],
        }
    }

    #[test]
    fn insight_upsert_replaces_not_duplicates() {
        let store = InMemoryDemandStore::new();
        let restaurant_id = RestaurantId::new();

        store.save_insight(insight(restaurant_id, "2024-01-05", 2)).unwrap();
        store.save_insight(insight(restaurant_id, "2024-01-05", 9)).unwrap();

        assert_eq!(store.insight_count(), 1);
        let stored = store.load_insight(restaurant_id, d("2024-01-05")).unwrap().unwrap();
        assert_eq!(stored.data.signal_count, 9);
    }

    #[test]
    fn insights_scoped_per_restaurant_and_range() {
        let store = InMemoryDemandStore::new();
        let a = RestaurantId::new();
        let b = RestaurantId::new();

        store.save_insight(insight(a, "2024-01-05", 1)).unwrap();
        store.save_insight(insight(a, "2024-01-08", 2)).unwrap();
        store.save_insight(insight(a, "2024-02-01", 3)).unwrap();
        store.save_insight(insight(b, "2024-01-05", 4)).unwrap();

        let range = DateRange::new(d("2024-01-01"), d("2024-01-31")).unwrap();
        let rows = store.load_insights(a, range).unwrap();
        let dates: Vec<NaiveDate> = rows.iter().map(|i| i.date).collect();
        assert_eq!(dates, vec![d("2024-01-05"), d("2024-01-08")]);
    }

    #[test]
    fn duplicate_forecast_version_conflicts() {
        let store = InMemoryDemandStore::new();
        let run = run(RestaurantId::new());

        store.save_forecast_version(&run).unwrap();
        let err = store.save_forecast_version(&run).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // First write is intact.
        let stored = store.load_forecast_version(run.version_id).unwrap().unwrap();
        assert_eq!(stored.items.len(), 1);
    }

    #[test]
    fn mismatched_item_version_is_rejected() {
        let store = InMemoryDemandStore::new();
        let mut bad = run(RestaurantId::new());
        bad.items[0].version_id = ForecastVersionId::new();

        let err = store.save_forecast_version(&bad).unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(store.load_forecast_version(bad.version_id).unwrap().is_none());
    }

    #[test]
    fn history_filters_by_product_and_range() {
        let store = InMemoryDemandStore::new();
        let restaurant_id = RestaurantId::new();
        let p1 = ProductId::new();
        let p2 = ProductId::new();

        store.seed_history(
            restaurant_id,
            vec![
                SaleRecord { product_id: p1, date: d("2024-01-01"), quantity: 10 },
                SaleRecord { product_id: p1, date: d("2024-01-08"), quantity: 12 },
                SaleRecord { product_id: p2, date: d("2024-01-02"), quantity: 5 },
                SaleRecord { product_id: p1, date: d("2023-06-01"), quantity: 99 },
            ],
        );

        let range = DateRange::new(d("2024-01-01"), d("2024-01-31")).unwrap();
        let records = store.load_history(restaurant_id, &[p1], range).unwrap();
        let quantities: Vec<u32> = records.iter().map(|r| r.quantity).collect();
        assert_eq!(quantities, vec![10, 12]);

        // Empty product filter means "all products".
        let all = store.load_history(restaurant_id, &[], range).unwrap();
        assert_eq!(all.len(), 3);
    }
}
