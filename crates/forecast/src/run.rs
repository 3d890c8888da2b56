use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use demandcast_core::{ForecastItemId, ForecastVersionId, ProductId, RestaurantId};

/// Predicted unit count for one product in one future period.
///
/// Per (version, product), `period_index` runs contiguously from 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastItem {
    pub id: ForecastItemId,
    pub version_id: ForecastVersionId,
    pub product_id: ProductId,
    pub period_index: u32,
    /// ISO calendar date (`YYYY-MM-DD`) of the forecast period.
    pub period_label: String,
    pub quantity: u32,
}

/// Complete output of one forecast computation.
///
/// Immutable once persisted: a re-forecast mints a new `version_id` instead
/// of mutating past predictions, so prior runs stay auditable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRun {
    pub version_id: ForecastVersionId,
    pub restaurant_id: RestaurantId,
    pub generated_at: DateTime<Utc>,
    pub items: Vec<ForecastItem>,
}

impl ForecastRun {
    /// Items for one product, in period order.
    pub fn items_for(&self, product_id: ProductId) -> Vec<&ForecastItem> {
        self.items
            .iter()
            .filter(|i| i.product_id == product_id)
            .collect()
    }

    /// Distinct products covered by this run.
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = self.items.iter().map(|i| i.product_id).collect();
        ids.dedup();
        ids
    }
}
