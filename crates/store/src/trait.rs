use std::sync::Arc;

use thiserror::Error;

use demandcast_core::{DateRange, DemandError, ForecastVersionId, ProductId, RestaurantId};
use demandcast_forecast::{ForecastRun, SaleRecord};
use demandcast_insights::DemandInsight;

/// Store operation error.
///
/// These are **infrastructure** failures (storage, conflicts), as opposed
/// to the core's deterministic computation errors. Implementations surface
/// them; nothing in the core retries.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Write rejected because it would overwrite immutable data
    /// (e.g. re-saving an existing forecast version).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Backend failure (connection, serialization, poisoned lock, ...).
    #[error("storage backend failed: {0}")]
    Backend(String),
}

impl From<StoreError> for DemandError {
    fn from(e: StoreError) -> Self {
        DemandError::persistence(e.to_string())
    }
}

/// Persistence boundary of the forecasting core.
///
/// Storage-agnostic by design: the in-memory implementation backs tests and
/// dev, a relational implementation lives with the surrounding CRUD
/// application. Implementations must guarantee:
/// - `save_insight` upserts on (restaurant, date) — re-aggregation
///   replaces, never duplicates.
/// - `save_forecast_version` is append-only and atomic — a version id is
///   written once, entirely or not at all, and never mutated afterwards.
/// - Reads return rows scoped to the given restaurant only.
pub trait DemandStore: Send + Sync {
    /// Create-or-replace the insight for its (restaurant, date).
    fn save_insight(&self, insight: DemandInsight) -> Result<(), StoreError>;

    /// Persist a complete forecast run under its fresh version id.
    ///
    /// Rejects an already-present `version_id` with `Conflict`.
    fn save_forecast_version(&self, run: &ForecastRun) -> Result<(), StoreError>;

    /// Sales history for the given products inside `range`, ordered by
    /// (product, date).
    fn load_history(
        &self,
        restaurant_id: RestaurantId,
        product_ids: &[ProductId],
        range: DateRange,
    ) -> Result<Vec<SaleRecord>, StoreError>;

    /// Insights for the restaurant inside `range`, ordered by date.
    fn load_insights(
        &self,
        restaurant_id: RestaurantId,
        range: DateRange,
    ) -> Result<Vec<DemandInsight>, StoreError>;

    /// One persisted forecast run, if the version exists.
    fn load_forecast_version(
        &self,
        version_id: ForecastVersionId,
    ) -> Result<Option<ForecastRun>, StoreError>;

    /// The insight for one (restaurant, date), if aggregated yet.
    fn load_insight(
        &self,
        restaurant_id: RestaurantId,
        date: chrono::NaiveDate,
    ) -> Result<Option<DemandInsight>, StoreError>;
}

impl<S> DemandStore for Arc<S>
where
    S: DemandStore + ?Sized,
{
    fn save_insight(&self, insight: DemandInsight) -> Result<(), StoreError> {
        (**self).save_insight(insight)
    }

    fn save_forecast_version(&self, run: &ForecastRun) -> Result<(), StoreError> {
        (**self).save_forecast_version(run)
    }

    fn load_history(
        &self,
        restaurant_id: RestaurantId,
        product_ids: &[ProductId],
        range: DateRange,
    ) -> Result<Vec<SaleRecord>, StoreError> {
        (**self).load_history(restaurant_id, product_ids, range)
    }

    fn load_insights(
        &self,
        restaurant_id: RestaurantId,
        range: DateRange,
    ) -> Result<Vec<DemandInsight>, StoreError> {
        (**self).load_insights(restaurant_id, range)
    }

    fn load_forecast_version(
        &self,
        version_id: ForecastVersionId,
    ) -> Result<Option<ForecastRun>, StoreError> {
        (**self).load_forecast_version(version_id)
    }

    fn load_insight(
        &self,
        restaurant_id: RestaurantId,
        date: chrono::NaiveDate,
    ) -> Result<Option<DemandInsight>, StoreError> {
        (**self).load_insight(restaurant_id, date)
    }
}
