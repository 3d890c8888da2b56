//! Pipeline wiring: ingest -> aggregate -> store, and
//! load -> generate -> store.
//!
//! The engine is the only layer that touches the persistence collaborator
//! and the only layer that logs. The computations themselves stay pure, so
//! every operation here is safe for the caller to retry verbatim after a
//! failure.

use chrono::{Days, NaiveDate};
use tracing::{info, warn};

use demandcast_core::{DateRange, DemandError, RestaurantId};
use demandcast_forecast::{ForecastJob, ForecastRun};
use demandcast_insights::{AggregationJob, DemandInsight};
use demandcast_signals::{DemandSignal, RawSignal, SignalIngestor};
use demandcast_store::{DemandStore, StoreError};

/// Engine-level error: either the computation failed or the store did.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Demand(#[from] DemandError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrates the forecasting core against an injected store.
///
/// Holds no state beyond the store handle and the ingestor config, so one
/// engine can serve concurrent calls for different restaurants.
#[derive(Debug)]
pub struct DemandEngine<S> {
    store: S,
    ingestor: SignalIngestor,
    baseline_window_days: u32,
}

impl<S: DemandStore> DemandEngine<S> {
    /// The store is passed in explicitly, constructed once at process
    /// start; the engine never reaches for ambient global state.
    pub fn new(store: S) -> Self {
        Self {
            store,
            ingestor: SignalIngestor::new(),
            baseline_window_days: 28,
        }
    }

    pub fn with_ingestor(mut self, ingestor: SignalIngestor) -> Self {
        self.ingestor = ingestor;
        self
    }

    pub fn with_baseline_window(mut self, days: u32) -> Self {
        self.baseline_window_days = days;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Re-aggregate one restaurant-day from raw feed payloads and upsert
    /// the resulting insight.
    ///
    /// Malformed payloads and signals outside the target day are skipped
    /// with a warning rather than failing the refresh; one bad feed entry
    /// must not block the day's aggregation.
    pub fn refresh_insight(
        &self,
        restaurant_id: RestaurantId,
        date: NaiveDate,
        raw_signals: &[RawSignal],
    ) -> Result<DemandInsight, EngineError> {
        let (signals, errors) = self.ingestor.ingest_all(raw_signals);
        for error in &errors {
            warn!(%restaurant_id, %date, %error, "skipping invalid raw signal");
        }

        let (on_date, off_date): (Vec<DemandSignal>, Vec<DemandSignal>) = signals
            .into_iter()
            .filter(|s| s.restaurant_id == restaurant_id)
            .partition(|s| s.timestamp.date_naive() == date);
        if !off_date.is_empty() {
            warn!(
                %restaurant_id,
                %date,
                skipped = off_date.len(),
                "skipping signals dated outside the target day"
            );
        }

        let accepted = on_date.len();
        let insight = AggregationJob::new(restaurant_id, date, on_date).run()?;
        self.store.save_insight(insight.clone())?;

        info!(
            %restaurant_id,
            %date,
            signals = accepted,
            skipped = errors.len(),
            "demand insight refreshed"
        );
        Ok(insight)
    }

    /// Produce and persist a new forecast version for the restaurant.
    ///
    /// Loads the trailing sales window and the surrounding insights from
    /// the store, generates the run, and saves it atomically under its
    /// fresh version id. Past versions are never touched.
    pub fn run_forecast(
        &self,
        restaurant_id: RestaurantId,
        start_date: NaiveDate,
        horizon: u32,
    ) -> Result<ForecastRun, EngineError> {
        let window_start = start_date
            .checked_sub_days(Days::new(self.baseline_window_days as u64))
            .ok_or_else(|| DemandError::validation("baseline window underflows the calendar"))?;
        let window_end = start_date
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| DemandError::validation("start date underflows the calendar"))?;
        let horizon_end = start_date
            .checked_add_days(Days::new(horizon.saturating_sub(1) as u64))
            .ok_or_else(|| DemandError::validation("forecast horizon overflows the calendar"))?;

        let history_range = DateRange::new(window_start, window_end)?;
        let insight_range = DateRange::new(window_start, horizon_end)?;

        let history = self.store.load_history(restaurant_id, &[], history_range)?;
        let insights = self.store.load_insights(restaurant_id, insight_range)?;

        let run = ForecastJob::new(restaurant_id, start_date, history, insights)
            .with_horizon(horizon)
            .with_baseline_window(self.baseline_window_days)
            .run()?;

        self.store.save_forecast_version(&run)?;

        info!(
            %restaurant_id,
            version_id = %run.version_id,
            items = run.items.len(),
            %start_date,
            horizon,
            "forecast version persisted"
        );
        Ok(run)
    }
}
