//! Forecast generation.
//!
//! Model:
//! - Baseline per product: weekday-seasonal trailing mean over a sliding
//!   window of history ending the day before `start_date`. When the target
//!   weekday has no samples in the window, the product's overall windowed
//!   mean is used instead.
//! - Adjustment: a multiplicative uplift per forecast date, derived from
//!   that date's [`DemandInsight`] total magnitude relative to the mean
//!   daily magnitude across the supplied insights, clamped to
//!   [`MIN_UPLIFT`], [`MAX_UPLIFT`]. Dates without an insight get 1.0, so
//!   an empty insight sequence degrades to the pure trailing baseline.
//! - One run either yields an item for every (product, period) pair or
//!   fails as a whole; there is no partial output.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};

use demandcast_core::{
    DemandError, DemandResult, ForecastItemId, ForecastVersionId, ProductId, RestaurantId,
};
use demandcast_insights::DemandInsight;

use crate::run::{ForecastItem, ForecastRun};
use crate::sale::SaleRecord;

/// Lower clamp for the insight uplift factor.
pub const MIN_UPLIFT: f64 = 0.5;
/// Upper clamp for the insight uplift factor.
pub const MAX_UPLIFT: f64 = 3.0;

const DEFAULT_HORIZON: u32 = 7;
const DEFAULT_BASELINE_WINDOW_DAYS: u32 = 28;

/// Deterministic forecast computation for one restaurant.
///
/// Pure: consumes already-materialized history and insights, performs no
/// IO, and is safe to run concurrently for different restaurants.
#[derive(Debug, Clone)]
pub struct ForecastJob {
    restaurant_id: RestaurantId,
    start_date: NaiveDate,
    history: Vec<SaleRecord>,
    insights: Vec<DemandInsight>,
    horizon: u32,
    baseline_window_days: u32,
    /// Explicit product scope; defaults to every product in the windowed
    /// history.
    product_ids: Option<Vec<ProductId>>,
}

impl ForecastJob {
    pub fn new(
        restaurant_id: RestaurantId,
        start_date: NaiveDate,
        history: Vec<SaleRecord>,
        insights: Vec<DemandInsight>,
    ) -> Self {
        Self {
            restaurant_id,
            start_date,
            history,
            insights,
            horizon: DEFAULT_HORIZON,
            baseline_window_days: DEFAULT_BASELINE_WINDOW_DAYS,
            product_ids: None,
        }
    }

    /// Number of future periods (calendar days) to predict.
    pub fn with_horizon(mut self, horizon: u32) -> Self {
        self.horizon = horizon;
        self
    }

    /// Trailing history window (days before `start_date`) the baseline is
    /// derived from.
    pub fn with_baseline_window(mut self, days: u32) -> Self {
        self.baseline_window_days = days;
        self
    }

    /// Restrict the run to an explicit product set.
    pub fn with_product_ids(mut self, product_ids: Vec<ProductId>) -> Self {
        self.product_ids = Some(product_ids);
        self
    }

    /// Generate one complete forecast run under a fresh version id.
    ///
    /// Fails with `InsufficientHistory` the moment any in-scope product has
    /// no sales in the baseline window; a run never silently zero-fills
    /// (the caller drops a product from scope explicitly instead).
    pub fn run(&self) -> DemandResult<ForecastRun> {
        if self.horizon == 0 {
            return Err(DemandError::validation("forecast horizon must be >= 1"));
        }
        if self.baseline_window_days == 0 {
            return Err(DemandError::validation("baseline window must be >= 1 day"));
        }
        for insight in &self.insights {
            if insight.restaurant_id != self.restaurant_id {
                return Err(DemandError::validation(
                    "insight restaurant_id does not match forecast target",
                ));
            }
        }

        let windowed = self.windowed_history()?;
        let products = self.resolve_products(&windowed)?;
        let uplift = UpliftTable::build(&self.insights);

        let version_id = ForecastVersionId::new();
        let mut items =
            Vec::with_capacity(products.len() * self.horizon as usize);

        for product_id in products {
            let baseline = ProductBaseline::build(product_id, &windowed)?;

            for period_index in 0..self.horizon {
                let date = self
                    .start_date
                    .checked_add_days(Days::new(period_index as u64))
                    .ok_or_else(|| {
                        DemandError::validation("forecast horizon overflows the calendar")
                    })?;

                let factor = uplift.factor_for(date);
                let quantity = predict(baseline.for_weekday(date.weekday()), factor);

                items.push(ForecastItem {
                    id: ForecastItemId::new(),
                    version_id,
                    product_id,
                    period_index,
                    period_label: date.to_string(),
                    quantity,
                });
            }
        }

        Ok(ForecastRun {
            version_id,
            restaurant_id: self.restaurant_id,
            generated_at: Utc::now(),
            items,
        })
    }

    /// History records inside `[start - window, start)`, canonically sorted.
    fn windowed_history(&self) -> DemandResult<Vec<SaleRecord>> {
        let window_start = self
            .start_date
            .checked_sub_days(Days::new(self.baseline_window_days as u64))
            .ok_or_else(|| DemandError::validation("baseline window underflows the calendar"))?;

        let mut windowed: Vec<SaleRecord> = self
            .history
            .iter()
            .filter(|r| window_start <= r.date && r.date < self.start_date)
            .copied()
            .collect();

        // Canonical order keeps the run independent of caller ordering.
        windowed.sort_by(|a, b| {
            a.product_id
                .cmp(&b.product_id)
                .then_with(|| a.date.cmp(&b.date))
                .then_with(|| a.quantity.cmp(&b.quantity))
        });
        Ok(windowed)
    }

    fn resolve_products(&self, windowed: &[SaleRecord]) -> DemandResult<Vec<ProductId>> {
        let mut present: Vec<ProductId> = windowed.iter().map(|r| r.product_id).collect();
        present.sort();
        present.dedup();

        match &self.product_ids {
            None => {
                if present.is_empty() {
                    return Err(DemandError::validation(
                        "no products with sales history in the baseline window",
                    ));
                }
                Ok(present)
            }
            Some(requested) => {
                if requested.is_empty() {
                    return Err(DemandError::validation(
                        "explicit product set must not be empty",
                    ));
                }
                let mut scoped = requested.clone();
                scoped.sort();
                scoped.dedup();
                for product_id in &scoped {
                    if !present.contains(product_id) {
                        return Err(DemandError::insufficient_history(*product_id));
                    }
                }
                Ok(scoped)
            }
        }
    }
}

/// Weekday-seasonal trailing means for one product.
#[derive(Debug)]
struct ProductBaseline {
    overall_mean: f64,
    weekday_means: [Option<f64>; 7],
}

impl ProductBaseline {
    fn build(product_id: ProductId, windowed: &[SaleRecord]) -> DemandResult<Self> {
        let records: Vec<&SaleRecord> = windowed
            .iter()
            .filter(|r| r.product_id == product_id)
            .collect();

        if records.is_empty() {
            return Err(DemandError::insufficient_history(product_id));
        }

        let total: f64 = records.iter().map(|r| r.quantity as f64).sum();
        let overall_mean = total / records.len() as f64;

        let mut weekday_sums = [0.0f64; 7];
        let mut weekday_counts = [0u32; 7];
        for record in &records {
            let idx = record.date.weekday().num_days_from_monday() as usize;
            weekday_sums[idx] += record.quantity as f64;
            weekday_counts[idx] += 1;
        }

        let mut weekday_means = [None; 7];
        for idx in 0..7 {
            if weekday_counts[idx] > 0 {
                weekday_means[idx] = Some(weekday_sums[idx] / weekday_counts[idx] as f64);
            }
        }

        Ok(Self {
            overall_mean,
            weekday_means,
        })
    }

    fn for_weekday(&self, weekday: Weekday) -> f64 {
        self.weekday_means[weekday.num_days_from_monday() as usize]
            .unwrap_or(self.overall_mean)
    }
}

/// Per-date uplift factors derived from demand insights.
#[derive(Debug)]
struct UpliftTable {
    by_date: BTreeMap<NaiveDate, f64>,
    mean_daily_magnitude: f64,
}

impl UpliftTable {
    fn build(insights: &[DemandInsight]) -> Self {
        // Later entries replace earlier ones, matching the store's
        // one-row-per-date upsert semantics.
        let mut by_date = BTreeMap::new();
        for insight in insights {
            by_date.insert(insight.date, insight.data.total_magnitude);
        }

        let mean_daily_magnitude = if by_date.is_empty() {
            0.0
        } else {
            by_date.values().sum::<f64>() / by_date.len() as f64
        };

        Self {
            by_date,
            mean_daily_magnitude,
        }
    }

    fn factor_for(&self, date: NaiveDate) -> f64 {
        if self.mean_daily_magnitude <= 0.0 {
            return 1.0;
        }
        match self.by_date.get(&date) {
            Some(magnitude) => (magnitude / self.mean_daily_magnitude).clamp(MIN_UPLIFT, MAX_UPLIFT),
            None => 1.0,
        }
    }
}

fn predict(baseline: f64, factor: f64) -> u32 {
    // Float-to-int casts saturate, which gives the >= 0 clamp for free.
    (baseline * factor).round().max(0.0) as u32
}
