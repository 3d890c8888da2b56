//! `demandcast-core` — shared foundation of the forecasting core.
//!
//! This crate contains **pure** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the error taxonomy, and calendar helpers.

pub mod date_range;
pub mod error;
pub mod id;

pub use date_range::DateRange;
pub use error::{DemandError, DemandResult};
pub use id::{ForecastItemId, ForecastVersionId, InsightId, ProductId, RestaurantId};
