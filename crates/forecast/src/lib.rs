//! `demandcast-forecast`
//!
//! **Responsibility:** Forecast Generator.
//!
//! Combines trailing sales history with aggregated demand insights into a
//! versioned, immutable set of per-product predictions. Pure computation:
//! persistence of the resulting run belongs to the caller (see
//! `demandcast-engine`).

pub mod job;
pub mod run;
pub mod sale;

pub use job::{ForecastJob, MAX_UPLIFT, MIN_UPLIFT};
pub use run::{ForecastItem, ForecastRun};
pub use sale::SaleRecord;
