//! `demandcast-insights`
//!
//! **Responsibility:** Aggregation Engine.
//!
//! Buckets one restaurant-day's normalized signals into a [`DemandInsight`]
//! summary. Pure and deterministic: no IO, no clock reads beyond id
//! generation, identical input multiset in, identical payload out.

pub mod aggregate;
pub mod insight;

pub use aggregate::AggregationJob;
pub use insight::{DemandInsight, InsightData, SourceBreakdown};
