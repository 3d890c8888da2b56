//! `demandcast-signals`
//!
//! **Responsibility:** Event Ingestor boundary.
//!
//! Raw feed payloads come in (source-specific JSON shapes), normalized
//! [`DemandSignal`]s come out. This crate validates; it never persists and
//! never aggregates.

pub mod ingestor;
pub mod signal;

pub use ingestor::{GeoBounds, RawSignal, SignalIngestor};
pub use signal::{DemandSignal, GeoPoint, SourceType};
