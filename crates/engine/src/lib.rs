//! `demandcast-engine`
//!
//! **Responsibility:** caller-side pipeline over the forecasting core.
//!
//! Everything below this crate is pure computation; everything above it is
//! transport (HTTP routes, schedulers) owned by the host application. The
//! engine sits between: it materializes inputs from the injected store,
//! runs the jobs, persists the results, and logs.

pub mod engine;

pub use engine::{DemandEngine, EngineError};
