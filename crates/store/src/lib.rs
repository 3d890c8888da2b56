//! `demandcast-store`
//!
//! **Responsibility:** persistence boundary of the forecasting core.
//!
//! The core computes; this crate defines where results go and where inputs
//! come from. The trait is storage-agnostic: the bundled in-memory
//! implementation backs tests/dev, relational backends live with the host
//! application.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryDemandStore;
pub use r#trait::{DemandStore, StoreError};
