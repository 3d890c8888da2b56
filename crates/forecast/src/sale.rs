use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use demandcast_core::ProductId;

/// One day's realized sales of one product.
///
/// Supplied by the caller (loaded from the persistence collaborator); the
/// forecast core never fetches history itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub product_id: ProductId,
    pub date: NaiveDate,
    pub quantity: u32,
}
