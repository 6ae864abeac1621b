//! Equipment catalog types.
//!
//! Equipment is owned by the external store and immutable from the core's
//! perspective: listings are read to validate and price a rental request,
//! never written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::id::{EquipmentId, UserId};

/// Category of an equipment listing.
///
/// Closed set; the catalog rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentCategory {
    PowerTools,
    LawnEquipment,
    WeldingEquipment,
    ConstructionTools,
    Automotive,
    Household,
    Other,
}

/// An equipment listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EquipmentId,
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    pub category: EquipmentCategory,
    /// Rental price per calendar day, in the marketplace currency.
    pub price_per_day: f64,
    pub location: String,
    /// Shortest rental the owner accepts, in inclusive days.
    pub min_rental_days: u32,
    /// Longest rental the owner accepts; `None` means unbounded.
    pub max_rental_days: Option<u32>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

/// Filter for catalog queries.
///
/// All criteria are optional and combined with AND. `skip`/`limit` page
/// through the result; a `None` limit leaves the page size to the store.
#[derive(Debug, Clone, Default)]
pub struct EquipmentFilter {
    pub category: Option<EquipmentCategory>,
    /// Case-insensitive substring match on the listing location.
    pub location: Option<String>,
    pub max_price: Option<f64>,
    pub skip: usize,
    pub limit: Option<usize>,
}
