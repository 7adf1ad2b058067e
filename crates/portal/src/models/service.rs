//! Service menu types.

use serde::{Deserialize, Serialize};

use salon_core::{Price, ServiceId};

/// An entry on the salon's service menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalonService {
    pub id: ServiceId,
    pub name: String,
    pub duration_minutes: i32,
    pub price: Price,
    pub active: bool,
}
