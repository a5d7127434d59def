use chrono::NaiveDate;
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::auth::ResourceKind;
use crate::domain::ResourceFields;

/// Seats sold on a tour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SaleFields {
    #[garde(length(min = 1))]
    pub tour_id: String,
    #[garde(length(min = 1))]
    pub customer_name: String,
    #[garde(skip)]
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[garde(range(min = 1))]
    pub seats: i32,
    #[garde(range(min = 0))]
    pub amount_cents: i64,
    #[garde(skip)]
    pub sold_on: NaiveDate,
}

impl ResourceFields for SaleFields {
    const KIND: ResourceKind = ResourceKind::Sale;
    const TABLE: &'static str = "sales";
}
