use chrono::NaiveDate;
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::auth::ResourceKind;
use crate::domain::ResourceFields;

/// A bookable tour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TourFields {
    #[garde(length(min = 1, max = 200))]
    pub name: String,
    #[garde(length(min = 1))]
    pub destination: String,
    #[garde(skip)]
    #[serde(default)]
    pub region_id: Option<String>,
    #[garde(skip)]
    pub start_date: NaiveDate,
    #[garde(custom(not_before(&self.start_date)))]
    pub end_date: NaiveDate,
    #[garde(range(min = 0))]
    pub price_cents: i64,
    #[garde(range(min = 1))]
    pub capacity: i32,
    #[garde(skip)]
    #[serde(default)]
    pub description: Option<String>,
}

impl ResourceFields for TourFields {
    const KIND: ResourceKind = ResourceKind::Tour;
    const TABLE: &'static str = "tours";
}

fn not_before(start: &NaiveDate) -> impl FnOnce(&NaiveDate, &()) -> garde::Result + '_ {
    move |end, _| {
        if end < start {
            return Err(garde::Error::new("end_date is before start_date"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_struct;

    fn tour() -> TourFields {
        TourFields {
            name: "Halong Bay 3D2N".to_string(),
            destination: "Quang Ninh".to_string(),
            region_id: Some("north".to_string()),
            start_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 11, 4).unwrap(),
            price_cents: 450_000,
            capacity: 20,
            description: None,
        }
    }

    #[test]
    fn test_valid_tour() {
        assert!(validate_struct(&tour()).is_ok());
    }

    #[test]
    fn test_end_date_before_start_rejected() {
        let mut t = tour();
        t.end_date = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();
        let err = validate_struct(&t).unwrap_err().to_string();
        assert!(err.contains("end_date"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut t = tour();
        t.capacity = 0;
        assert!(validate_struct(&t).is_err());
    }
}
