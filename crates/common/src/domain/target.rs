use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::auth::ResourceKind;
use crate::domain::ResourceFields;

/// Monthly sales target for the owning staff member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TargetFields {
    /// `YYYY-MM`
    #[garde(custom(is_month))]
    pub period: String,
    #[garde(range(min = 0))]
    pub sales_target_cents: i64,
    #[garde(range(min = 0))]
    pub tours_target: i32,
    #[garde(skip)]
    #[serde(default)]
    pub notes: Option<String>,
}

impl ResourceFields for TargetFields {
    const KIND: ResourceKind = ResourceKind::Target;
    const TABLE: &'static str = "targets";
}

fn is_month(value: &str, _: &()) -> garde::Result {
    let valid = match value.split_once('-') {
        Some((year, month)) => {
            year.len() == 4
                && year.chars().all(|c| c.is_ascii_digit())
                && month.len() == 2
                && matches!(month.parse::<u8>(), Ok(1..=12))
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(garde::Error::new("period must be YYYY-MM"))
    }
}
