use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::auth::ResourceKind;
use crate::domain::ResourceFields;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RegionFields {
    #[garde(length(min = 1))]
    pub name: String,
    #[garde(length(min = 1, max = 16))]
    pub code: String,
    #[garde(skip)]
    #[serde(default)]
    pub description: Option<String>,
}

impl ResourceFields for RegionFields {
    const KIND: ResourceKind = ResourceKind::Region;
    const TABLE: &'static str = "regions";
}
