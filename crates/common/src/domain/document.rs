use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::auth::ResourceKind;
use crate::domain::ResourceFields;

/// Metadata about a document filed against the back office (contracts,
/// passports, invoices). File contents live outside this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DocumentFields {
    #[garde(length(min = 1))]
    pub title: String,
    #[garde(length(min = 1))]
    pub category: String,
    #[garde(length(min = 1))]
    pub file_name: String,
    #[garde(skip)]
    #[serde(default)]
    pub notes: Option<String>,
}

impl ResourceFields for DocumentFields {
    const KIND: ResourceKind = ResourceKind::Document;
    const TABLE: &'static str = "documents";
}
