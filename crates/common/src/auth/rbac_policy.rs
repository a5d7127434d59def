use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::domain::DomainError;

/// Staff roles, ordered by privilege: `Basic < Semi < Super`.
///
/// Older clients and seed data spell these `admin`, `semi_admin` and `staff`;
/// those spellings are accepted on input and never produced on output.
/// JSON input goes through [`FromStr`], so it is case-insensitive too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Basic,
    Semi,
    Super,
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Basic => "basic",
            Role::Semi => "semi",
            Role::Super => "super",
        }
    }

    /// Super and semi act on every record regardless of owner.
    pub fn is_elevated(&self) -> bool {
        *self >= Role::Semi
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "super" | "admin" => Ok(Role::Super),
            "semi" | "semi_admin" => Ok(Role::Semi),
            "basic" | "staff" => Ok(Role::Basic),
            _ => Err(DomainError::InvalidRole(s.to_string())),
        }
    }
}

/// Operations gated by the access guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Operation::Create | Operation::Update | Operation::Delete
        )
    }

    pub const ALL: [Operation; 5] = [
        Operation::List,
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
    ];
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of records managed by the back office
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Tour,
    Sale,
    Document,
    Region,
    Target,
    User,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Tour => "tour",
            ResourceKind::Sale => "sale",
            ResourceKind::Document => "document",
            ResourceKind::Region => "region",
            ResourceKind::Target => "target",
            ResourceKind::User => "user",
        }
    }

    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Tour,
        ResourceKind::Sale,
        ResourceKind::Document,
        ResourceKind::Region,
        ResourceKind::Target,
        ResourceKind::User,
    ];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
