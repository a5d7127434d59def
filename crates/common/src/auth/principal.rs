use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// The authenticated identity behind a request.
///
/// Built once from a verified credential and never mutated afterwards, so the
/// role seen by the access guard is the role the token was issued with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: impl Into<String>, username: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            role,
        }
    }

    pub fn owns(&self, owner: Option<&str>) -> bool {
        owner == Some(self.username.as_str())
    }
}
