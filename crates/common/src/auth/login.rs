use serde::{Deserialize, Serialize};

use crate::domain::UserView;

/// Input for user login
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginUserInput {
    pub username: String,
    pub password: String,
}

/// Output from successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginUserOutput {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: UserView,
}
