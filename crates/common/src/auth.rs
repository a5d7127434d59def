mod access_guard;
mod config;
mod context;
mod jwt;
mod login;
mod password;
mod principal;
mod rbac_policy;
mod traits;

pub use access_guard::*;
pub use config::*;
pub use context::*;
pub use jwt::*;
pub use login::*;
pub use password::*;
pub use principal::*;
pub use rbac_policy::*;
pub use traits::*;
