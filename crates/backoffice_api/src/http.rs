mod principal;
mod record_handler;
mod server;
mod user_handler;

pub use principal::*;
pub use record_handler::*;
pub use server::*;
pub use user_handler::*;
