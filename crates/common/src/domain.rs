mod document;
mod in_memory_store;
mod record;
mod region;
mod result;
mod sale;
mod target;
mod tour;
mod user;

pub use document::*;
pub use in_memory_store::*;
pub use record::*;
pub use region::*;
pub use result::*;
pub use sale::*;
pub use target::*;
pub use tour::*;
pub use user::*;
