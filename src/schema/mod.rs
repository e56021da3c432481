pub mod types;
pub mod resolved;
pub mod converter;
pub mod definitions;

pub use types::*;
pub use resolved::*;
pub use converter::{convert, REFERENCE_LIST_FIELD, REFERENCE_TARGET};
