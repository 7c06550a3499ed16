//! Project persistence: the stored document, the store seam and background autosave.

mod autosave;
mod document;
mod store;

pub use autosave::*;
pub use document::*;
pub use store::*;
