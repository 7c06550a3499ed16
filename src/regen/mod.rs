//! Manifest regeneration: graph snapshots in, rendered manifest text out.

mod debounce;
mod pipeline;
mod service;

pub use debounce::*;
pub use pipeline::*;
pub use service::*;
