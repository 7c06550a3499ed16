//! Both directions of the manifest transform: importing a declarative document into a
//! graph and exporting a graph into the payload of the generation service.

pub mod dialect;
pub mod export;
pub mod import;
pub mod mount;
pub mod normalize;

pub use dialect::{ComposeVersion, ManifestFormat};
pub use export::{GeneratePayload, export};
pub use import::{GridLayout, ImportedGraph, Importer};
pub use normalize::{NamedEntries, NormalizedService};
