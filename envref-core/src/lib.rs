//! envref core - resolve environment-variable references to their definitions
//!
//! Scans `NAME=VALUE` definition files under a set of project roots into an
//! in-memory index, recognizes `$NAME`, `${NAME}`, `'NAME'` and `"NAME"`
//! references in arbitrary text, and ranks same-named definitions by their
//! directory distance from the file containing the reference.

pub mod config;
pub mod definition;
pub mod error;
pub mod generation;
pub mod index;
pub mod reference;
pub mod render;
pub mod resolve;
pub mod service;

pub use config::Config;
pub use definition::{EnvVarDefinition, Location};
pub use error::EnvRefError;
pub use generation::Generation;
pub use index::{
    enumerate_roots, DefinitionIndex, DefinitionMap, ProjectRoot, Rebuild, ScanOptions,
    ScanStats,
};
pub use reference::{extract_references, reference_at, Reference, ReferenceSyntax};
pub use render::{Annotation, Hover};
pub use resolve::{distance_score, ProximityScorer};
pub use service::{EnvResolver, IndexStatus};

/// Result type alias for envref operations
pub type Result<T> = std::result::Result<T, EnvRefError>;
