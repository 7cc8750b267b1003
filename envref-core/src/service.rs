//! `EnvResolver`: the owned index plus every lookup the host adapters use.

use crate::config::Config;
use crate::definition::{EnvVarDefinition, Location};
use crate::generation::Generation;
use crate::index::{DefinitionIndex, ProjectRoot, Rebuild, ScanOptions};
use crate::reference::{self, Reference};
use crate::render::{strip_quotes, Annotation, Hover};
use crate::resolve;
use serde::Serialize;
use std::path::Path;

/// Summary of the installed index
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub generation: Generation,
    pub names: usize,
    pub definitions: usize,
}

/// Resolves environment-variable references against an owned [`DefinitionIndex`].
///
/// Lookups take `&self` and may run concurrently with each other and with a
/// rebuild; a rebuild swaps the whole map in at once.
pub struct EnvResolver {
    index: DefinitionIndex,
    config: Config,
    options: ScanOptions,
}

impl EnvResolver {
    /// Compile the scan settings up front; a bad glob fails here.
    pub fn new(config: Config) -> crate::Result<Self> {
        let options = ScanOptions::from_config(&config.scan)?;
        Ok(Self {
            index: DefinitionIndex::new(),
            config,
            options,
        })
    }

    /// Rebuild from `roots` with the configured ignore globs and excluded root names
    pub fn rebuild(&self, roots: &[ProjectRoot]) -> Rebuild {
        self.index.rebuild(&self.options, roots)
    }

    /// Rebuild from `roots` with explicit scan settings
    pub fn rebuild_index(&self, roots: &[ProjectRoot], options: &ScanOptions) -> Rebuild {
        self.index.rebuild(options, roots)
    }

    pub fn status(&self) -> IndexStatus {
        let (generation, snapshot) = self.index.snapshot_with_generation();
        IndexStatus {
            generation,
            names: snapshot.len(),
            definitions: snapshot.definition_count(),
        }
    }

    /// Every definition of `name` in index order
    pub fn lookup_definitions(&self, name: &str) -> Vec<EnvVarDefinition> {
        self.index.get(name)
    }

    /// Definitions of `name`, proximity-ordered when an origin is given
    pub fn resolve(&self, name: &str, origin: Option<&Path>) -> Vec<EnvVarDefinition> {
        resolve::resolve(&self.index.snapshot(), name, origin)
    }

    /// The most relevant definition of `name`, if any
    pub fn resolve_best(&self, name: &str, origin: Option<&Path>) -> Option<EnvVarDefinition> {
        self.resolve(name, origin).into_iter().next()
    }

    pub fn extract_references(&self, text: &str) -> Vec<Reference> {
        reference::extract_references(text).collect()
    }

    pub fn reference_at(&self, text: &str, offset: usize) -> Option<Reference> {
        reference::reference_at(text, offset)
    }

    /// Go to definition: location of the best match for the reference under `offset`
    pub fn definition_at(
        &self,
        text: &str,
        offset: usize,
        origin: Option<&Path>,
    ) -> Option<Location> {
        let reference = self.reference_at(text, offset)?;
        self.resolve_best(&reference.name, origin).map(|d| d.location().clone())
    }

    /// Find references: every definition location of the name under `offset`
    pub fn references_at(
        &self,
        text: &str,
        offset: usize,
        origin: Option<&Path>,
    ) -> Vec<Location> {
        let Some(reference) = self.reference_at(text, offset) else {
            return Vec::new();
        };
        self.resolve(&reference.name, origin)
            .into_iter()
            .map(|d| d.location().clone())
            .collect()
    }

    /// Hover card with the raw value of the best match
    pub fn hover(&self, text: &str, offset: usize, origin: Option<&Path>) -> Option<Hover> {
        let reference = self.reference_at(text, offset)?;
        let best = self.resolve_best(&reference.name, origin)?;
        Some(Hover::new(reference, best.value(), best.location().clone()))
    }

    /// Inline values for every resolvable reference in `text`
    pub fn annotate(&self, text: &str, origin: Option<&Path>) -> Vec<Annotation> {
        let snapshot = self.index.snapshot();
        reference::extract_references(text)
            .filter_map(|reference| {
                let best = resolve::resolve(&snapshot, &reference.name, origin)
                    .into_iter()
                    .next()?;
                let shown = if self.config.render.strip_quotes {
                    strip_quotes(best.value())
                } else {
                    best.value()
                };
                Some(Annotation {
                    text: shown.to_string(),
                    source: best.location().clone(),
                    range: reference.range,
                    name: reference.name,
                })
            })
            .collect()
    }
}
