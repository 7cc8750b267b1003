//! In-memory definition index with swap-on-rebuild

mod file_discovery;
mod pipeline;

pub use file_discovery::{enumerate_roots, ProjectRoot, ScanOptions};
pub use pipeline::{scan, scan_files};

use crate::definition::EnvVarDefinition;
use crate::generation::Generation;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Statistics from a scan pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanStats {
    pub roots_scanned: usize,
    pub roots_excluded: usize,
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub definitions: usize,
    pub names: usize,
    pub duration_ms: u64,
}

/// Outcome of one [`DefinitionIndex::rebuild`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rebuild {
    pub generation: Generation,
    /// False when a later-started rebuild was installed first
    pub installed: bool,
    pub stats: ScanStats,
}

/// Name -> definitions in scan-discovery order.
///
/// Built privately by one scan pass, then frozen behind an `Arc` once installed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefinitionMap {
    entries: HashMap<String, Vec<EnvVarDefinition>>,
    definitions: usize,
}

impl DefinitionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the sequence for the definition's name
    pub fn put(&mut self, definition: EnvVarDefinition) {
        self.entries
            .entry(definition.name().to_string())
            .or_default()
            .push(definition);
        self.definitions += 1;
    }

    /// Definitions for `name`, empty if unknown
    pub fn get(&self, name: &str) -> &[EnvVarDefinition] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.definitions = 0;
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of definitions across all names
    pub fn definition_count(&self) -> usize {
        self.definitions
    }

    /// Known names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

struct Installed {
    generation: Generation,
    map: Arc<DefinitionMap>,
}

/// The live index shared by all lookups.
///
/// Rebuilds construct a fresh [`DefinitionMap`] and swap it in whole, so a
/// reader sees either the old map or the new one. Each rebuild takes a
/// generation ticket when it starts; a finished rebuild is only installed if
/// no later-started rebuild has already been installed.
pub struct DefinitionIndex {
    active: RwLock<Installed>,
    tickets: AtomicU64,
}

impl Default for DefinitionIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionIndex {
    /// Empty index at generation 0
    pub fn new() -> Self {
        Self {
            active: RwLock::new(Installed {
                generation: Generation::new(),
                map: Arc::new(DefinitionMap::new()),
            }),
            tickets: AtomicU64::new(0),
        }
    }

    /// Reserve the generation for a rebuild that is about to start
    pub fn begin_rebuild(&self) -> Generation {
        Generation::from_value(self.tickets.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Install a completed map. Returns false if a newer rebuild already won.
    pub fn install(&self, generation: Generation, map: DefinitionMap) -> bool {
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        if generation <= active.generation {
            tracing::debug!(%generation, installed = %active.generation, "discarding stale rebuild");
            return false;
        }
        active.generation = generation;
        active.map = Arc::new(map);
        true
    }

    /// Scan `roots` and swap the result in
    pub fn rebuild(&self, options: &ScanOptions, roots: &[ProjectRoot]) -> Rebuild {
        let generation = self.begin_rebuild();
        let (map, stats) = scan(options, roots);
        let installed = self.install(generation, map);
        if installed {
            tracing::info!(
                %generation,
                names = stats.names,
                definitions = stats.definitions,
                files = stats.files_scanned,
                skipped = stats.files_skipped,
                duration_ms = stats.duration_ms,
                "definition index rebuilt"
            );
        }
        Rebuild {
            generation,
            installed,
            stats,
        }
    }

    /// Drop every entry
    pub fn clear(&self) {
        let generation = self.begin_rebuild();
        self.install(generation, DefinitionMap::new());
    }

    /// The currently installed map; stays valid across later rebuilds
    pub fn snapshot(&self) -> Arc<DefinitionMap> {
        let active = self.active.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&active.map)
    }

    /// The installed map together with the generation that installed it
    pub fn snapshot_with_generation(&self) -> (Generation, Arc<DefinitionMap>) {
        let active = self.active.read().unwrap_or_else(PoisonError::into_inner);
        (active.generation, Arc::clone(&active.map))
    }

    /// Generation of the installed map (0 = never built)
    pub fn generation(&self) -> Generation {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    /// Definitions for `name` in index order, empty if unknown
    pub fn get(&self, name: &str) -> Vec<EnvVarDefinition> {
        self.snapshot().get(name).to_vec()
    }
}
