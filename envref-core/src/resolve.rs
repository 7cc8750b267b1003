//! Proximity ranking of same-named definitions relative to an origin file.

use crate::definition::EnvVarDefinition;
use crate::index::DefinitionMap;
use std::path::{Component, Path, PathBuf};

/// Weight of one step up to a parent directory
const ASCEND_WEIGHT: u32 = 2;
/// Weight of one step down into a child directory
const DESCEND_WEIGHT: u32 = 1;

/// Make `path` absolute against the cwd and fold `.`/`..` lexically.
///
/// An empty path is the cwd.
fn normalize(path: &Path) -> PathBuf {
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Steps of the relative path from `from_dir` to `to_dir`: (ascents, descents).
///
/// Same directory yields (0, 0). Paths on different prefixes share nothing,
/// so every component of both sides counts.
pub fn relative_steps(from_dir: &Path, to_dir: &Path) -> (usize, usize) {
    let from = normalize(from_dir);
    let to = normalize(to_dir);
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();
    (from.len() - common, to.len() - common)
}

/// Distance from `origin_dir` to `definition_dir`: 2 per ascent, 1 per descent.
pub fn distance_score(origin_dir: &Path, definition_dir: &Path) -> u32 {
    let (ascents, descents) = relative_steps(origin_dir, definition_dir);
    ascents as u32 * ASCEND_WEIGHT + descents as u32 * DESCEND_WEIGHT
}

/// Scores definitions by directory distance from an origin file.
pub struct ProximityScorer {
    origin_dir: PathBuf,
}

impl ProximityScorer {
    /// `origin` is the file containing the reference; a bare file name lives in the cwd
    pub fn new(origin: &Path) -> Self {
        let origin_dir = match origin.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self { origin_dir }
    }

    pub fn score(&self, definition: &EnvVarDefinition) -> u32 {
        distance_score(&self.origin_dir, definition.location().dir())
    }

    /// Ascending score; equal scores keep their input order.
    pub fn rank(&self, definitions: &[EnvVarDefinition]) -> Vec<EnvVarDefinition> {
        let mut scored: Vec<(u32, &EnvVarDefinition)> = definitions
            .iter()
            .map(|definition| (self.score(definition), definition))
            .collect();
        // stable: ties stay in scan-discovery order
        scored.sort_by_key(|(score, _)| *score);
        scored.into_iter().map(|(_, d)| d.clone()).collect()
    }
}

/// Definitions for `name` ordered by relevance to `origin`.
///
/// Without an origin, or with at most one candidate, index order is returned.
pub fn resolve(map: &DefinitionMap, name: &str, origin: Option<&Path>) -> Vec<EnvVarDefinition> {
    let definitions = map.get(name);
    match origin {
        Some(origin) if definitions.len() > 1 => ProximityScorer::new(origin).rank(definitions),
        _ => definitions.to_vec(),
    }
}
