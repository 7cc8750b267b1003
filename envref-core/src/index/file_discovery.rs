//! Definition-file discovery: project roots, ignore globs, directory walk.

use crate::config::ScanConfig;
use crate::error::EnvRefError;
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A top-level project directory; `name` is matched against `ignore_roots`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRoot {
    pub name: String,
    pub path: PathBuf,
}

impl ProjectRoot {
    /// Root named after its final path component
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { name, path }
    }
}

/// Turn directory paths into project roots, failing on anything that is not a directory.
///
/// Paths are made absolute so locations and proximity scores do not depend on the cwd.
pub fn enumerate_roots(paths: &[PathBuf]) -> crate::Result<Vec<ProjectRoot>> {
    paths
        .iter()
        .map(|path| {
            if !path.is_dir() {
                return Err(EnvRefError::RootNotFound(path.clone()));
            }
            let absolute = std::path::absolute(path)?;
            Ok(ProjectRoot::new(absolute))
        })
        .collect()
}

fn compile(pattern: &str) -> crate::Result<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| EnvRefError::glob(pattern, e))
}

fn build_set(patterns: &[String]) -> crate::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile(pattern)?);
    }
    builder
        .build()
        .map_err(|e| EnvRefError::glob(&patterns.join(","), e))
}

/// Expand one ignore entry into (file patterns, directory patterns).
///
/// `**/x/**` also prunes the directory `**/x`; a bare name matches at any depth.
fn expand_ignore(pattern: &str) -> (Vec<String>, Vec<String>) {
    let has_meta = pattern.contains(['*', '?', '[', '{']);
    if !has_meta {
        let dir = format!("**/{}", pattern.trim_matches('/'));
        return (vec![dir.clone(), format!("{dir}/**")], vec![dir]);
    }
    match pattern.strip_suffix("/**") {
        Some(dir) if !dir.is_empty() => (vec![pattern.to_string()], vec![dir.to_string()]),
        _ => (vec![pattern.to_string()], Vec::new()),
    }
}

/// Compiled scan settings. Building one validates every glob.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    definition_set: GlobSet,
    ignore_files: GlobSet,
    ignore_dirs: GlobSet,
    ignore_roots: HashSet<String>,
    respect_gitignore: bool,
    follow_links: bool,
}

impl ScanOptions {
    pub fn from_config(config: &ScanConfig) -> crate::Result<Self> {
        let mut file_patterns = Vec::new();
        let mut dir_patterns = Vec::new();
        for pattern in &config.ignore_folders {
            let (files, dirs) = expand_ignore(pattern);
            file_patterns.extend(files);
            dir_patterns.extend(dirs);
        }

        Ok(Self {
            definition_set: build_set(std::slice::from_ref(&config.definition_glob))?,
            ignore_files: build_set(&file_patterns)?,
            ignore_dirs: build_set(&dir_patterns)?,
            ignore_roots: config.ignore_roots.iter().cloned().collect(),
            respect_gitignore: config.respect_gitignore,
            follow_links: config.follow_links,
        })
    }

    /// Whether a whole project root is excluded by name
    pub fn is_root_excluded(&self, root: &ProjectRoot) -> bool {
        self.ignore_roots.contains(&root.name)
    }

    /// Whether a path relative to its root is an ignored file or lies in an ignored directory
    pub fn is_ignored(&self, relative: &Path) -> bool {
        self.ignore_files.is_match(relative)
    }

    /// Whether a path relative to its root names a definition file
    pub fn is_definition_file(&self, relative: &Path) -> bool {
        self.definition_set.is_match(relative)
    }

    /// Every definition file under the non-excluded roots, in deterministic order:
    /// roots as given, entries sorted by file name within each directory.
    pub fn discover(&self, roots: &[ProjectRoot]) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for root in roots {
            if self.is_root_excluded(root) {
                tracing::debug!(root = %root.name, "skipping excluded project root");
                continue;
            }
            let found = self.walk_root(&root.path);
            tracing::debug!(root = %root.name, files = found.len(), "discovered definition files");
            files.extend(found.into_iter().filter(|path| seen.insert(path.clone())));
        }

        files
    }

    fn walk_root(&self, root: &Path) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(root);
        builder.hidden(false);
        builder.follow_links(self.follow_links);
        builder.git_ignore(self.respect_gitignore);
        builder.git_global(self.respect_gitignore);
        builder.git_exclude(self.respect_gitignore);
        builder.ignore(self.respect_gitignore);
        builder.parents(self.respect_gitignore);
        builder.sort_by_file_name(|a, b| a.cmp(b));

        let ignore_dirs = self.ignore_dirs.clone();
        let walk_root = root.to_path_buf();
        builder.filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            if !is_dir || entry.depth() == 0 {
                return true;
            }
            let relative = entry.path().strip_prefix(&walk_root).unwrap_or(entry.path());
            !ignore_dirs.is_match(relative)
        });

        let mut files = Vec::new();

        for entry in builder.build() {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);

            if self.is_ignored(relative) {
                continue;
            }

            if self.is_definition_file(relative) {
                files.push(path.to_path_buf());
            }
        }

        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "X=1\n").unwrap();
    }

    fn relative_names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_discovers_env_files_sorted_and_skips_node_modules() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "b/service.env");
        touch(root, "a/.env");
        touch(root, "a/readme.txt");
        touch(root, "node_modules/pkg/x.env");
        touch(root, "z.env");

        let options = ScanOptions::from_config(&ScanConfig::default()).unwrap();
        let files = options.discover(&[ProjectRoot::new(root)]);
        assert_eq!(
            relative_names(root, &files),
            vec!["a/.env", "b/service.env", "z.env"]
        );
    }

    #[test]
    fn test_bare_ignore_name_matches_any_depth() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "app/target/gen.env");
        touch(root, "app/keep.env");

        let config = ScanConfig {
            ignore_folders: vec!["target".to_string()],
            ..ScanConfig::default()
        };
        let options = ScanOptions::from_config(&config).unwrap();
        let files = options.discover(&[ProjectRoot::new(root)]);
        assert_eq!(relative_names(root, &files), vec!["app/keep.env"]);
    }

    #[test]
    fn test_excluded_root_is_skipped_entirely() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "docker-data/db.env");
        touch(dir.path(), "web/web.env");

        let options = ScanOptions::from_config(&ScanConfig::default()).unwrap();
        let roots = vec![
            ProjectRoot::new(dir.path().join("docker-data")),
            ProjectRoot::new(dir.path().join("web")),
        ];
        let files = options.discover(&roots);
        assert_eq!(files, vec![dir.path().join("web/web.env")]);
    }

    #[test]
    fn test_gitignored_definition_files_are_found_by_default() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.env\n").unwrap();
        touch(dir.path(), "secret.env");

        let options = ScanOptions::from_config(&ScanConfig::default()).unwrap();
        let files = options.discover(&[ProjectRoot::new(dir.path())]);
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_overlapping_roots_do_not_duplicate_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "inner/a.env");

        let options = ScanOptions::from_config(&ScanConfig::default()).unwrap();
        let roots = vec![
            ProjectRoot::new(dir.path()),
            ProjectRoot::new(dir.path().join("inner")),
        ];
        assert_eq!(options.discover(&roots).len(), 1);
    }

    #[test]
    fn test_enumerate_roots_rejects_missing_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            enumerate_roots(&[missing]),
            Err(EnvRefError::RootNotFound(_))
        ));

        let roots = enumerate_roots(&[dir.path().to_path_buf()]).unwrap();
        assert!(roots[0].path.is_absolute());
        assert_eq!(
            roots[0].name,
            dir.path().file_name().unwrap().to_string_lossy()
        );
    }

    #[test]
    fn test_invalid_glob_is_reported() {
        let config = ScanConfig {
            definition_glob: "**/*.{env".to_string(),
            ..ScanConfig::default()
        };
        assert!(matches!(
            ScanOptions::from_config(&config),
            Err(EnvRefError::GlobPattern { .. })
        ));
    }
}
