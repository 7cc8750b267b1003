//! Configuration for envref

use crate::index::ScanOptions;
use crate::EnvRefError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up at the first project root
pub const CONFIG_FILE_NAME: &str = ".envref.toml";

/// Default configuration as TOML
pub const DEFAULT_CONFIG: &str = r#"# envref configuration

[scan]
# Files holding NAME=VALUE definitions
definition_glob = "**/*.env"
# Directories to skip while scanning (globs relative to each project root).
# A bare name such as "target" skips every directory with that name.
ignore_folders = [
    "**/node_modules/**",
]
# Top-level project roots excluded entirely, by directory name
ignore_roots = [
    "docker-data",
]
# Definition files are usually git-ignored, so .gitignore is off by default
respect_gitignore = false
follow_links = false

[render]
# Strip one leading and one trailing quote from inline values
strip_quotes = true
"#;

/// envref configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_definition_glob")]
    pub definition_glob: String,
    #[serde(default = "default_ignore_folders")]
    pub ignore_folders: Vec<String>,
    #[serde(default = "default_ignore_roots")]
    pub ignore_roots: Vec<String>,
    #[serde(default)]
    pub respect_gitignore: bool,
    #[serde(default)]
    pub follow_links: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_strip_quotes")]
    pub strip_quotes: bool,
}

// Default value functions
fn default_definition_glob() -> String {
    "**/*.env".to_string()
}
fn default_ignore_folders() -> Vec<String> {
    vec!["**/node_modules/**".to_string()]
}
fn default_ignore_roots() -> Vec<String> {
    vec!["docker-data".to_string()]
}
fn default_strip_quotes() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            definition_glob: default_definition_glob(),
            ignore_folders: default_ignore_folders(),
            ignore_roots: default_ignore_roots(),
            respect_gitignore: false,
            follow_links: false,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            strip_quotes: default_strip_quotes(),
        }
    }
}

impl Config {
    /// Load config from a TOML file and validate it
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load `.envref.toml` from `root` if present, otherwise use defaults
    pub fn load_or_default(root: &Path) -> crate::Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from TOML string and validate it
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| EnvRefError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Compile every glob so a bad pattern fails here instead of on each scan
    pub fn validate(&self) -> crate::Result<()> {
        ScanOptions::from_config(&self.scan).map(|_| ())
    }

    /// Write the default config into `root`, refusing to overwrite
    pub fn init(root: &Path) -> crate::Result<PathBuf> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.exists() {
            return Err(EnvRefError::ConfigExists(path));
        }
        std::fs::write(&path, DEFAULT_CONFIG)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_parses_to_defaults() {
        let config = Config::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.scan.definition_glob, "**/*.env");
        assert_eq!(config.scan.ignore_roots, vec!["docker-data"]);
        assert!(config.render.strip_quotes);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = Config::from_toml("[render]\nstrip_quotes = false\n").unwrap();
        assert_eq!(config.scan, ScanConfig::default());
        assert!(!config.render.strip_quotes);
    }

    #[test]
    fn test_bad_toml_is_config_parse_error() {
        let err = Config::from_toml("[scan\n").unwrap_err();
        assert!(matches!(err, EnvRefError::ConfigParse(_)));
    }

    #[test]
    fn test_bad_glob_fails_fast() {
        let err = Config::from_toml("[scan]\nignore_folders = [\"**/[oops/**\"]\n").unwrap_err();
        match err {
            EnvRefError::GlobPattern { pattern, .. } => assert_eq!(pattern, "**/[oops/**"),
            other => panic!("expected glob error, got {other:?}"),
        }
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = Config::init(dir.path()).unwrap();
        assert!(path.ends_with(CONFIG_FILE_NAME));

        let loaded = Config::load_or_default(dir.path()).unwrap();
        assert_eq!(loaded, Config::default());

        assert!(matches!(
            Config::init(dir.path()),
            Err(EnvRefError::ConfigExists(_))
        ));
    }
}
