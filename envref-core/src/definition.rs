//! Definition records and the `NAME=VALUE` line grammar.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Identifier grammar shared by definitions and references
pub(crate) const NAME_PATTERN: &str = "[A-Z_][A-Z0-9_]*";

fn assignment_regex() -> &'static Regex {
    static ASSIGNMENT: OnceLock<Regex> = OnceLock::new();
    ASSIGNMENT.get_or_init(|| {
        Regex::new(&format!("^({NAME_PATTERN})=(.*)$")).expect("assignment grammar is valid")
    })
}

/// Where a definition lives: file plus the start of its line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub path: PathBuf,
    /// Zero-based line number
    pub line: usize,
    /// Byte offset of the line start within the file
    pub offset: usize,
}

impl Location {
    /// Directory containing the definition file
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line + 1)
    }
}

/// One `NAME=VALUE` occurrence. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVarDefinition {
    name: String,
    /// Right-hand side trimmed of whitespace, quotes kept
    value: String,
    location: Location,
}

impl EnvVarDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn location(&self) -> &Location {
        &self.location
    }
}

/// Match a single line against `^NAME=VALUE$`, returning the name and trimmed value.
pub fn parse_assignment(line: &str) -> Option<(&str, &str)> {
    let caps = assignment_regex().captures(line)?;
    let name = caps.get(1)?.as_str();
    let value = caps.get(2)?.as_str().trim();
    Some((name, value))
}

/// Extract every definition from the text of one definition file.
///
/// Lines are split on `\n`; a trailing `\r` ends up in the value and is trimmed.
/// Non-matching lines are ignored.
pub fn parse_definitions(path: &Path, text: &str) -> Vec<EnvVarDefinition> {
    parse_definition_bytes(path, text.as_bytes())
}

/// Like [`parse_definitions`] for raw file contents.
///
/// Invalid UTF-8 is replaced line by line, so offsets stay byte offsets into the file.
pub fn parse_definition_bytes(path: &Path, bytes: &[u8]) -> Vec<EnvVarDefinition> {
    let mut definitions = Vec::new();
    let mut offset = 0usize;

    for (line_no, raw) in bytes.split(|&b| b == b'\n').enumerate() {
        let line = String::from_utf8_lossy(raw);
        if let Some((name, value)) = parse_assignment(&line) {
            definitions.push(EnvVarDefinition {
                name: name.to_string(),
                value: value.to_string(),
                location: Location {
                    path: path.to_path_buf(),
                    line: line_no,
                    offset,
                },
            });
        }
        offset += raw.len() + 1;
    }

    definitions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment_trims_value_keeps_quotes() {
        assert_eq!(parse_assignment("FOO=bar"), Some(("FOO", "bar")));
        assert_eq!(parse_assignment("FOO=  bar  "), Some(("FOO", "bar")));
        assert_eq!(parse_assignment("FOO=\"quoted\""), Some(("FOO", "\"quoted\"")));
        assert_eq!(parse_assignment("EMPTY="), Some(("EMPTY", "")));
        assert_eq!(parse_assignment("_X1=a=b"), Some(("_X1", "a=b")));
    }

    #[test]
    fn test_parse_assignment_rejects_malformed_lines() {
        assert_eq!(parse_assignment("foo=bar"), None);
        assert_eq!(parse_assignment("1FOO=bar"), None);
        assert_eq!(parse_assignment(" FOO=bar"), None);
        assert_eq!(parse_assignment("export FOO=bar"), None);
        assert_eq!(parse_assignment("# FOO=bar"), None);
        assert_eq!(parse_assignment("FOO"), None);
        assert_eq!(parse_assignment("FOO =bar"), None);
    }

    #[test]
    fn test_parse_definitions_locations() {
        let text = "# comment\nPORT=8080\r\n\nPORT=8080\nhost=x\nHOST=localhost";
        let defs = parse_definitions(Path::new("/p/a.env"), text);
        assert_eq!(defs.len(), 3);

        assert_eq!(defs[0].name(), "PORT");
        assert_eq!(defs[0].value(), "8080");
        assert_eq!(defs[0].location().line, 1);
        assert_eq!(defs[0].location().offset, 10);

        // identical lines keep their own line numbers
        assert_eq!(defs[1].location().line, 3);
        assert_eq!(defs[1].location().offset, 22);

        assert_eq!(defs[2].name(), "HOST");
        assert_eq!(defs[2].location().line, 5);
        assert_eq!(defs[2].location().dir(), Path::new("/p"));
    }

    #[test]
    fn test_offsets_count_file_bytes_not_replacement_chars() {
        let defs = parse_definition_bytes(Path::new("/p/a.env"), b"A=\xff\nB=ok\n");
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].value(), "\u{fffd}");
        assert_eq!(defs[1].name(), "B");
        assert_eq!(defs[1].location().line, 1);
        assert_eq!(defs[1].location().offset, 4);
    }
}
