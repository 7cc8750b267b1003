//! Presentation of resolved values: inline annotations and hover text.

use crate::definition::Location;
use crate::reference::Reference;
use serde::Serialize;
use std::ops::Range;

/// Drop one leading and one trailing quote character (`'` or `"`), independently.
///
/// Values are stored raw; this only runs when displaying them.
pub fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix(['\'', '"']).unwrap_or(value);
    value.strip_suffix(['\'', '"']).unwrap_or(value)
}

/// Markdown shown in a hover card for a raw value
pub fn hover_markdown(value: &str) -> String {
    format!("**Value:** `{value}`")
}

/// Inline value rendered after a reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub range: Range<usize>,
    pub name: String,
    pub text: String,
    /// Where the annotated value was defined
    pub source: Location,
}

/// Hover card for the reference under a cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hover {
    pub range: Range<usize>,
    pub name: String,
    pub markdown: String,
    pub source: Location,
}

impl Hover {
    pub(crate) fn new(reference: Reference, value: &str, source: Location) -> Self {
        Self {
            range: reference.range,
            name: reference.name,
            markdown: hover_markdown(value),
            source,
        }
    }
}
