//! Reference extraction: `${NAME}`, `$NAME`, `'NAME'` and `"NAME"`.

use crate::definition::NAME_PATTERN;
use regex::{Match, Matches, Regex};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::OnceLock;

/// Alternation order matters: `${` must be tried before bare `$`.
fn reference_regex() -> &'static Regex {
    static REFERENCE: OnceLock<Regex> = OnceLock::new();
    REFERENCE.get_or_init(|| {
        let n = NAME_PATTERN;
        Regex::new(&format!(r#"\$\{{{n}\}}|\${n}|'{n}'|"{n}""#))
            .expect("reference grammar is valid")
    })
}

/// Syntax wrapper a reference was written with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceSyntax {
    Braced,
    Dollar,
    SingleQuoted,
    DoubleQuoted,
}

impl ReferenceSyntax {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Braced => "${NAME}",
            Self::Dollar => "$NAME",
            Self::SingleQuoted => "'NAME'",
            Self::DoubleQuoted => "\"NAME\"",
        }
    }
}

/// A reference found in caller text. `range` is a byte range into that text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub range: Range<usize>,
    pub name: String,
    pub syntax: ReferenceSyntax,
}

/// Strip the syntax wrapper from a raw reference, yielding the bare name.
///
/// Returns `None` for anything that is not exactly one reference.
pub fn canonical_name(raw: &str) -> Option<(&str, ReferenceSyntax)> {
    let m = reference_regex().find(raw)?;
    if m.start() != 0 || m.end() != raw.len() {
        return None;
    }
    let (name, syntax) = if let Some(inner) = raw.strip_prefix("${") {
        (inner.strip_suffix('}')?, ReferenceSyntax::Braced)
    } else if let Some(inner) = raw.strip_prefix('$') {
        (inner, ReferenceSyntax::Dollar)
    } else if raw.starts_with('\'') {
        (&raw[1..raw.len() - 1], ReferenceSyntax::SingleQuoted)
    } else {
        (&raw[1..raw.len() - 1], ReferenceSyntax::DoubleQuoted)
    };
    Some((name, syntax))
}

fn to_reference(m: Match<'_>) -> Option<Reference> {
    let (name, syntax) = canonical_name(m.as_str())?;
    Some(Reference {
        range: m.range(),
        name: name.to_string(),
        syntax,
    })
}

/// Lazy iterator over the references in a text, left to right.
pub struct References<'t> {
    matches: Matches<'static, 't>,
}

impl Iterator for References<'_> {
    type Item = Reference;

    fn next(&mut self) -> Option<Reference> {
        for m in self.matches.by_ref() {
            if let Some(reference) = to_reference(m) {
                return Some(reference);
            }
        }
        None
    }
}

/// All non-overlapping references in `text`, in order of appearance.
pub fn extract_references(text: &str) -> References<'_> {
    References {
        matches: reference_regex().find_iter(text),
    }
}

/// The reference whose range contains `offset` (end inclusive), if any.
///
/// First match in text order wins when two references touch.
pub fn reference_at(text: &str, offset: usize) -> Option<Reference> {
    if offset > text.len() {
        return None;
    }
    extract_references(text)
        .take_while(|r| r.range.start <= offset)
        .find(|r| offset <= r.range.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str) -> Vec<String> {
        extract_references(text).map(|r| r.name).collect()
    }

    #[test]
    fn test_all_four_syntaxes_canonicalize() {
        let text = r#"a $FOO b ${FOO} c 'FOO' d "FOO""#;
        let refs: Vec<Reference> = extract_references(text).collect();
        assert_eq!(refs.len(), 4);
        assert!(refs.iter().all(|r| r.name == "FOO"));
        assert_eq!(
            refs.iter().map(|r| r.syntax).collect::<Vec<_>>(),
            vec![
                ReferenceSyntax::Dollar,
                ReferenceSyntax::Braced,
                ReferenceSyntax::SingleQuoted,
                ReferenceSyntax::DoubleQuoted,
            ]
        );
        assert_eq!(&text[refs[1].range.clone()], "${FOO}");
    }

    #[test]
    fn test_braced_preferred_over_dollar() {
        let refs: Vec<Reference> = extract_references("${DB_URL}").collect();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].range, 0..9);
        assert_eq!(refs[0].syntax, ReferenceSyntax::Braced);
    }

    #[test]
    fn test_non_matching_text_is_skipped() {
        assert!(names("no refs here, $lower 'Mixed' \"\" ${} $1X").is_empty());
        assert_eq!(names("${unclosed $OK"), vec!["OK"]);
        assert_eq!(names("$A$B"), vec!["A", "B"]);
        assert_eq!(names("${A_1}x$_B"), vec!["A_1", "_B"]);
    }

    #[test]
    fn test_extraction_totality_round_trip() {
        let text = "x=${HOME}/$PATH:'Q' \"R\" $ ${ '' \u{e9}$UNI\u{e9}";
        for r in extract_references(text) {
            let raw = &text[r.range.clone()];
            assert_eq!(canonical_name(raw).map(|(n, _)| n), Some(r.name.as_str()));
        }
        assert_eq!(names(text), vec!["HOME", "PATH", "Q", "R", "UNI"]);
    }

    #[test]
    fn test_extraction_is_restartable() {
        let text = "$A ${B}";
        let first: Vec<Reference> = extract_references(text).collect();
        let second: Vec<Reference> = extract_references(text).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_canonical_name_rejects_partial_matches() {
        assert_eq!(canonical_name("$FOO"), Some(("FOO", ReferenceSyntax::Dollar)));
        assert_eq!(canonical_name("${FOO}"), Some(("FOO", ReferenceSyntax::Braced)));
        assert_eq!(canonical_name(" $FOO"), None);
        assert_eq!(canonical_name("${FOO"), None);
        assert_eq!(canonical_name("'FOO\""), None);
        assert_eq!(canonical_name(""), None);
    }

    #[test]
    fn test_reference_at_cursor_positions() {
        let text = "url=${HOST}:$PORT";
        // inside the braces
        assert_eq!(reference_at(text, 6).unwrap().name, "HOST");
        // on the start and directly after the end
        assert_eq!(reference_at(text, 4).unwrap().name, "HOST");
        assert_eq!(reference_at(text, 11).unwrap().name, "HOST");
        assert_eq!(reference_at(text, 12).unwrap().name, "PORT");
        assert_eq!(reference_at(text, text.len()).unwrap().name, "PORT");
        assert!(reference_at(text, 1).is_none());
        assert!(reference_at(text, 100).is_none());
    }

    #[test]
    fn test_reference_at_matches_full_extractor() {
        let text = "echo \"$A\" '${B}' \"C\"";
        for r in extract_references(text) {
            let mid = (r.range.start + r.range.end) / 2;
            assert_eq!(reference_at(text, mid), Some(r));
        }
    }
}
