//! Marker detection shared by the analyzer and the substitution engine.
//!
//! The patterns are compiled once and shared read-only by every caller.
//!
//! Loop pairs need the close tag's name to equal the open tag's name, which a
//! plain regular expression cannot express without back-references. Matching is
//! therefore done in two steps: find an open marker, then look for the first
//! literal `{{/NAME}}` after it. When an open marker has no partner the search
//! resumes one character after that open marker's start, so every candidate
//! start position is tried in order, exactly like a back-referencing
//! `\{\{#([^}]+)\}\}(.*?)\{\{/\1\}\}` search with dot-matches-newline.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Any marker: `{{NAME}}`.
pub static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([^}]+)\}\}").expect("BUG: invalid MARKER_RE regex literal")
});

/// A loop open marker: `{{#NAME}}`.
pub static LOOP_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{#([^}]+)\}\}").expect("BUG: invalid LOOP_OPEN_RE regex literal")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Scalar,
    LoopOpen,
    LoopClose,
}

/// One `{{...}}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker<'a> {
    pub kind: MarkerKind,
    /// Everything between the braces, including a leading `#` or `/`.
    pub raw: &'a str,
    /// `raw` without the loop prefix.
    pub name: &'a str,
    /// Byte range of the whole marker, braces included.
    pub range: Range<usize>,
}

/// A well-formed loop section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSpan<'a> {
    pub name: &'a str,
    /// Byte range from the start of the open tag to the end of the close tag.
    pub range: Range<usize>,
    /// Byte range of the text between the tags.
    pub body: Range<usize>,
}

impl<'a> LoopSpan<'a> {
    pub fn body_text<'t>(&self, text: &'t str) -> &'t str {
        &text[self.body.clone()]
    }
}

pub fn close_tag(name: &str) -> String {
    format!("{{{{/{}}}}}", name)
}

pub fn scalar_marker(name: &str) -> String {
    format!("{{{{{}}}}}", name)
}

/// All markers, left to right, non-overlapping.
pub fn markers(text: &str) -> impl Iterator<Item = Marker<'_>> {
    MARKER_RE.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let raw = caps.get(1)?.as_str();
        let (kind, name) = if let Some(name) = raw.strip_prefix('#') {
            (MarkerKind::LoopOpen, name)
        } else if let Some(name) = raw.strip_prefix('/') {
            (MarkerKind::LoopClose, name)
        } else {
            (MarkerKind::Scalar, raw)
        };
        Some(Marker { kind, raw, name, range: whole.range() })
    })
}

/// Names of all loop open markers, left to right, duplicates included.
pub fn loop_open_names(text: &str) -> impl Iterator<Item = &str> {
    LOOP_OPEN_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// The first well-formed loop section starting at or after `from`.
pub fn find_loop_from(text: &str, from: usize) -> Option<LoopSpan<'_>> {
    let mut pos = from;
    while let Some(caps) = LOOP_OPEN_RE.captures_at(text, pos) {
        let (Some(open), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let close = close_tag(name.as_str());
        if let Some(offset) = text[open.end()..].find(&close) {
            let body_end = open.end() + offset;
            return Some(LoopSpan {
                name: name.as_str(),
                range: open.start()..body_end + close.len(),
                body: open.end()..body_end,
            });
        }
        // `{` is one byte, so this stays on a char boundary.
        pos = open.start() + 1;
    }
    None
}

/// The first well-formed loop section in `text`.
pub fn find_first_loop(text: &str) -> Option<LoopSpan<'_>> {
    find_loop_from(text, 0)
}

/// Every well-formed loop section of an unmodified text, left to right,
/// without overlaps.
pub fn loop_spans(text: &str) -> Vec<LoopSpan<'_>> {
    let mut spans = Vec::new();
    let mut pos = 0;
    while let Some(span) = find_loop_from(text, pos) {
        pos = span.range.end;
        spans.push(span);
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_classify_kinds() {
        let text = "{{title}} {{#rows}}{{cell}}{{/rows}}";
        let found: Vec<_> = markers(text).map(|m| (m.kind, m.name)).collect();
        assert_eq!(
            found,
            vec![
                (MarkerKind::Scalar, "title"),
                (MarkerKind::LoopOpen, "rows"),
                (MarkerKind::Scalar, "cell"),
                (MarkerKind::LoopClose, "rows"),
            ]
        );
    }

    #[test]
    fn test_marker_names_exclude_closing_brace() {
        assert_eq!(markers("{{}}").count(), 0);
        let found: Vec<_> = markers("{{a b}} {{x}y}}").map(|m| m.raw).collect();
        assert_eq!(found, vec!["a b"]);
    }

    #[test]
    fn test_find_first_loop_spans_newlines() {
        let text = "head\n{{#items}}\n- {{n}}\n{{/items}}\ntail";
        let span = find_first_loop(text).unwrap();
        assert_eq!(span.name, "items");
        assert_eq!(span.body_text(text), "\n- {{n}}\n");
        assert_eq!(&text[span.range.clone()], "{{#items}}\n- {{n}}\n{{/items}}");
    }

    #[test]
    fn test_close_name_must_match_open_name() {
        assert_eq!(find_first_loop("{{#a}}x{{/b}}"), None);
        let text = "{{#a}}x{{/b}} {{#b}}y{{/b}}";
        let span = find_first_loop(text).unwrap();
        assert_eq!(span.name, "b");
        assert_eq!(span.body_text(text), "y");
    }

    #[test]
    fn test_unmatched_open_does_not_hide_later_pair() {
        let text = "{{#orphan}} {{#ok}}1{{/ok}}";
        let span = find_first_loop(text).unwrap();
        assert_eq!(span.name, "ok");
    }

    #[test]
    fn test_loop_body_is_non_greedy() {
        let text = "{{#a}}1{{/a}}2{{/a}}";
        let span = find_first_loop(text).unwrap();
        assert_eq!(span.body_text(text), "1");
    }

    #[test]
    fn test_loop_spans_are_sequential() {
        let text = "{{#a}}1{{/a}}{{#b}}2{{/b}}{{#a}}3{{/a}}";
        let names: Vec<_> = loop_spans(text).iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_loop_open_names() {
        let names: Vec<_> = loop_open_names("{{#a}}{{/a}}{{#b}}{{b}}").collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_marker_helpers() {
        assert_eq!(scalar_marker("name"), "{{name}}");
        assert_eq!(close_tag("rows"), "{{/rows}}");
    }
}
