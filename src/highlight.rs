//! Word-level highlighting of a changed line pair.
//!
//! The diff marker is split off first and never compared. The two bodies are
//! diffed with `similar`, and each side keeps only the segments that exist on
//! it: the old side shows equal and deleted text, the new side equal and
//! inserted text.

use std::borrow::Cow;
use std::ops::Range;

use similar::{Algorithm, ChangeTag, TextDiff};

use crate::config::{Granularity, HighlightConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Equal,
    Insert,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub text: String,
}

impl Segment {
    pub fn new(kind: SegmentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// One side of a highlighted pair, or a plain line with a single segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightedLine {
    pub prefix: String,
    pub segments: Vec<Segment>,
}

impl HighlightedLine {
    /// A line with no intra-line changes.
    pub fn plain(prefix: &str, text: &str) -> Self {
        let segments = if text.is_empty() {
            Vec::new()
        } else {
            vec![Segment::new(SegmentKind::Equal, text)]
        };
        Self {
            prefix: prefix.to_string(),
            segments,
        }
    }

    /// Content without the prefix and without markup.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Content as HTML: literal text escaped, changed runs wrapped in
    /// `<del>`/`<ins>`. Escaping happens per segment so the tags survive.
    pub fn markup(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            let text = escape_html(&segment.text);
            match segment.kind {
                SegmentKind::Equal => out.push_str(&text),
                SegmentKind::Delete => {
                    out.push_str("<del>");
                    out.push_str(&text);
                    out.push_str("</del>");
                }
                SegmentKind::Insert => {
                    out.push_str("<ins>");
                    out.push_str(&text);
                    out.push_str("</ins>");
                }
            }
        }
        out
    }

    /// Byte ranges of `text()` covered by changed segments.
    pub fn changed_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges: Vec<Range<usize>> = Vec::new();
        let mut idx = 0;

        for segment in &self.segments {
            let len = segment.text.len();
            if segment.kind != SegmentKind::Equal {
                let range = idx..idx + len;
                match ranges.last_mut() {
                    Some(last) if last.end == range.start => last.end = range.end,
                    _ => ranges.push(range),
                }
            }
            idx += len;
        }

        ranges
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub old: HighlightedLine,
    pub new: HighlightedLine,
}

/// Splits the diff marker (one column, two for combined diffs) off a raw
/// hunk line.
pub fn split_prefix(line: &str, is_combined: bool) -> (&str, &str) {
    let width = if is_combined { 2 } else { 1 };
    let at = line
        .char_indices()
        .nth(width)
        .map_or(line.len(), |(idx, _)| idx);
    line.split_at(at)
}

/// Highlights what changed between a deleted and an inserted line.
pub fn diff_highlight(
    old_line: &str,
    new_line: &str,
    is_combined: bool,
    config: &HighlightConfig,
) -> Highlight {
    let (old_prefix, old_body) = split_prefix(old_line, is_combined);
    let (new_prefix, new_body) = split_prefix(new_line, is_combined);

    let segments = diff_segments(old_body, new_body, config.granularity);

    Highlight {
        old: HighlightedLine {
            prefix: old_prefix.to_string(),
            segments: keep(&segments, SegmentKind::Delete),
        },
        new: HighlightedLine {
            prefix: new_prefix.to_string(),
            segments: keep(&segments, SegmentKind::Insert),
        },
    }
}

/// Ordered equal/insert/delete segments turning `old` into `new`. Between
/// two equal runs there is at most one deletion followed by one insertion,
/// and short equal runs caught between larger changes are folded into them.
pub fn diff_segments(old: &str, new: &str, granularity: Granularity) -> Vec<Segment> {
    let diff = match granularity {
        Granularity::Chars => TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .diff_chars(old, new),
        Granularity::Words => TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .diff_words(old, new),
    };

    let mut segments: Vec<Segment> = Vec::new();
    for change in diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Equal => SegmentKind::Equal,
            ChangeTag::Delete => SegmentKind::Delete,
            ChangeTag::Insert => SegmentKind::Insert,
        };
        match segments.last_mut() {
            Some(last) if last.kind == kind => last.text.push_str(change.value()),
            _ => segments.push(Segment::new(kind, change.value())),
        }
    }

    cleanup_semantic(segments)
}

/// Rewrites every equal run that is no longer than the changes on both of
/// its sides as a deletion plus an insertion of the same text, until none
/// is left. `campaign` to `guidance` then reads as one replaced word rather
/// than the few letters the two happen to share.
fn cleanup_semantic(mut segments: Vec<Segment>) -> Vec<Segment> {
    loop {
        segments = normalize(segments);
        let Some(idx) = (1..segments.len().saturating_sub(1))
            .find(|&idx| is_absorbable(&segments, idx))
        else {
            return segments;
        };

        let text = std::mem::take(&mut segments[idx].text);
        segments[idx] = Segment::new(SegmentKind::Delete, text.clone());
        segments.insert(idx + 1, Segment::new(SegmentKind::Insert, text));
    }
}

/// Collapses each stretch of changes into one deletion and one insertion and
/// merges touching equal runs.
fn normalize(segments: Vec<Segment>) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::with_capacity(segments.len());
    let mut deleted = String::new();
    let mut inserted = String::new();

    for segment in segments {
        match segment.kind {
            SegmentKind::Delete => deleted.push_str(&segment.text),
            SegmentKind::Insert => inserted.push_str(&segment.text),
            SegmentKind::Equal => {
                flush_changes(&mut out, &mut deleted, &mut inserted);
                match out.last_mut() {
                    Some(last) if last.kind == SegmentKind::Equal => {
                        last.text.push_str(&segment.text)
                    }
                    _ => out.push(segment),
                }
            }
        }
    }
    flush_changes(&mut out, &mut deleted, &mut inserted);

    out
}

fn flush_changes(out: &mut Vec<Segment>, deleted: &mut String, inserted: &mut String) {
    if !deleted.is_empty() {
        out.push(Segment::new(SegmentKind::Delete, std::mem::take(deleted)));
    }
    if !inserted.is_empty() {
        out.push(Segment::new(SegmentKind::Insert, std::mem::take(inserted)));
    }
}

fn is_absorbable(segments: &[Segment], idx: usize) -> bool {
    if segments[idx].kind != SegmentKind::Equal {
        return false;
    }

    let len = segments[idx].text.chars().count();
    let before = change_size(segments[..idx].iter().rev());
    let after = change_size(segments[idx + 1..].iter());
    len <= before && len <= after
}

/// Larger of the deleted and inserted char counts up to the next equal run.
fn change_size<'a>(segments: impl Iterator<Item = &'a Segment>) -> usize {
    let (mut deleted, mut inserted) = (0, 0);
    for segment in segments {
        match segment.kind {
            SegmentKind::Equal => break,
            SegmentKind::Delete => deleted += segment.text.chars().count(),
            SegmentKind::Insert => inserted += segment.text.chars().count(),
        }
    }
    deleted.max(inserted)
}

fn keep(segments: &[Segment], changed: SegmentKind) -> Vec<Segment> {
    let mut kept: Vec<Segment> = Vec::new();
    for segment in segments {
        if segment.kind != SegmentKind::Equal && segment.kind != changed {
            continue;
        }
        // Dropping the other side's change can leave two equal runs touching.
        match kept.last_mut() {
            Some(last) if last.kind == segment.kind => last.text.push_str(&segment.text),
            _ => kept.push(segment.clone()),
        }
    }
    kept
}

pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn highlight(old: &str, new: &str) -> Highlight {
        diff_highlight(old, new, false, &HighlightConfig::default())
    }

    #[test]
    fn marks_appended_suffix() {
        let result = highlight("-test", "+test1r");

        assert_eq!(result.old.prefix, "-");
        assert_eq!(result.new.prefix, "+");
        assert_eq!(result.old.markup(), "test");
        assert_eq!(result.new.markup(), "test<ins>1r</ins>");
        assert!(result.old.changed_ranges().is_empty());
        assert_eq!(result.new.changed_ranges(), vec![4..6]);
    }

    #[test]
    fn marks_replaced_word() {
        let result = highlight("-foo bar baz", "+foo qux baz");

        assert_eq!(result.old.text(), "foo bar baz");
        assert_eq!(result.new.text(), "foo qux baz");
        assert_eq!(result.old.changed_ranges(), vec![4..7]);
        assert_eq!(result.new.changed_ranges(), vec![4..7]);
        assert_eq!(result.old.markup(), "foo <del>bar</del> baz");
        assert_eq!(result.new.markup(), "foo <ins>qux</ins> baz");
    }

    #[test]
    fn each_side_reconstructs_its_line() {
        let result = highlight(" category:campaign,", " category:guidance,");
        assert_eq!(result.old.text(), "category:campaign,");
        assert_eq!(result.new.text(), "category:guidance,");
        assert!(result.old.segments.iter().all(|s| s.kind != SegmentKind::Insert));
        assert!(result.new.segments.iter().all(|s| s.kind != SegmentKind::Delete));
    }

    #[test]
    fn rewritten_word_is_one_replacement() {
        let result = highlight(" category:campaign,", " category:guidance,");

        assert_eq!(result.old.markup(), "category:<del>campaign</del>,");
        assert_eq!(result.new.markup(), "category:<ins>guidance</ins>,");
    }

    #[test]
    fn shared_letters_inside_replaced_identifiers_are_absorbed() {
        let result = highlight("-let value = 1;", "+let result = 1;");

        assert_eq!(result.old.markup(), "let <del>value</del> = 1;");
        assert_eq!(result.new.markup(), "let <ins>result</ins> = 1;");
    }

    #[test]
    fn long_equal_run_between_changes_survives() {
        let segments = diff_segments("a shared middle b", "x shared middle y", Granularity::Chars);

        assert_eq!(
            segments,
            vec![
                Segment::new(SegmentKind::Delete, "a"),
                Segment::new(SegmentKind::Insert, "x"),
                Segment::new(SegmentKind::Equal, " shared middle "),
                Segment::new(SegmentKind::Delete, "b"),
                Segment::new(SegmentKind::Insert, "y"),
            ]
        );
    }

    #[test]
    fn normalize_groups_changes_between_equal_runs() {
        let segments = vec![
            Segment::new(SegmentKind::Insert, "x"),
            Segment::new(SegmentKind::Delete, "a"),
            Segment::new(SegmentKind::Insert, "y"),
            Segment::new(SegmentKind::Equal, "k"),
            Segment::new(SegmentKind::Equal, "l"),
        ];

        assert_eq!(
            normalize(segments),
            vec![
                Segment::new(SegmentKind::Delete, "a"),
                Segment::new(SegmentKind::Insert, "xy"),
                Segment::new(SegmentKind::Equal, "kl"),
            ]
        );
    }

    #[test]
    fn markup_escapes_content_but_not_tags() {
        let result = highlight("-if a < b {", "+if a <= b {");

        assert_eq!(result.old.markup(), "if a &lt; b {");
        assert_eq!(result.new.markup(), "if a &lt;<ins>=</ins> b {");
    }

    #[test]
    fn combined_lines_use_two_column_prefix() {
        let result = diff_highlight("- old", " +new", true, &HighlightConfig::default());
        assert_eq!(result.old.prefix, "- ");
        assert_eq!(result.new.prefix, " +");
        assert_eq!(result.old.text(), "old");
        assert_eq!(result.new.text(), "new");
    }

    #[test]
    fn empty_lines_have_no_segments() {
        let result = highlight("-", "+");
        assert!(result.old.segments.is_empty());
        assert!(result.new.segments.is_empty());
        assert_eq!(result.old.markup(), "");
    }

    #[test]
    fn word_granularity_marks_whole_words() {
        let config = HighlightConfig {
            granularity: Granularity::Words,
        };
        let result = diff_highlight("-let total = 10;", "+let total = 12;", false, &config);

        assert_eq!(result.old.markup(), "let total = <del>10;</del>");
        assert_eq!(result.new.markup(), "let total = <ins>12;</ins>");
    }

    #[test]
    fn split_prefix_respects_char_boundaries() {
        assert_eq!(split_prefix("+é", false), ("+", "é"));
        assert_eq!(split_prefix("", false), ("", ""));
        assert_eq!(split_prefix("+", true), ("+", ""));
    }

    #[test]
    fn escape_html_borrows_clean_text() {
        assert!(matches!(escape_html("plain"), Cow::Borrowed("plain")));
        assert_eq!(escape_html("a&b\"'"), "a&amp;b&quot;&#x27;");
    }
}
