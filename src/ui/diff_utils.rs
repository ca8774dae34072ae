use std::ops::Range;

use patchview::HighlightedLine;
use ratatui::{
    style::{Color, Style},
    text::Span,
};
use syntect::{
    highlighting::Theme,
    parsing::{SyntaxReference, SyntaxSet},
};

use crate::ui::highlight_line::highlight_line_content;

pub const DELETE_BG: Color = Color::Rgb(80, 0, 0);
pub const DELETE_CHANGED_BG: Color = Color::Rgb(139, 0, 0);
pub const INSERT_BG: Color = Color::Rgb(0, 60, 0);
pub const INSERT_CHANGED_BG: Color = Color::Rgb(0, 100, 0);
pub const FILLER_BG: Color = Color::Rgb(40, 40, 40);

/// Right-aligned line number gutter; blank for 0.
pub fn line_number_span(number: u32) -> Span<'static> {
    let text = if number == 0 {
        "     ".to_string()
    } else {
        format!("{number:4} ")
    };
    Span::styled(text, Style::default().fg(Color::DarkGray))
}

/// Syntax-coloured body of a line with its changed ranges picked out.
///
/// `base_bg` paints the whole line (none for context), `changed_bg` paints
/// the bytes the highlighter marked as inserted or deleted.
pub fn styled_body(
    line: &HighlightedLine,
    syntax: Option<&SyntaxReference>,
    syntax_set: &SyntaxSet,
    theme: &Theme,
    base_bg: Option<Color>,
    changed_bg: Color,
) -> Vec<Span<'static>> {
    let text = line.text();
    let spans = highlight_line_content(&text, syntax, syntax_set, theme);
    apply_diff_highlight(spans, &line.changed_ranges(), base_bg, changed_bg)
}

/// Splits `spans` at the edges of `diff_ranges` (byte offsets into the
/// concatenated span text) and recolours the backgrounds.
pub fn apply_diff_highlight(
    spans: Vec<Span<'static>>,
    diff_ranges: &[Range<usize>],
    base_bg: Option<Color>,
    highlight_bg: Color,
) -> Vec<Span<'static>> {
    let paint = |style: Style, changed: bool| match (changed, base_bg) {
        (true, _) => style.bg(highlight_bg),
        (false, Some(bg)) => style.bg(bg),
        (false, None) => style,
    };

    let mut out = Vec::with_capacity(spans.len() + diff_ranges.len() * 2);
    let mut span_start = 0;

    for span in spans {
        let content = span.content.as_ref();
        let span_end = span_start + content.len();
        let mut cursor = span_start;

        for range in diff_ranges {
            if range.end <= cursor {
                continue;
            }
            if range.start >= span_end {
                break;
            }

            let overlap_start = range.start.max(cursor);
            let overlap_end = range.end.min(span_end);

            if overlap_start > cursor {
                out.push(Span::styled(
                    content[cursor - span_start..overlap_start - span_start].to_string(),
                    paint(span.style, false),
                ));
            }
            out.push(Span::styled(
                content[overlap_start - span_start..overlap_end - span_start].to_string(),
                paint(span.style, true),
            ));
            cursor = overlap_end;
        }

        if cursor < span_end {
            out.push(Span::styled(
                content[cursor - span_start..].to_string(),
                paint(span.style, false),
            ));
        }

        span_start = span_end;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(spans: &[Span<'_>]) -> Vec<String> {
        spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn test_apply_diff_highlight_splits_spans() {
        let spans = vec![Span::raw("foo bar"), Span::raw(" baz")];
        let out = apply_diff_highlight(spans, &[4..9], Some(DELETE_BG), DELETE_CHANGED_BG);

        assert_eq!(texts(&out), vec!["foo ", "bar", " b", "az"]);
        assert_eq!(out[0].style.bg, Some(DELETE_BG));
        assert_eq!(out[1].style.bg, Some(DELETE_CHANGED_BG));
        assert_eq!(out[2].style.bg, Some(DELETE_CHANGED_BG));
        assert_eq!(out[3].style.bg, Some(DELETE_BG));
    }

    #[test]
    fn test_apply_diff_highlight_without_ranges() {
        let out = apply_diff_highlight(vec![Span::raw("same")], &[], None, INSERT_CHANGED_BG);
        assert_eq!(texts(&out), vec!["same"]);
        assert_eq!(out[0].style.bg, None);
    }

    #[test]
    fn test_line_number_span() {
        assert_eq!(line_number_span(0).content, "     ");
        assert_eq!(line_number_span(12).content, "  12 ");
    }
}
