use ratatui::{
    style::{Color, Modifier, Style},
    text::Span,
};
use syntect::highlighting::{FontStyle, Style as SyntectStyle, Theme};
use syntect::{
    easy::HighlightLines,
    parsing::{SyntaxReference, SyntaxSet},
};

/// Syntax-coloured spans for one line body. Falls back to a single raw span
/// when the language is unknown or syntect fails on the line.
pub fn highlight_line_content(
    content: &str,
    syntax: Option<&SyntaxReference>,
    syntax_set: &SyntaxSet,
    theme: &Theme,
) -> Vec<Span<'static>> {
    let Some(syntax) = syntax else {
        return vec![Span::raw(content.to_string())];
    };

    let mut highlighter = HighlightLines::new(syntax, theme);
    match highlighter.highlight_line(content, syntax_set) {
        Ok(ranges) => ranges
            .into_iter()
            .map(|(style, text)| Span::styled(text.to_string(), syntect_style_to_ratatui(style)))
            .collect(),
        Err(err) => {
            log::debug!("syntax highlighting failed: {err}");
            vec![Span::raw(content.to_string())]
        }
    }
}

fn syntect_style_to_ratatui(syntect_style: SyntectStyle) -> Style {
    let fg_color = Color::Rgb(
        syntect_style.foreground.r,
        syntect_style.foreground.g,
        syntect_style.foreground.b,
    );

    let mut style = Style::default().fg(fg_color);

    if syntect_style.font_style.contains(FontStyle::BOLD) {
        style = style.add_modifier(Modifier::BOLD);
    }
    if syntect_style.font_style.contains(FontStyle::ITALIC) {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if syntect_style.font_style.contains(FontStyle::UNDERLINE) {
        style = style.add_modifier(Modifier::UNDERLINED);
    }

    style
}
