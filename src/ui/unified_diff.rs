use patchview::{
    DiffFile, DiffLine, HighlightedLine, LineType, diff_highlight, highlight::split_prefix,
};
use ratatui::{
    Frame,
    layout::{Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use syntect::{
    highlighting::Theme,
    parsing::{SyntaxReference, SyntaxSet},
};

use crate::{
    app::App,
    ui::diff_utils::{
        DELETE_BG, DELETE_CHANGED_BG, INSERT_BG, INSERT_CHANGED_BG, line_number_span, styled_body,
    },
};

pub fn render_unified_diff(f: &mut Frame, area: Rect, file: &DiffFile, app: &App) {
    let visible_lines = area.height.saturating_sub(2) as usize; // Account for borders
    let syntax = app.get_syntax_for_file(file);
    let theme = app.get_theme();
    let syntax_set = app.get_syntax_set();

    let mut lines: Vec<Line<'static>> = Vec::with_capacity(app.display_len());

    if file.blocks.is_empty() {
        lines.push(Line::from(Span::styled(
            "File without changes",
            Style::default().fg(Color::DarkGray),
        )));
    }

    for block in &file.blocks {
        lines.push(header_line(&block.header));

        let mut i = 0;
        while i < block.lines.len() {
            let diff_line = &block.lines[i];

            // A removal directly followed by an addition gets intra-line
            // highlighting, as in the side-by-side view.
            if diff_line.line_type == LineType::Delete
                && let Some(next_line) = block.lines.get(i + 1)
                && next_line.line_type == LineType::Insert
            {
                let highlight = diff_highlight(
                    &diff_line.content,
                    &next_line.content,
                    file.is_combined,
                    &app.highlight_config,
                );
                lines.push(render_diff_line(diff_line, &highlight.old, syntax, syntax_set, theme));
                lines.push(render_diff_line(next_line, &highlight.new, syntax, syntax_set, theme));
                i += 2;
                continue;
            }

            let (prefix, body) = split_prefix(&diff_line.content, file.is_combined);
            let plain = HighlightedLine::plain(prefix, body);
            lines.push(render_diff_line(diff_line, &plain, syntax, syntax_set, theme));
            i += 1;
        }
    }

    let total_lines = lines.len();
    let visible: Vec<Line<'static>> = lines
        .into_iter()
        .skip(app.scroll_offset)
        .take(visible_lines)
        .collect();

    let paragraph = Paragraph::new(Text::from(visible)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{} [{}]", file.display_name(), file.status().label())),
    );
    f.render_widget(paragraph, area);

    if total_lines > visible_lines {
        let mut scrollbar_state = ScrollbarState::new(total_lines).position(app.scroll_offset);

        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));

        f.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn header_line(header: &str) -> Line<'static> {
    Line::from(Span::styled(
        header.to_string(),
        Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ))
}

fn render_diff_line(
    diff_line: &DiffLine,
    highlighted: &HighlightedLine,
    syntax: Option<&SyntaxReference>,
    syntax_set: &SyntaxSet,
    theme: &Theme,
) -> Line<'static> {
    let mut spans = vec![
        line_number_span(diff_line.old_number),
        line_number_span(diff_line.new_number),
    ];

    let (base_bg, changed_bg) = match diff_line.line_type {
        LineType::Insert => (Some(INSERT_BG), INSERT_CHANGED_BG),
        LineType::Delete => (Some(DELETE_BG), DELETE_CHANGED_BG),
        LineType::Context => (None, Color::Reset),
    };

    let prefix_style = match base_bg {
        Some(bg) => Style::default().bg(bg).fg(Color::White),
        None => Style::default().fg(Color::White),
    };
    spans.push(Span::styled(highlighted.prefix.clone(), prefix_style));
    spans.extend(styled_body(
        highlighted,
        syntax,
        syntax_set,
        theme,
        base_bg,
        changed_bg,
    ));

    Line::from(spans)
}
