use patchview::{Cell, CellKind, DiffFile};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Margin, Rect},
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
        DELETE_BG, DELETE_CHANGED_BG, FILLER_BG, INSERT_BG, INSERT_CHANGED_BG, line_number_span,
        styled_body,
    },
};

struct CellStyle<'a> {
    syntax: Option<&'a SyntaxReference>,
    syntax_set: &'a SyntaxSet,
    theme: &'a Theme,
    panel_width: usize,
}

pub fn render_side_by_side_diff(f: &mut Frame, area: Rect, file: &DiffFile, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let visible_lines = area.height.saturating_sub(2) as usize;
    let cell_style = CellStyle {
        syntax: app.get_syntax_for_file(file),
        syntax_set: app.get_syntax_set(),
        theme: app.get_theme(),
        panel_width: chunks[0].width.saturating_sub(2) as usize, // Width minus borders
    };

    let mut old_lines = Vec::new();
    let mut new_lines = Vec::new();

    for row in app.rows().iter().skip(app.scroll_offset).take(visible_lines) {
        old_lines.push(render_cell(&row.old, &cell_style));
        new_lines.push(render_cell(&row.new, &cell_style));
    }

    let old_title = format!("Old: {}", file.old_name);
    let new_title = format!("New: {}", file.new_name);

    let old_paragraph = Paragraph::new(Text::from(old_lines))
        .block(Block::default().borders(Borders::ALL).title(old_title));
    let new_paragraph = Paragraph::new(Text::from(new_lines))
        .block(Block::default().borders(Borders::ALL).title(new_title));

    f.render_widget(old_paragraph, chunks[0]);
    f.render_widget(new_paragraph, chunks[1]);

    let total_lines = app.rows().len();
    if total_lines > visible_lines {
        let mut scrollbar_state = ScrollbarState::new(total_lines).position(app.scroll_offset);

        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));

        for chunk in chunks.iter() {
            f.render_stateful_widget(
                scrollbar.clone(),
                chunk.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }
}

fn render_cell(cell: &Cell, style: &CellStyle<'_>) -> Line<'static> {
    let (base_bg, changed_bg) = match cell.kind {
        CellKind::Empty => {
            // Fill the whole panel so the gap reads as a gap
            return Line::from(Span::styled(
                " ".repeat(style.panel_width),
                Style::default().bg(FILLER_BG),
            ));
        }
        CellKind::Info => {
            return Line::from(Span::styled(
                cell.line.text(),
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        CellKind::Context => (None, Color::Reset),
        CellKind::Delete => (Some(DELETE_BG), DELETE_CHANGED_BG),
        CellKind::Insert => (Some(INSERT_BG), INSERT_CHANGED_BG),
    };

    let mut spans = vec![line_number_span(cell.number)];
    let prefix_style = match base_bg {
        Some(bg) => Style::default().bg(bg).fg(Color::White),
        None => Style::default().fg(Color::White),
    };
    spans.push(Span::styled(cell.line.prefix.clone(), prefix_style));
    spans.extend(styled_body(
        &cell.line,
        style.syntax,
        style.syntax_set,
        style.theme,
        base_bg,
        changed_bg,
    ));

    Line::from(spans)
}
