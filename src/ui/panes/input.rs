//! Answer input line

use crate::session::Question;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Render the question and the answer typed so far, placing the cursor at
/// the end of the answer
pub fn render_input_line(frame: &mut Frame, area: Rect, question: Option<&Question>, buffer: &str) {
    let (title, border) = match question {
        Some(q) if q.manual => (" Value (empty to finish) ", DEFAULT_THEME.secondary),
        Some(_) => (" Answer ", DEFAULT_THEME.border_focused),
        None => (" Done ", DEFAULT_THEME.border_normal),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let Some(question) = question else {
        frame.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let label = format!("{}. {}", question.number, question.text);
    let prefix_width = label.chars().count() + 1;
    let line = Line::from(vec![
        Span::styled(
            label,
            Style::default()
                .fg(DEFAULT_THEME.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(buffer.to_string(), Style::default().fg(DEFAULT_THEME.fg)),
    ]);
    frame.render_widget(Paragraph::new(line).block(block), area);

    let column = area.x + 1 + (prefix_width + buffer.chars().count()) as u16;
    let column = column.min(area.right().saturating_sub(2));
    frame.set_cursor_position(Position::new(column, area.y + 1));
}
