//! Status bar rendering with keybindings and progress

use crate::session::SessionState;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// `Value 2/5` when the total is known, `Value 2/?` otherwise
pub fn progress_text(answered: usize, total: Option<usize>, state: SessionState) -> String {
    let shown = match state {
        SessionState::AwaitingAnswer | SessionState::ManualEntry => answered + 1,
        _ => answered,
    };
    match total {
        Some(total) => format!(" Value {}/{} ", shown, total),
        None => format!(" Value {}/? ", shown),
    }
}

/// Render the status bar at the bottom.
///
/// `total` is `None` while the number of values is still unknown.
pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    message: &str,
    answered: usize,
    total: Option<usize>,
    state: SessionState,
) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let badge = match state {
        SessionState::ManualEntry => DEFAULT_THEME.secondary,
        SessionState::Cancelled => DEFAULT_THEME.error,
        SessionState::Completed => DEFAULT_THEME.success,
        _ => DEFAULT_THEME.primary,
    };

    let left_spans = vec![
        Span::styled(
            progress_text(answered, total, state),
            Style::default()
                .bg(badge)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            " | ",
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(DEFAULT_THEME.comment),
        ),
        Span::styled(
            format!(" {} ", message),
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(DEFAULT_THEME.fg),
        ),
    ];

    let left_paragraph = Paragraph::new(Line::from(left_spans))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Left);
    frame.render_widget(left_paragraph, layout[0]);

    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.fg);
    let sep_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.comment);

    let mut right_spans = vec![
        Span::styled(" ↵ ", key_style),
        Span::styled(" submit ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ", desc_style),
        Span::styled(" ⇥ ", key_style),
        Span::styled(" focus ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ", desc_style),
        Span::styled(" ↑/↓ ", key_style),
        Span::styled(" scroll ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ", desc_style),
        Span::styled(" esc ", key_style),
        Span::styled(" cancel ", desc_style),
    ];

    if state == SessionState::ManualEntry {
        right_spans.push(Span::styled("│", sep_style));
        right_spans.push(Span::styled(
            " ⌨ MANUAL ",
            Style::default()
                .bg(DEFAULT_THEME.secondary)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let right_paragraph = Paragraph::new(Line::from(right_spans))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Right);
    frame.render_widget(right_paragraph, layout[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_text() {
        assert_eq!(progress_text(1, Some(5), SessionState::AwaitingAnswer), " Value 2/5 ");
        assert_eq!(progress_text(1, None, SessionState::AwaitingAnswer), " Value 2/? ");
        assert_eq!(progress_text(3, Some(3), SessionState::Completed), " Value 3/3 ");
    }
}
