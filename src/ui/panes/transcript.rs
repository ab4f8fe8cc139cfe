//! Transcript pane: every question asked so far with its answer

use crate::analysis::demand::Iteration;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph},
    Frame,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub number: usize,
    pub prompt: String,
    pub answer: String,
    pub iteration: Option<Iteration>,
}

/// Short iteration label such as `[i=2]` or `[2,0]`
pub fn iteration_label(iteration: Option<Iteration>) -> String {
    match iteration {
        None => String::new(),
        Some(Iteration { outer, inner: None }) => format!("[i={}]", outer),
        Some(Iteration {
            outer,
            inner: Some(inner),
        }) => format!("[{},{}]", outer, inner),
    }
}

/// Render the transcript pane
pub fn render_transcript_pane(
    frame: &mut Frame,
    area: Rect,
    entries: &[TranscriptEntry],
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Transcript ")
        .borders(Borders::ALL)
        .border_style(border_style);

    if entries.is_empty() {
        let paragraph = Paragraph::new("(no answers yet)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let block = block.padding(Padding::new(1, 0, 0, 0));
    let all_items: Vec<ListItem> = entries
        .iter()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:>3}. ", entry.number),
                    Style::default().fg(DEFAULT_THEME.comment),
                ),
                Span::styled(entry.prompt.clone(), Style::default().fg(DEFAULT_THEME.fg)),
                Span::styled(
                    format!("{} ", iteration_label(entry.iteration)),
                    Style::default().fg(DEFAULT_THEME.loop_marker),
                ),
                Span::styled(
                    format!("→ {}", entry.answer),
                    Style::default().fg(DEFAULT_THEME.success),
                ),
            ]))
        })
        .collect();

    let total_items = all_items.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;

    // usize::MAX pins the view to the newest answer
    if total_items > visible_height {
        *scroll_offset = (*scroll_offset).min(total_items - visible_height);
    } else {
        *scroll_offset = 0;
    }

    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_labels() {
        assert_eq!(iteration_label(None), "");
        assert_eq!(iteration_label(Some(Iteration { outer: 2, inner: None })), "[i=2]");
        assert_eq!(
            iteration_label(Some(Iteration {
                outer: 1,
                inner: Some(0)
            })),
            "[1,0]"
        );
    }
}
