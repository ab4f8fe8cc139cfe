//! Plan pane: the questions still to come, as far as they are known

use crate::analysis::demand::{DemandPlan, PlanStatus};
use crate::ui::panes::transcript::iteration_label;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Footer describing how the plan ends
fn status_line(status: &PlanStatus, manual: bool) -> Line<'static> {
    let (text, color) = match status {
        _ if manual => (
            "manual entry: empty answer finishes".to_string(),
            DEFAULT_THEME.secondary,
        ),
        PlanStatus::Complete => ("end of input".to_string(), DEFAULT_THEME.success),
        PlanStatus::Pending { variable } => (
            format!("more once '{}' is known", variable),
            DEFAULT_THEME.primary,
        ),
        PlanStatus::OpenEnded => ("continues manually".to_string(), DEFAULT_THEME.secondary),
    };
    Line::from(Span::styled(
        format!("… {}", text),
        Style::default().fg(color).add_modifier(Modifier::ITALIC),
    ))
}

/// Render the plan pane. `answered` slots are hidden; the next one is
/// highlighted.
pub fn render_plan_pane(
    frame: &mut Frame,
    area: Rect,
    plan: &DemandPlan,
    answered: usize,
    manual: bool,
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
        .title(format!(" Plan ({} planned) ", plan.len()))
        .borders(Borders::ALL)
        .border_style(border_style);

    let mut items: Vec<ListItem> = plan
        .slots
        .iter()
        .enumerate()
        .skip(answered)
        .map(|(idx, slot)| {
            let style = if idx == answered {
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.fg)
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:>3}. ", idx + 1),
                    Style::default().fg(DEFAULT_THEME.comment),
                ),
                Span::styled(slot.prompt.text.clone(), style),
                Span::styled(
                    format!(" {}", iteration_label(slot.iteration)),
                    Style::default().fg(DEFAULT_THEME.loop_marker),
                ),
            ]))
        })
        .collect();
    items.push(ListItem::new(status_line(&plan.status, manual)));

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    if items.len() > visible_height {
        *scroll_offset = (*scroll_offset).min(items.len() - visible_height);
    } else {
        *scroll_offset = 0;
    }

    let visible: Vec<ListItem> = items
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .collect();
    frame.render_widget(List::new(visible).block(block), area);
}
