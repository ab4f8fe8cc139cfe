//! Source code pane rendering with syntax highlighting
//!
//! Shows the submitted program with:
//!
//! - keyword colouring for every supported language
//! - a gutter marker on each line that reads a value
//! - a bar beside the lines covered by the top-level loop
//! - the line behind the current question highlighted and kept in view

use crate::grammar::Language;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn comment_markers(language: Language) -> &'static [&'static str] {
    match language {
        Language::Python | Language::R => &["#"],
        Language::Php => &["//", "#"],
        Language::Sql => &["--"],
        _ => &["//"],
    }
}

/// Simple syntax highlighting for one source line
fn highlight_source_code(line: &str, language: Language) -> Line<'_> {
    let mut spans = Vec::new();
    let mut word_start: Option<usize> = None;
    let markers = comment_markers(language);

    let mut chars = line.char_indices();
    while let Some((i, c)) = chars.next() {
        if markers.iter().any(|m| line[i..].starts_with(m)) {
            if let Some(start) = word_start.take() {
                spans.push(word_span(&line[start..i], false));
            }
            spans.push(Span::styled(
                line[i..].to_string(),
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            return Line::from(spans);
        }

        if c == '"' || c == '\'' {
            if let Some(start) = word_start.take() {
                spans.push(word_span(&line[start..i], false));
            }
            let mut end = line.len();
            let mut escaped = false;
            for (j, d) in chars.by_ref() {
                if escaped {
                    escaped = false;
                } else if d == '\\' {
                    escaped = true;
                } else if d == c {
                    end = j + d.len_utf8();
                    break;
                }
            }
            spans.push(Span::styled(
                line[i..end].to_string(),
                Style::default().fg(DEFAULT_THEME.string),
            ));
            continue;
        }

        if c.is_alphanumeric() || c == '_' || c == '$' {
            word_start.get_or_insert(i);
            continue;
        }

        if let Some(start) = word_start.take() {
            spans.push(word_span(&line[start..i], c == '('));
        }
        let style = match c {
            '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.primary),
            _ => Style::default().fg(DEFAULT_THEME.fg),
        };
        spans.push(Span::styled(c.to_string(), style));
    }

    if let Some(start) = word_start {
        spans.push(word_span(&line[start..], false));
    }
    Line::from(spans)
}

fn word_span(word: &str, is_function: bool) -> Span<'static> {
    Span::styled(word.to_string(), get_keyword_style(word, is_function))
}

fn get_keyword_style(word: &str, is_function: bool) -> Style {
    match word {
        "int" | "char" | "void" | "bool" | "float" | "double" | "long" | "short" | "unsigned"
        | "String" | "string" | "number" | "boolean" | "auto" | "var" | "let" | "const" => {
            Style::default().fg(DEFAULT_THEME.type_name)
        }
        "for" | "foreach" | "while" | "do" | "repeat" | "if" | "else" | "elif" | "return"
        | "break" | "continue" | "in" | "as" | "range" | "def" | "func" | "function" | "class"
        | "public" | "static" | "import" | "from" | "package" | "SELECT" | "FROM" | "WHERE" => {
            Style::default()
                .fg(DEFAULT_THEME.keyword)
                .add_modifier(Modifier::BOLD)
        }
        "NULL" | "null" | "None" | "nil" | "true" | "false" | "True" | "False" | "TRUE"
        | "FALSE" => Style::default().fg(DEFAULT_THEME.number),
        _ if word.chars().all(|c| c.is_ascii_digit()) => Style::default().fg(DEFAULT_THEME.number),
        _ if is_function => Style::default().fg(DEFAULT_THEME.function),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Lines to decorate, all 1-based
#[derive(Debug, Clone, Default)]
pub struct SourceMarks {
    pub input_lines: Vec<usize>,
    pub loop_lines: Option<(usize, usize)>,
    pub current_line: Option<usize>,
}

/// Scroll state for the source pane
#[derive(Debug, Clone, Default)]
pub struct SourceScrollState {
    pub offset: usize,
    pub target_line_row: Option<usize>,
}

/// Render the source code pane
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    source_code: &str,
    language: Language,
    marks: &SourceMarks,
    is_focused: bool,
    scroll_state: &mut SourceScrollState,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(format!(" Source ({}) ", language))
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines: Vec<&str> = source_code.lines().collect();
    let total_lines = lines.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;

    let target_row = scroll_state
        .target_line_row
        .unwrap_or(visible_height / 2)
        .min(visible_height.saturating_sub(1));
    scroll_state.target_line_row = Some(target_row);

    // Keep the current line at its target row
    if let Some(current) = marks.current_line.filter(|&l| l > 0 && l <= total_lines) {
        scroll_state.offset = (current - 1).saturating_sub(target_row);
    }
    if total_lines > visible_height {
        scroll_state.offset = scroll_state.offset.min(total_lines - visible_height);
    } else {
        scroll_state.offset = 0;
    }

    let visible_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let is_current = marks.current_line == Some(line_num);
            let is_input = marks.input_lines.contains(&line_num);
            let in_loop = marks
                .loop_lines
                .is_some_and(|(first, last)| (first..=last).contains(&line_num));

            let num_style = if is_current {
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.comment)
            };

            let mut spans = vec![
                Span::styled(
                    if in_loop { "│" } else { " " },
                    Style::default().fg(DEFAULT_THEME.loop_marker),
                ),
                Span::styled(format!("{:4} ", line_num), num_style),
                Span::styled(
                    if is_input { "▸ " } else { "  " },
                    Style::default().fg(DEFAULT_THEME.input_marker),
                ),
            ];

            let mut content = highlight_source_code(line, language);
            if is_current {
                let current = Style::default()
                    .bg(DEFAULT_THEME.secondary)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD);
                for span in &mut content.spans {
                    span.style = current;
                }
            }
            spans.extend(content.spans);
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}
