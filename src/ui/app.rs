//! Main TUI application state and logic

use crate::session::{Question, Session, SessionState};
use crate::ui::panes::{self, SourceMarks, SourceScrollState, TranscriptEntry};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Transcript,
    Plan,
}

impl FocusedPane {
    /// Move focus to the next pane (source -> transcript -> plan)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Transcript,
            FocusedPane::Transcript => FocusedPane::Plan,
            FocusedPane::Plan => FocusedPane::Source,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Plan,
            FocusedPane::Transcript => FocusedPane::Source,
            FocusedPane::Plan => FocusedPane::Transcript,
        }
    }
}

/// The main application state
pub struct App {
    session: Session,

    /// Outstanding question, `None` once the session has finished
    question: Option<Question>,

    /// Answer being typed
    buffer: String,

    transcript: Vec<TranscriptEntry>,

    pub focused_pane: FocusedPane,

    source_scroll: SourceScrollState,
    transcript_scroll: usize,
    plan_scroll: usize,

    /// Lines decorated in the source pane; the current line follows the question
    marks: SourceMarks,

    pub should_quit: bool,
    pub status_message: String,
}

impl App {
    pub fn new(mut session: Session) -> Self {
        let question = session.start();
        let marks = SourceMarks {
            input_lines: session.analysis().input_lines(),
            loop_lines: session.analysis().loop_lines(),
            current_line: question.as_ref().and_then(|q| q.line),
        };
        let status_message = match &question {
            Some(_) => String::from("Type a value and press Enter"),
            None => String::from("Nothing to ask"),
        };
        App {
            should_quit: question.is_none(),
            session,
            question,
            buffer: String::new(),
            transcript: Vec::new(),
            focused_pane: FocusedPane::Source,
            source_scroll: SourceScrollState::default(),
            transcript_scroll: 0,
            plan_scroll: 0,
            marks,
            status_message,
        }
    }

    /// Run the TUI until the session completes or is cancelled
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[0]);

        // Right column: Transcript (top) | Plan (bottom)
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);

        let analysis = self.session.analysis();
        panes::render_source_pane(
            frame,
            columns[0],
            &analysis.source,
            analysis.language,
            &self.marks,
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        panes::render_transcript_pane(
            frame,
            right_rows[0],
            &self.transcript,
            self.focused_pane == FocusedPane::Transcript,
            &mut self.transcript_scroll,
        );

        panes::render_plan_pane(
            frame,
            right_rows[1],
            self.session.plan(),
            self.session.answers().len(),
            self.session.state() == SessionState::ManualEntry,
            self.focused_pane == FocusedPane::Plan,
            &mut self.plan_scroll,
        );

        panes::render_input_line(frame, main_chunks[1], self.question.as_ref(), &self.buffer);

        let (answered, total) = self.session.progress();
        panes::render_status_bar(
            frame,
            main_chunks[2],
            &self.status_message,
            answered,
            total,
            self.session.state(),
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => self.cancel(),
            KeyCode::Esc => self.cancel(),
            KeyCode::Char(c) => self.buffer.push(c),
            KeyCode::Backspace => {
                self.buffer.pop();
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Tab => self.focused_pane = self.focused_pane.next(),
            KeyCode::BackTab => self.focused_pane = self.focused_pane.prev(),
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Source => {
                    // Scrolling up makes the current line move down visually
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_add(1));
                    }
                }
                FocusedPane::Transcript => {
                    self.transcript_scroll = self.transcript_scroll.saturating_sub(1);
                }
                FocusedPane::Plan => self.plan_scroll = self.plan_scroll.saturating_sub(1),
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Source => {
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_sub(1));
                    }
                }
                FocusedPane::Transcript => {
                    self.transcript_scroll = self.transcript_scroll.saturating_add(1);
                }
                FocusedPane::Plan => self.plan_scroll = self.plan_scroll.saturating_add(1),
            },
            _ => {}
        }
    }

    fn submit(&mut self) {
        let Some(question) = self.question.take() else {
            return;
        };
        let answer = std::mem::take(&mut self.buffer);

        match self.session.submit(answer.clone()) {
            Ok(next) => {
                if !(question.manual && answer.trim().is_empty()) {
                    self.transcript.push(TranscriptEntry {
                        number: question.number,
                        prompt: question.text,
                        answer,
                        iteration: question.iteration,
                    });
                    self.transcript_scroll = usize::MAX;
                }
                self.plan_scroll = 0;
                self.marks.current_line = next.as_ref().and_then(|q| q.line);
                self.status_message = match &next {
                    Some(q) if q.manual => "Remaining values unknown; enter them one by one".to_string(),
                    Some(_) => "Answer recorded".to_string(),
                    None => "All values collected".to_string(),
                };
                self.should_quit = next.is_none();
                self.question = next;
            }
            Err(e) => {
                self.status_message = e.to_string();
                self.question = Some(question);
            }
        }
    }

    fn cancel(&mut self) {
        if let Err(e) = self.session.cancel() {
            self.status_message = e.to_string();
            return;
        }
        self.question = None;
        self.status_message = "Cancelled".to_string();
        self.should_quit = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use ratatui::backend::TestBackend;

    fn app(source: &str) -> App {
        App::new(Session::new(analyze("python", source).unwrap()))
    }

    fn type_answer(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key_event(KeyEvent::from(KeyCode::Char(c)));
        }
        app.handle_key_event(KeyEvent::from(KeyCode::Enter));
    }

    #[test]
    fn test_typing_answers_completes_session() {
        let mut app = app("n = int(input('n: '))\nfor i in range(n):\n    x = input('x: ')\n");
        type_answer(&mut app, "2");
        type_answer(&mut app, "a");
        assert!(!app.should_quit);
        type_answer(&mut app, "b");
        assert!(app.should_quit);
        assert_eq!(app.session().state(), SessionState::Completed);
        assert_eq!(app.session().answers(), ["2", "a", "b"]);
        assert_eq!(app.transcript.len(), 3);
    }

    #[test]
    fn test_backspace_edits_answer() {
        let mut app = app("a = input()\n");
        app.handle_key_event(KeyEvent::from(KeyCode::Char('1')));
        app.handle_key_event(KeyEvent::from(KeyCode::Char('2')));
        app.handle_key_event(KeyEvent::from(KeyCode::Backspace));
        app.handle_key_event(KeyEvent::from(KeyCode::Enter));
        assert_eq!(app.into_session().answers(), ["1"]);
    }

    #[test]
    fn test_escape_cancels() {
        let mut app = app("a = input()\nb = input()\n");
        type_answer(&mut app, "1");
        app.handle_key_event(KeyEvent::from(KeyCode::Esc));
        assert!(app.should_quit);
        assert_eq!(app.session().state(), SessionState::Cancelled);
    }

    #[test]
    fn test_focus_cycles() {
        let mut app = app("a = input()\n");
        app.handle_key_event(KeyEvent::from(KeyCode::Tab));
        assert_eq!(app.focused_pane, FocusedPane::Transcript);
        app.handle_key_event(KeyEvent::from(KeyCode::BackTab));
        assert_eq!(app.focused_pane, FocusedPane::Source);
    }

    #[test]
    fn test_renders_question() {
        let mut app = app("n = int(input('How many? '))\n");
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(screen.contains("How many?"));
        assert!(screen.contains("Value 1/1"));
    }
}
