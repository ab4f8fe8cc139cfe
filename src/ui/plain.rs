//! Line-oriented prompting for terminals without the TUI (or piped input)

use crate::session::{AnswerSource, Question, Reply};
use crate::ui::panes::transcript::iteration_label;
use std::io::{self, BufRead, Write};
use tracing::warn;

/// Typing this instead of a value cancels the run
pub const CANCEL_COMMAND: &str = ":q";

/// Reads one answer per line from `input`, writing each prompt to `output`.
/// End of input cancels.
pub struct LineAnswers<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineAnswers<R, W> {
    pub fn new(input: R, output: W) -> Self {
        LineAnswers { input, output }
    }

    fn ask(&mut self, question: &Question) -> io::Result<Option<String>> {
        let label = iteration_label(question.iteration);
        if question.manual {
            write!(self.output, "{} (empty line to finish): ", question.text)?;
        } else if label.is_empty() {
            write!(self.output, "{}", question.text)?;
        } else {
            write!(self.output, "{} {}", label, question.text)?;
        }
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl LineAnswers<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        LineAnswers::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> AnswerSource for LineAnswers<R, W> {
    fn answer(&mut self, question: &Question) -> Reply {
        match self.ask(question) {
            Ok(Some(line)) if line.trim() == CANCEL_COMMAND => Reply::Cancel,
            Ok(Some(line)) => Reply::Value(line),
            Ok(None) => Reply::Cancel,
            Err(e) => {
                warn!(error = %e, "could not read answer");
                Reply::Cancel
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::session::{drive, Session, SessionState};
    use std::io::Cursor;

    fn run(source: &str, typed: &str) -> (Result<Vec<String>, crate::errors::SessionError>, String, SessionState) {
        let mut session = Session::new(analyze("python", source).unwrap());
        let mut output = Vec::new();
        let result = {
            let mut answers = LineAnswers::new(Cursor::new(typed.as_bytes()), &mut output);
            drive(&mut session, &mut answers)
        };
        (result, String::from_utf8(output).unwrap(), session.state())
    }

    #[test]
    fn test_prompts_and_answers() {
        let (result, shown, state) = run(
            "n = int(input('n: '))\nfor i in range(n):\n    x = input('x: ')\n",
            "2\r\nfirst\nsecond\n",
        );
        assert_eq!(result.unwrap(), ["2", "first", "second"]);
        assert_eq!(shown, "n: [i=0] x: [i=1] x: ");
        assert_eq!(state, SessionState::Completed);
    }

    #[test]
    fn test_end_of_input_cancels() {
        let (result, _, state) = run("a = input()\nb = input()\n", "1\n");
        assert!(result.is_err());
        assert_eq!(state, SessionState::Cancelled);
    }

    #[test]
    fn test_cancel_command() {
        let (result, _, state) = run("a = input()\n", ":q\n");
        assert!(result.is_err());
        assert_eq!(state, SessionState::Cancelled);
    }

    #[test]
    fn test_manual_entry_finishes_on_empty_line() {
        let (result, shown, _) = run("for line in sys.stdin:\n    v = input()\n", "a\nb\n\n");
        assert_eq!(result.unwrap(), ["a", "b"]);
        assert!(shown.starts_with("Value 1 (empty line to finish): "));
    }
}
