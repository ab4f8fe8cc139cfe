//! Interactive collection session
//!
//! A [`Session`] asks for one value at a time. After every answer the demand
//! plan is recomputed from the full answer history, so questions appear as
//! loop bounds become known:
//!
//! ```text
//! Idle → AwaitingAnswer ⟲ → Completed
//!                  ↘ ManualEntry ⟲ → Completed
//! any non-terminal state → Cancelled
//! ```
//!
//! [`ManualEntry`](SessionState::ManualEntry) is entered when the plan is
//! open-ended; each further value is asked for as `"Value N"` until an empty
//! answer ends the run.

use crate::analysis::constants::MANUAL_PREFIX;
use crate::analysis::demand::{DemandPlan, Iteration, PlanStatus};
use crate::analysis::Analysis;
use crate::errors::SessionError;
use std::collections::VecDeque;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingAnswer,
    ManualEntry,
    Completed,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Cancelled)
    }
}

/// The single outstanding question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// 1-based position in the answer list
    pub number: usize,
    pub text: String,
    pub iteration: Option<Iteration>,
    /// Asked in manual entry, where an empty answer finishes the run
    pub manual: bool,
    /// 1-based source line of the input site, when known
    pub line: Option<usize>,
}

pub struct Session {
    analysis: Analysis,
    answers: Vec<String>,
    plan: DemandPlan,
    state: SessionState,
}

impl Session {
    pub fn new(analysis: Analysis) -> Self {
        let plan = analysis.plan(&[]);
        Session {
            analysis,
            answers: Vec::new(),
            plan,
            state: SessionState::Idle,
        }
    }

    /// Ask the first question. A session with nothing to ask completes
    /// immediately and returns `None`.
    pub fn start(&mut self) -> Option<Question> {
        if self.state == SessionState::Idle {
            info!(
                sites = self.analysis.prompts.len(),
                planned = self.plan.len(),
                "session started"
            );
            self.advance();
        }
        self.current_question()
    }

    /// Record an answer and return the next question, if any
    pub fn submit(&mut self, value: impl Into<String>) -> Result<Option<Question>, SessionError> {
        let value = value.into();
        match self.state {
            SessionState::AwaitingAnswer => {
                self.answers.push(value);
                self.advance();
            }
            SessionState::ManualEntry if value.trim().is_empty() => {
                self.transition(SessionState::Completed);
            }
            SessionState::ManualEntry => {
                // Values past the plan's end never feed back into it
                self.answers.push(value);
            }
            state => return Err(SessionError::NotAwaiting { state }),
        }
        Ok(self.current_question())
    }

    /// Abort the run and discard every answer
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        if self.state.is_terminal() {
            return Err(SessionError::NotAwaiting { state: self.state });
        }
        self.answers.clear();
        self.transition(SessionState::Cancelled);
        Ok(())
    }

    pub fn current_question(&self) -> Option<Question> {
        let number = self.answers.len() + 1;
        match self.state {
            SessionState::AwaitingAnswer => {
                let slot = self.plan.slots.get(self.answers.len())?;
                Some(Question {
                    number,
                    text: slot.prompt.text.clone(),
                    iteration: slot.iteration,
                    manual: false,
                    line: Some(slot.prompt.site.span.line(&self.analysis.source)),
                })
            }
            SessionState::ManualEntry => Some(Question {
                number,
                text: format!("{} {}", MANUAL_PREFIX, number),
                iteration: None,
                manual: true,
                line: None,
            }),
            _ => None,
        }
    }

    /// Answers so far, in consumption order
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn plan(&self) -> &DemandPlan {
        &self.plan
    }

    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    /// Answered count and the total when it is known
    pub fn progress(&self) -> (usize, Option<usize>) {
        let total = match (&self.plan.status, self.state) {
            (_, SessionState::ManualEntry) => None,
            (PlanStatus::Complete, _) => Some(self.plan.len()),
            _ => None,
        };
        (self.answers.len(), total)
    }

    fn advance(&mut self) {
        self.plan = self.analysis.plan(&self.answers);
        let next = if self.answers.len() < self.plan.len() {
            SessionState::AwaitingAnswer
        } else if self.plan.is_complete() {
            SessionState::Completed
        } else {
            SessionState::ManualEntry
        };
        self.transition(next);
    }

    fn transition(&mut self, next: SessionState) {
        if next != self.state {
            info!(from = ?self.state, to = ?next, answers = self.answers.len(), "session state changed");
            self.state = next;
        }
    }
}

/// What an [`AnswerSource`] does with a question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Value(String),
    Cancel,
}

/// Supplies answers to a session one question at a time
pub trait AnswerSource {
    fn answer(&mut self, question: &Question) -> Reply;
}

/// Canned answers, mostly for tests and batch runs.
///
/// Once exhausted it finishes manual entry with an empty answer and cancels
/// any other question.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAnswers {
    queue: VecDeque<String>,
}

impl ScriptedAnswers {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedAnswers {
            queue: answers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl AnswerSource for ScriptedAnswers {
    fn answer(&mut self, question: &Question) -> Reply {
        match self.queue.pop_front() {
            Some(value) => Reply::Value(value),
            None if question.manual => Reply::Value(String::new()),
            None => Reply::Cancel,
        }
    }
}

/// Run `session` to the end against `source`
pub fn drive(session: &mut Session, source: &mut dyn AnswerSource) -> Result<Vec<String>, SessionError> {
    let mut question = session.start();
    while let Some(q) = question {
        question = match source.answer(&q) {
            Reply::Value(value) => session.submit(value)?,
            Reply::Cancel => {
                session.cancel()?;
                return Err(SessionError::UserCancelled);
            }
        };
    }
    match session.state() {
        SessionState::Completed => Ok(session.answers().to_vec()),
        _ => Err(SessionError::UserCancelled),
    }
}
