//! Error types that reach callers
//!
//! Structural uncertainty never shows up here: ambiguous loops degrade to the
//! manual collection path and unresolvable prompts get placeholder text. Only
//! an unsupported language tag, a cancelled session and misuse of a finished
//! session are reported.

use crate::session::SessionState;
use std::fmt;

/// Errors raised before any analysis happens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Tag is not in the registry
    UnsupportedLanguage(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::UnsupportedLanguage(tag) => {
                write!(f, "Unsupported language '{}'", tag)
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Errors from driving an interactive session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The user aborted while a question was outstanding (benign, not a failure)
    UserCancelled,

    /// An answer arrived while no question was outstanding
    NotAwaiting { state: SessionState },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::UserCancelled => write!(f, "Run cancelled by user"),
            SessionError::NotAwaiting { state } => {
                write!(f, "Session is not waiting for an answer (state: {:?})", state)
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Errors from handing a session to the execution collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The session was cancelled; nothing is sent
    Cancelled,

    /// The session still has questions outstanding
    NotCompleted { state: SessionState },

    /// The collaborator failed
    Executor(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Cancelled => write!(f, "Run was cancelled; nothing dispatched"),
            DispatchError::NotCompleted { state } => {
                write!(f, "Cannot dispatch an unfinished session (state: {:?})", state)
            }
            DispatchError::Executor(message) => write!(f, "Execution failed: {}", message),
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<SessionError> for DispatchError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UserCancelled => DispatchError::Cancelled,
            SessionError::NotAwaiting { state } => DispatchError::NotCompleted { state },
        }
    }
}
