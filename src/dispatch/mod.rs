//! Hand-off to the execution collaborator
//!
//! Only a completed session becomes an [`ExecutionRequest`]. The wire shapes
//! use the field names the execution backend expects.

use crate::errors::DispatchError;
use crate::grammar::Language;
use crate::session::{Session, SessionState};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub code: String,
    pub language: Language,
    /// One entry per value, in consumption order
    pub inputs: Vec<String>,
}

impl ExecutionRequest {
    pub fn from_session(session: &Session) -> Result<Self, DispatchError> {
        match session.state() {
            SessionState::Completed => Ok(ExecutionRequest {
                code: session.analysis().source.clone(),
                language: session.analysis().language,
                inputs: session.answers().to_vec(),
            }),
            SessionState::Cancelled => Err(DispatchError::Cancelled),
            state => Err(DispatchError::NotCompleted { state }),
        }
    }

    /// The inputs as a stdin stream, one value per line
    pub fn stdin(&self) -> String {
        self.inputs.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub line_number: usize,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    pub succeeded: bool,
    #[serde(default)]
    pub standard_output: String,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs a request somewhere else
pub trait Executor {
    fn execute(&mut self, request: &ExecutionRequest) -> Result<ExecutionResponse, DispatchError>;
}

/// Send a finished session to `executor`. Cancelled and unfinished sessions
/// never reach it.
pub fn submit(session: &Session, executor: &mut dyn Executor) -> Result<ExecutionResponse, DispatchError> {
    let request = ExecutionRequest::from_session(session)?;
    info!(
        language = %request.language,
        inputs = request.inputs.len(),
        "dispatching run"
    );
    executor.execute(&request)
}
