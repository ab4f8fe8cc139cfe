// End-to-end collection: analysis, session and dispatch

use runprompt::analysis::analyze;
use runprompt::dispatch::{submit, ExecutionRequest, ExecutionResponse, Executor};
use runprompt::errors::{DispatchError, SessionError};
use runprompt::grammar::Language;
use runprompt::session::{drive, AnswerSource, Question, Reply, ScriptedAnswers, Session, SessionState};
use std::fs;

fn demo_session(file: &str, tag: &str) -> Session {
    let source = fs::read_to_string(format!("demos/{}", file)).expect("Failed to read demo file");
    Session::new(analyze(tag, &source).expect("Analysis failed"))
}

/// Counts calls and echoes the inputs back as output
#[derive(Default)]
struct EchoExecutor {
    calls: usize,
}

impl Executor for EchoExecutor {
    fn execute(&mut self, request: &ExecutionRequest) -> Result<ExecutionResponse, DispatchError> {
        self.calls += 1;
        Ok(ExecutionResponse {
            succeeded: true,
            standard_output: request.stdin(),
            diagnostics: Vec::new(),
        })
    }
}

/// Cancels at a chosen question number, answering "3" before that
struct CancelAt(usize);

impl AnswerSource for CancelAt {
    fn answer(&mut self, question: &Question) -> Reply {
        if question.number == self.0 {
            Reply::Cancel
        } else {
            Reply::Value("3".to_string())
        }
    }
}

#[test]
fn test_java_scenario_end_to_end() {
    let mut session = demo_session("Names.java", "java");
    let mut seen = Vec::new();
    let mut question = session.start();
    let mut replies = ["3", "Ada", "Grace", "Linus"].into_iter();
    while let Some(q) = question {
        seen.push(q.text.clone());
        question = session.submit(replies.next().expect("enough answers")).unwrap();
    }
    assert_eq!(
        seen,
        ["How many names? ", "Enter name: ", "Enter name: ", "Enter name: "]
    );

    let mut executor = EchoExecutor::default();
    let response = submit(&session, &mut executor).unwrap();
    assert_eq!(executor.calls, 1);
    assert_eq!(response.standard_output, "3\nAda\nGrace\nLinus");
}

#[test]
fn test_cancel_at_any_question_never_dispatches() {
    for at in 1..=4 {
        let mut session = demo_session("sum.c", "c");
        let result = drive(&mut session, &mut CancelAt(at));
        assert_eq!(result, Err(SessionError::UserCancelled));
        assert_eq!(session.state(), SessionState::Cancelled);

        let mut executor = EchoExecutor::default();
        assert_eq!(submit(&session, &mut executor), Err(DispatchError::Cancelled));
        assert_eq!(executor.calls, 0);
    }
}

#[test]
fn test_progress_reports_known_total() {
    let mut session = demo_session("countdown.py", "python");
    session.start();
    assert_eq!(session.progress(), (0, None));
    session.submit("2").unwrap();
    assert_eq!(session.progress(), (1, Some(3)));
}

#[test]
fn test_manual_entry_collects_until_empty() {
    let mut session = demo_session("validate.c", "c");
    let answers = drive(&mut session, &mut ScriptedAnswers::new(["-1", "0", "4"])).unwrap();
    assert_eq!(answers, ["-1", "0", "4"]);
    assert_eq!(session.state(), SessionState::Completed);
}

#[test]
fn test_request_serialises_for_backend() {
    let mut session = demo_session("greet.r", "r");
    drive(&mut session, &mut ScriptedAnswers::new(["1", "Ada"])).unwrap();

    let request = ExecutionRequest::from_session(&session).unwrap();
    assert_eq!(request.language, Language::R);
    let json: serde_json::Value = serde_json::to_value(&request).unwrap();
    assert_eq!(json["language"], "r");
    assert_eq!(json["inputs"], serde_json::json!(["1", "Ada"]));
    assert!(json["code"].as_str().unwrap().contains("readline"));
}

#[test]
fn test_program_without_input_completes_at_once() {
    let mut session = demo_session("report.sql", "sql");
    assert_eq!(drive(&mut session, &mut ScriptedAnswers::default()), Ok(Vec::new()));
    assert!(ExecutionRequest::from_session(&session).unwrap().inputs.is_empty());
}
