//! # Introduction
//!
//! runprompt works out, before a program runs, how many standard-input values
//! it will read and what to ask for each one. The program itself runs on a
//! remote backend with no interactive terminal, so every value has to be
//! collected up front.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Grammar → Structure → Prompts → Demand plan ⟲ Session → ExecutionRequest
//! ```
//!
//! 1. [`grammar`]: pattern-based recognisers per language for loops, input
//!    calls and output statements, behind one [`grammar::Grammar`] trait.
//! 2. [`analysis`]: extracts the loop structure, resolves prompt text and
//!    computes a [`analysis::demand::DemandPlan`] from the answers given so far.
//! 3. [`session`]: asks one question at a time, recomputing the plan after
//!    each answer, with a manual fallback when the count cannot be known.
//! 4. [`dispatch`]: turns a completed session into the request sent to the
//!    execution backend.
//! 5. [`ui`]: ratatui front-end and a line-mode fallback; not part of the
//!    stable library API.
//!
//! ## Example
//!
//! ```
//! use runprompt::analysis::analyze;
//! use runprompt::session::{drive, ScriptedAnswers, Session};
//!
//! let source = "n = int(input('How many? '))\nfor i in range(n):\n    input('Name: ')\n";
//! let mut session = Session::new(analyze("python", source).unwrap());
//! let answers = drive(&mut session, &mut ScriptedAnswers::new(["2", "Ada", "Alan"])).unwrap();
//! assert_eq!(answers, ["2", "Ada", "Alan"]);
//! ```

pub mod analysis;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod grammar;
pub mod session;
pub mod ui;
