//! TUI pane rendering modules
//!
//! Each pane module exports a `render_*` function plus any state it keeps
//! between frames.
//!
//! - [`source`]: the program with input and loop lines marked
//! - [`transcript`]: answered questions
//! - [`plan`]: upcoming questions and how the plan ends
//! - [`input`]: the outstanding question and the answer being typed
//! - [`status`]: progress and keybindings

pub mod input;
pub mod plan;
pub mod source;
pub mod status;
pub mod transcript;

pub use input::render_input_line;
pub use plan::render_plan_pane;
pub use source::{render_source_pane, SourceMarks, SourceScrollState};
pub use status::render_status_bar;
pub use transcript::{render_transcript_pane, TranscriptEntry};
