//! Terminal front-ends built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! - **[`app`]**: full-screen session with source, transcript and plan panes
//! - **[`panes`]**: stateless render functions for each visible pane
//! - **[`plain`]**: one prompt per line on stdin/stdout, also used for piped input
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! [`App`] takes ownership of a [`Session`](crate::session::Session) and hands
//! it back with [`App::into_session`] once the event loop ends.

pub mod app;
pub mod panes;
pub mod plain;
pub mod theme;

pub use app::App;
pub use plain::LineAnswers;
