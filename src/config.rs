//! Command-line configuration
//!
//! ```text
//! runprompt <file> [--lang <tag>] [--plain] [--log <path>]
//! ```

use crate::errors::AnalysisError;
use crate::grammar::detect::{detect, from_extension};
use crate::grammar::Language;
use std::fmt;
use std::path::PathBuf;

/// Environment variable holding the tracing filter directives
pub const LOG_ENV: &str = "RUNPROMPT_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub path: PathBuf,
    /// Explicit language tag; detected from the file when absent
    pub language: Option<String>,
    /// Line-oriented prompts on stdin/stdout instead of the TUI
    pub plain: bool,
    pub log: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingFile,
    MissingValue(String),
    UnknownFlag(String),
    HelpRequested,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingFile => write!(f, "No input file provided"),
            ConfigError::MissingValue(flag) => write!(f, "Flag '{}' needs a value", flag),
            ConfigError::UnknownFlag(flag) => write!(f, "Unknown flag '{}'", flag),
            ConfigError::HelpRequested => write!(f, "Help requested"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Parse arguments, excluding the program name
    pub fn from_args<I>(args: I) -> Result<Config, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mut path = None;
        let mut language = None;
        let mut plain = false;
        let mut log = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Err(ConfigError::HelpRequested),
                "--plain" => plain = true,
                "-l" | "--lang" => language = Some(flag_value(&mut args, &arg)?),
                "--log" => log = Some(PathBuf::from(flag_value(&mut args, &arg)?)),
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    return Err(ConfigError::UnknownFlag(flag.to_string()));
                }
                other if path.is_none() => path = Some(PathBuf::from(other)),
                other => return Err(ConfigError::UnknownFlag(other.to_string())),
            }
        }

        Ok(Config {
            path: path.ok_or(ConfigError::MissingFile)?,
            language,
            plain,
            log,
        })
    }

    /// Explicit tag first, then the file extension, then the content
    pub fn resolve_language(&self, source: &str) -> Result<Language, AnalysisError> {
        if let Some(tag) = &self.language {
            return Language::from_tag(tag);
        }
        if let Some(language) = from_extension(&self.path) {
            return Ok(language);
        }
        detect(source)
            .map(|found| found.language)
            .ok_or_else(|| AnalysisError::UnsupportedLanguage(self.path.display().to_string()))
    }
}

fn flag_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, ConfigError> {
    args.next().ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}

pub fn usage(program: &str) -> String {
    let tags: Vec<&str> = Language::ALL.iter().map(|l| l.tag()).collect();
    format!(
        "Usage: {program} <file> [--lang <tag>] [--plain] [--log <path>]\n\
         \n\
         Options:\n\
         \x20 -l, --lang <tag>   Source language ({})\n\
         \x20     --plain        Ask for values line by line instead of the TUI\n\
         \x20     --log <path>   Write logs to a file (filter with {LOG_ENV})\n\
         \x20 -h, --help         Show this message\n\
         \n\
         Examples:\n\
         \x20 {program} sum.py\n\
         \x20 {program} Main.txt --lang java --plain",
        tags.join(", ")
    )
}
