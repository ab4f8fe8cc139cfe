//! Per-language recognisers for loop, input and output shapes
//!
//! Every supported language is described by one [`Grammar`] implementation.
//! The [`GrammarRegistry`] maps a [`Language`] tag to its grammar, so adding a
//! language means registering another implementation rather than extending a
//! conditional chain.
//!
//! # Grammar modules
//!
//! - [`c_family`]: C, C++, Java, JavaScript, TypeScript and PHP (brace blocks,
//!   `for (init; cond; step)` headers)
//! - [`python`]: `range()` loops and indentation blocks
//! - [`go`]: `for i := 0; ...` headers and `range` clauses
//! - [`r`]: `for (i in 1:n)` sequences and `repeat` blocks
//! - [`sql`]: no loops and no stdin
//!
//! Shared machinery lives in [`lexical`] (comment/string masking), [`blocks`]
//! (body delimitation), [`counter`] (trip counts) and [`rules`] (input and
//! output call rules).
//!
//! # Recognition model
//!
//! No grammar parses its language. Each one runs regular expressions over a
//! masked copy of the source where comments and string contents are blanked,
//! then reads literal text back from the original at the same byte offsets.

pub mod blocks;
pub mod c_family;
pub mod counter;
pub mod detect;
pub mod go;
pub mod lexical;
pub mod python;
pub mod r;
pub mod rules;
pub mod sql;

use crate::errors::AnalysisError;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Closed set of language tags accepted by the execution backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    C,
    Cpp,
    Go,
    Php,
    R,
    Sql,
}

impl Language {
    pub const ALL: [Language; 10] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Java,
        Language::C,
        Language::Cpp,
        Language::Go,
        Language::Php,
        Language::R,
        Language::Sql,
    ];

    /// Parse a tag such as `"python"` or `"cpp"`.
    pub fn from_tag(tag: &str) -> Result<Language, AnalysisError> {
        let normalized = tag.trim().to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.tag() == normalized)
            .ok_or_else(|| AnalysisError::UnsupportedLanguage(tag.to_string()))
    }

    pub fn tag(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Go => "go",
            Language::Php => "php",
            Language::R => "r",
            Language::Sql => "sql",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Byte range `[start, end)` into the submitted source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Shift a span found inside a slice back into whole-source coordinates
    pub fn offset_by(self, base: usize) -> Span {
        Span::new(self.start + base, self.end + base)
    }

    /// 1-based line number of the span start
    pub fn line(&self, source: &str) -> usize {
        let upto = self.start.min(source.len());
        source.as_bytes()[..upto].iter().filter(|&&b| b == b'\n').count() + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    /// Counter loop with an explicit bound (`for (i = 0; i < n; i++)`, `range(n)`)
    Primary,
    /// Iteration over a named collection (`for x in xs`, `foreach`)
    Enhanced,
    DoWhile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// The side of a loop that decides how often it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundExpr {
    Literal(i64),
    /// A name that an earlier input or literal assignment gives a value to
    Identifier(String),
    /// Recognised loop whose count cannot be derived from the text
    Opaque(String),
}

impl fmt::Display for BoundExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundExpr::Literal(n) => write!(f, "{}", n),
            BoundExpr::Identifier(name) => f.write_str(name),
            BoundExpr::Opaque(text) => f.write_str(text),
        }
    }
}

/// Iterations = `ceil(max(0, value(bound) + offset) / stride)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripCount {
    pub bound: BoundExpr,
    pub offset: i64,
    pub stride: u64,
}

impl TripCount {
    pub fn literal(count: i64) -> Self {
        TripCount {
            bound: BoundExpr::Literal(count),
            offset: 0,
            stride: 1,
        }
    }

    pub fn opaque(text: impl Into<String>) -> Self {
        TripCount {
            bound: BoundExpr::Opaque(text.into()),
            offset: 0,
            stride: 1,
        }
    }

    /// Iteration count once the bound's value is known
    pub fn iterations(&self, value: i64) -> u64 {
        let span = value.saturating_add(self.offset).max(0) as u64;
        let stride = self.stride.max(1);
        span.div_ceil(stride)
    }
}

/// A loop found in source text
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSignature {
    pub kind: LoopKind,
    pub trip: TripCount,
    pub direction: Direction,
    /// Counter or element variable, when the header names one
    pub variable: Option<String>,
    /// Collection iterated by an enhanced loop
    pub collection: Option<String>,
    pub header: Span,
    /// `None` when the body could not be delimited
    pub body: Option<Span>,
}

impl LoopSignature {
    /// The bound as written in source: a literal, a name, or the raw expression
    pub fn bound_expression(&self) -> String {
        self.trip.bound.to_string()
    }

    pub(crate) fn offset_by(mut self, base: usize) -> LoopSignature {
        self.header = self.header.offset_by(base);
        self.body = self.body.map(|b| b.offset_by(base));
        self
    }
}

/// One stdin value consumed by the program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSite {
    pub span: Span,
    /// Variable receiving the value, used to bind loop bounds by name
    pub target: Option<String>,
    /// Literal prompt passed to the input call itself (`input("Name: ")`)
    pub inline_prompt: Option<String>,
    pub inside_loop: bool,
    pub inside_nested: bool,
    pub ordinal_within_loop_body: Option<usize>,
}

impl InputSite {
    pub fn new(span: Span, target: Option<String>, inline_prompt: Option<String>) -> Self {
        InputSite {
            span,
            target,
            inline_prompt,
            inside_loop: false,
            inside_nested: false,
            ordinal_within_loop_body: None,
        }
    }
}

/// A print/echo/write statement; `literal` is set only when its sole argument
/// is a string literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputStatement {
    pub span: Span,
    pub literal: Option<String>,
}

/// `name = <integer>` assignment; `at` is the byte offset of the name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralBinding {
    pub name: String,
    pub value: i64,
    pub at: usize,
}

/// Capability interface every language grammar implements.
///
/// The `_from` finders only report loops whose header starts at or after
/// `from`. The whole source is still scanned so declarations ahead of `from`
/// stay visible.
pub trait Grammar: Send + Sync {
    fn language(&self) -> Language;

    /// First counter loop whose header yields a consistent trip count
    fn find_primary_loop_from(&self, source: &str, from: usize) -> Option<LoopSignature>;

    fn find_enhanced_loop_from(&self, source: &str, from: usize) -> Option<LoopSignature>;

    fn find_do_while_from(&self, source: &str, from: usize) -> Option<LoopSignature>;

    fn find_primary_loop(&self, source: &str) -> Option<LoopSignature> {
        self.find_primary_loop_from(source, 0)
    }

    fn find_enhanced_loop(&self, source: &str) -> Option<LoopSignature> {
        self.find_enhanced_loop_from(source, 0)
    }

    fn find_do_while(&self, source: &str) -> Option<LoopSignature> {
        self.find_do_while_from(source, 0)
    }

    /// Top-level loops in priority order: every primary loop, then every
    /// enhanced loop, then every do-while. Loops inside an earlier match's
    /// body are not reported.
    fn find_loop_candidates(&self, source: &str) -> Vec<LoopSignature> {
        let mut found = successive(|from| self.find_primary_loop_from(source, from));
        found.extend(successive(|from| self.find_enhanced_loop_from(source, from)));
        found.extend(successive(|from| self.find_do_while_from(source, from)));
        found
    }

    /// Second-level loop inside `body`; spans are relative to `body`.
    fn find_nested_loop(&self, body: &str) -> Option<LoopSignature> {
        self.find_primary_loop(body)
            .or_else(|| self.find_enhanced_loop(body))
            .or_else(|| self.find_do_while(body))
    }

    /// Input sites in source order
    fn find_input_sites(&self, source: &str) -> Vec<InputSite>;

    /// Output statements in source order
    fn find_output_statements(&self, source: &str) -> Vec<OutputStatement>;

    /// `name = <integer>` assignments in source order
    fn find_literal_bindings(&self, source: &str) -> Vec<LiteralBinding>;
}

/// Repeat a finder, resuming past each match's body
fn successive(find: impl Fn(usize) -> Option<LoopSignature>) -> Vec<LoopSignature> {
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(signature) = find(from) {
        let next = signature
            .body
            .map_or(signature.header.end, |b| b.end.max(signature.header.end));
        found.push(signature);
        if next <= from {
            break;
        }
        from = next;
    }
    found
}

/// Compile a grammar pattern; patterns are fixed strings so failure is a bug.
pub(crate) fn pattern(src: &str) -> Regex {
    Regex::new(src).unwrap_or_else(|e| panic!("invalid grammar pattern {:?}: {}", src, e))
}

/// Lookup table from language to grammar
pub struct GrammarRegistry {
    grammars: FxHashMap<Language, Box<dyn Grammar>>,
}

impl GrammarRegistry {
    /// An empty registry; see [`GrammarRegistry::standard`] for the built-in set.
    pub fn new() -> Self {
        GrammarRegistry {
            grammars: FxHashMap::default(),
        }
    }

    /// Registry with a grammar for every [`Language`]
    pub fn standard() -> Self {
        let mut registry = GrammarRegistry::new();
        registry.register(Box::new(python::PythonGrammar::new()));
        registry.register(Box::new(c_family::BraceGrammar::javascript()));
        registry.register(Box::new(c_family::BraceGrammar::typescript()));
        registry.register(Box::new(c_family::BraceGrammar::java()));
        registry.register(Box::new(c_family::BraceGrammar::c()));
        registry.register(Box::new(c_family::BraceGrammar::cpp()));
        registry.register(Box::new(go::GoGrammar::new()));
        registry.register(Box::new(c_family::BraceGrammar::php()));
        registry.register(Box::new(r::RGrammar::new()));
        registry.register(Box::new(sql::SqlGrammar::new()));
        registry
    }

    /// Process-wide standard registry, built on first use
    pub fn shared() -> &'static GrammarRegistry {
        static SHARED: OnceLock<GrammarRegistry> = OnceLock::new();
        SHARED.get_or_init(GrammarRegistry::standard)
    }

    /// Add or replace the grammar for its language
    pub fn register(&mut self, grammar: Box<dyn Grammar>) {
        self.grammars.insert(grammar.language(), grammar);
    }

    pub fn supports(&self, tag: &str) -> bool {
        Language::from_tag(tag)
            .map(|lang| self.grammars.contains_key(&lang))
            .unwrap_or(false)
    }

    /// Grammar for a tag, or [`AnalysisError::UnsupportedLanguage`]
    pub fn lookup(&self, tag: &str) -> Result<&dyn Grammar, AnalysisError> {
        let language = Language::from_tag(tag)?;
        self.grammar(language)
            .ok_or_else(|| AnalysisError::UnsupportedLanguage(tag.to_string()))
    }

    pub fn grammar(&self, language: Language) -> Option<&dyn Grammar> {
        self.grammars.get(&language).map(|g| g.as_ref())
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_language_registered() {
        let registry = GrammarRegistry::standard();
        for lang in Language::ALL {
            let grammar = registry.lookup(lang.tag()).expect("grammar registered");
            assert_eq!(grammar.language(), lang);
        }
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let registry = GrammarRegistry::standard();
        assert!(!registry.supports("cobol"));
        match registry.lookup("cobol") {
            Err(AnalysisError::UnsupportedLanguage(tag)) => assert_eq!(tag, "cobol"),
            _ => panic!("Expected UnsupportedLanguage"),
        }
    }

    #[test]
    fn test_tag_is_case_insensitive() {
        assert_eq!(Language::from_tag("Python").unwrap(), Language::Python);
        assert_eq!(Language::from_tag(" CPP ").unwrap(), Language::Cpp);
    }

    #[test]
    fn test_empty_registry_rejects_known_tag() {
        let registry = GrammarRegistry::new();
        assert!(registry.lookup("python").is_err());
    }

    #[test]
    fn test_trip_count_iterations() {
        let trip = TripCount {
            bound: BoundExpr::Identifier("n".into()),
            offset: 1,
            stride: 2,
        };
        assert_eq!(trip.iterations(5), 3);
        assert_eq!(trip.iterations(-4), 0);
        assert_eq!(TripCount::literal(4).iterations(4), 4);
    }

    #[test]
    fn test_span_line() {
        let source = "a\nb\nc";
        assert_eq!(Span::new(0, 1).line(source), 1);
        assert_eq!(Span::new(4, 5).line(source), 3);
    }
}
