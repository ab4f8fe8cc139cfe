//! Input demand analysis
//!
//! [`analyze`] turns a source text into an [`Analysis`]: the loop structure,
//! the input sites and one prompt per site. Plans are then computed on demand
//! from an answer history with [`Analysis::plan`].

pub mod constants;
pub mod demand;
pub mod extractor;
pub mod prompts;

use crate::errors::AnalysisError;
use crate::grammar::{GrammarRegistry, Language};
use demand::{DemandCalculator, DemandPlan};
use extractor::Structure;
use prompts::PromptRecord;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Analysis {
    pub language: Language,
    pub source: String,
    pub structure: Structure,
    /// Parallel to `structure.sites`
    pub prompts: Vec<PromptRecord>,
}

impl Analysis {
    pub fn demand(&self) -> DemandCalculator<'_> {
        DemandCalculator::new(&self.structure, &self.prompts)
    }

    pub fn plan(&self, answers: &[String]) -> DemandPlan {
        self.demand().plan(answers)
    }

    /// 1-based source lines holding an input site
    pub fn input_lines(&self) -> Vec<usize> {
        let mut lines: Vec<usize> = self
            .structure
            .sites
            .iter()
            .map(|s| s.span.line(&self.source))
            .collect();
        lines.dedup();
        lines
    }

    /// 1-based line range covered by the top-level loop, header included
    pub fn loop_lines(&self) -> Option<(usize, usize)> {
        let top = self.structure.top_loop.as_ref()?;
        let end = top.body.map_or(top.header.end, |b| b.end.max(top.header.end));
        let last = self.source[..end.min(self.source.len())].lines().count().max(1);
        Some((top.header.line(&self.source), last))
    }
}

/// Analyse `source` with the standard grammars
pub fn analyze(tag: &str, source: &str) -> Result<Analysis, AnalysisError> {
    analyze_with(GrammarRegistry::shared(), tag, source)
}

pub fn analyze_with(
    registry: &GrammarRegistry,
    tag: &str,
    source: &str,
) -> Result<Analysis, AnalysisError> {
    let grammar = registry.lookup(tag)?;
    let structure = extractor::extract(grammar, source);
    let outputs = grammar.find_output_statements(source);
    let prompts = prompts::resolve(&structure.sites, &outputs);

    info!(
        language = %grammar.language(),
        sites = structure.sites.len(),
        has_loop = structure.top_loop.is_some(),
        "source analysed"
    );

    Ok(Analysis {
        language: grammar.language(),
        source: source.to_string(),
        structure,
        prompts,
    })
}
