//! Go: three-clause `for` headers without parentheses and `range` clauses

use super::blocks::braced;
use super::counter::{c_style_header, collection_size, collection_trip, linear};
use super::lexical::{assignment_target, Lexicon};
use super::rules::{collect_outputs, collect_sites, literal_bindings, InputRule, OutputRule, Target};
use super::{
    pattern, BoundExpr, Direction, Grammar, InputSite, Language, LiteralBinding, LoopKind,
    LoopSignature, OutputStatement, Span, TripCount,
};
use regex::Regex;
use tracing::debug;

#[derive(Debug)]
pub struct GoGrammar {
    header: Regex,
    range: Regex,
    inputs: Vec<InputRule>,
    outputs: Vec<OutputRule>,
}

impl GoGrammar {
    pub fn new() -> Self {
        GoGrammar {
            header: pattern(r"\bfor\s+([^{;\n]*;[^{;\n]*;[^{\n]*?)\s*\{"),
            range: pattern(
                r"\bfor\s+(?:(?P<key>\w+)\s*(?:,\s*(?P<value>\w+)\s*)?:?=\s*)?range\s+(?P<coll>[^{\n]+?)\s*\{",
            ),
            inputs: vec![
                InputRule::destinations(r"\bfmt\.Scan(?:ln)?\s*\(", 0),
                InputRule::destinations(r"\bfmt\.Scanf\s*\(", 1),
                InputRule::destinations(r"\bfmt\.Fscan(?:ln)?\s*\(", 1),
                InputRule::destinations(r"\bfmt\.Fscanf\s*\(", 2),
                InputRule::call(r"\b\w+\.ReadString\s*\(", Target::Assigned, None),
                InputRule::call(r"\b\w+\.Scan\s*\(", Target::Assigned, None),
            ],
            outputs: vec![OutputRule::new(r"\bfmt\.Print(?:ln|f)?\s*\(")],
        }
    }

    /// `range n` over an integer (Go 1.22) versus a collection
    fn range_trip(&self, masked: &str, source: &str, collection: &str) -> TripCount {
        if let Some(size) = linear(collection) {
            if size.var.is_none() {
                return TripCount::literal(size.constant);
            }
            let name = size.var.as_deref().unwrap_or_default();
            let counted_by_input = self
                .find_input_sites(source)
                .iter()
                .any(|site| site.target.as_deref() == Some(name));
            let bound_literal = literal_bindings(masked).iter().any(|b| b.name == name);
            let declared = collection_size(masked, name);
            if declared.is_none() && (counted_by_input || bound_literal) {
                return TripCount {
                    bound: BoundExpr::Identifier(name.to_string()),
                    offset: size.constant,
                    stride: 1,
                };
            }
        }
        collection_trip(masked, collection)
    }
}

impl Default for GoGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar for GoGrammar {
    fn language(&self) -> Language {
        Language::Go
    }

    fn find_primary_loop_from(&self, source: &str, from: usize) -> Option<LoopSignature> {
        let masked = Lexicon::GO.mask(source);
        let mut resume = from;

        for caps in self.header.captures_iter(&masked) {
            let (Some(whole), Some(clauses)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() < resume {
                continue;
            }
            let open = whole.end() - 1;
            let body = braced(&masked, open);
            match c_style_header(clauses.as_str()) {
                Some(counter) => {
                    return Some(LoopSignature {
                        kind: LoopKind::Primary,
                        trip: counter.trip,
                        direction: counter.direction,
                        variable: Some(counter.variable),
                        collection: None,
                        header: Span::new(whole.start(), whole.end()),
                        body,
                    });
                }
                None => {
                    debug!(header = clauses.as_str(), "skipping ambiguous counter header");
                    resume = body.map_or(whole.end(), |b| b.end);
                }
            }
        }
        None
    }

    fn find_enhanced_loop_from(&self, source: &str, from: usize) -> Option<LoopSignature> {
        let masked = Lexicon::GO.mask(source);
        let caps = self
            .range
            .captures_iter(&masked)
            .find(|caps| caps.get(0).is_some_and(|m| m.start() >= from))?;
        let whole = caps.get(0)?;
        let collection = caps["coll"].trim().to_string();
        let variable = caps
            .name("value")
            .or_else(|| caps.name("key"))
            .map(|m| m.as_str().to_string());

        Some(LoopSignature {
            kind: LoopKind::Enhanced,
            trip: self.range_trip(&masked, source, &collection),
            direction: Direction::Ascending,
            variable,
            collection: Some(collection),
            header: Span::new(whole.start(), whole.end()),
            body: braced(&masked, whole.end() - 1),
        })
    }

    fn find_do_while_from(&self, _source: &str, _from: usize) -> Option<LoopSignature> {
        None
    }

    fn find_input_sites(&self, source: &str) -> Vec<InputSite> {
        let masked = Lexicon::GO.mask(source);
        let mut sites = collect_sites(source, &masked, &self.inputs, "");
        // `for scanner.Scan() {` reads one line per iteration; the text comes
        // from `scanner.Text()` afterwards
        for site in sites.iter_mut().filter(|s| s.target.is_none()) {
            let text_call = format!("{}.Text()", receiver(&masked, site.span));
            if let Some(at) = masked[site.span.end..].find(&text_call) {
                site.target = assignment_target(&masked, site.span.end + at);
            }
        }
        sites
    }

    fn find_output_statements(&self, source: &str) -> Vec<OutputStatement> {
        let masked = Lexicon::GO.mask(source);
        collect_outputs(source, &masked, &self.outputs, "")
    }

    fn find_literal_bindings(&self, source: &str) -> Vec<LiteralBinding> {
        literal_bindings(&Lexicon::GO.mask(source))
    }
}

fn receiver(masked: &str, call: Span) -> &str {
    let text = &masked[call.start..call.end];
    text.split('.').next().unwrap_or_default()
}
