//! Python: `for ... in range(...)` counters, `for x in xs` iteration and
//! indentation-delimited bodies

use super::blocks::indented;
use super::counter::{collection_trip, python_range};
use super::lexical::{matching_close, Lexicon};
use super::rules::{collect_outputs, collect_sites, literal_bindings, InputRule, OutputRule, Target};
use super::{
    pattern, Direction, Grammar, InputSite, Language, LiteralBinding, LoopKind, LoopSignature,
    OutputStatement, Span,
};
use regex::Regex;
use tracing::debug;

/// Letters that may prefix a string literal
const STRING_PREFIXES: &str = "fFrRbBuU";

#[derive(Debug)]
pub struct PythonGrammar {
    range_loop: Regex,
    each_loop: Regex,
    inputs: Vec<InputRule>,
    outputs: Vec<OutputRule>,
}

impl PythonGrammar {
    pub fn new() -> Self {
        PythonGrammar {
            range_loop: pattern(r"(?m)^[ \t]*for\s+(\w+)\s+in\s+range\s*\("),
            each_loop: pattern(r"(?m)^[ \t]*for\s+([\w, ]+?)\s+in\s+([^\n]+?)\s*:"),
            inputs: vec![
                InputRule::call(r"\binput\s*\(", Target::Assigned, Some(0)),
                InputRule::call(r"\braw_input\s*\(", Target::Assigned, Some(0)),
                InputRule::call(r"\bsys\.stdin\.readline\s*\(", Target::Assigned, None),
            ],
            outputs: vec![OutputRule::new(r"\bprint\s*\(")],
        }
    }
}

impl Default for PythonGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar for PythonGrammar {
    fn language(&self) -> Language {
        Language::Python
    }

    fn find_primary_loop_from(&self, source: &str, from: usize) -> Option<LoopSignature> {
        let masked = Lexicon::PYTHON.mask(source);

        for caps in self.range_loop.captures_iter(&masked) {
            let (Some(whole), Some(var)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() < from {
                continue;
            }
            let open = whole.end() - 1;
            let Some(close) = matching_close(&masked, open) else {
                continue;
            };
            let Some(colon) = masked[close..].find(':').map(|n| close + n) else {
                continue;
            };
            let Some((trip, direction)) = python_range(&masked[open + 1..close]) else {
                debug!(args = &masked[open + 1..close], "skipping unreadable range()");
                continue;
            };
            return Some(LoopSignature {
                kind: LoopKind::Primary,
                trip,
                direction,
                variable: Some(var.as_str().to_string()),
                collection: None,
                header: Span::new(whole.start() + leading_ws(whole.as_str()), colon + 1),
                body: indented(&masked, colon),
            });
        }
        None
    }

    fn find_enhanced_loop_from(&self, source: &str, from: usize) -> Option<LoopSignature> {
        let masked = Lexicon::PYTHON.mask(source);

        for caps in self.each_loop.captures_iter(&masked) {
            let (Some(whole), Some(var), Some(coll)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            if whole.start() < from {
                continue;
            }
            let collection = coll.as_str().trim();
            if collection.starts_with("range") {
                continue;
            }
            let colon = whole.end() - 1;
            let variable = var.as_str().rsplit(',').next().unwrap_or_default().trim();
            return Some(LoopSignature {
                kind: LoopKind::Enhanced,
                trip: collection_trip(&masked, collection),
                direction: Direction::Ascending,
                variable: Some(variable.to_string()),
                collection: Some(collection.to_string()),
                header: Span::new(whole.start() + leading_ws(whole.as_str()), colon + 1),
                body: indented(&masked, colon),
            });
        }
        None
    }

    fn find_do_while_from(&self, _source: &str, _from: usize) -> Option<LoopSignature> {
        None
    }

    fn find_input_sites(&self, source: &str) -> Vec<InputSite> {
        let masked = Lexicon::PYTHON.mask(source);
        collect_sites(source, &masked, &self.inputs, STRING_PREFIXES)
    }

    fn find_output_statements(&self, source: &str) -> Vec<OutputStatement> {
        let masked = Lexicon::PYTHON.mask(source);
        collect_outputs(source, &masked, &self.outputs, STRING_PREFIXES)
    }

    fn find_literal_bindings(&self, source: &str) -> Vec<LiteralBinding> {
        literal_bindings(&Lexicon::PYTHON.mask(source))
    }
}

fn leading_ws(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{BoundExpr, TripCount};

    #[test]
    fn test_descending_range() {
        let src = "n = int(input(\"Start: \"))\nfor i in range(n, 0, -1):\n    x = input(\"T-minus: \")\n";
        let sig = PythonGrammar::new().find_primary_loop(src).unwrap();
        assert_eq!(sig.direction, Direction::Descending);
        assert_eq!(sig.bound_expression(), "n");
        let body = sig.body.unwrap();
        assert!(src[body.start..body.end].contains("T-minus"));
    }

    #[test]
    fn test_range_with_call_bound_is_opaque() {
        let src = "for _ in range(int(input())):\n    print(input())\n";
        let sig = PythonGrammar::new().find_primary_loop(src).unwrap();
        assert!(matches!(sig.trip.bound, BoundExpr::Opaque(_)));
    }

    #[test]
    fn test_list_iteration() {
        let src = "for name in [\"a\", \"b\", \"c\"]:\n    print(name)\n";
        let grammar = PythonGrammar::new();
        assert!(grammar.find_primary_loop(src).is_none());
        let sig = grammar.find_enhanced_loop(src).unwrap();
        assert_eq!(sig.trip, TripCount::literal(3));
        assert_eq!(sig.variable.as_deref(), Some("name"));
    }

    #[test]
    fn test_enumerate_target_variable() {
        let src = "for i, row in enumerate(rows):\n    pass\n";
        let sig = PythonGrammar::new().find_enhanced_loop(src).unwrap();
        assert_eq!(sig.variable.as_deref(), Some("row"));
    }

    #[test]
    fn test_input_sites_and_prompts() {
        let src = "name = input(\"Name: \")\nage = int(input())\nline = sys.stdin.readline()\n# input(\"ignored\")\n";
        let sites = PythonGrammar::new().find_input_sites(src);
        assert_eq!(sites.len(), 3);
        assert_eq!(sites[0].inline_prompt.as_deref(), Some("Name: "));
        assert_eq!(sites[1].target.as_deref(), Some("age"));
        assert_eq!(sites[1].inline_prompt, None);
        assert_eq!(sites[2].target.as_deref(), Some("line"));
    }

    #[test]
    fn test_fstring_prompt() {
        let src = "x = input(f\"Value: \")\n";
        let sites = PythonGrammar::new().find_input_sites(src);
        assert_eq!(sites[0].inline_prompt.as_deref(), Some("Value: "));
    }
}
