//! R: `for (i in 1:n)` style sequences, `repeat` blocks and newline-terminated
//! statements

use super::blocks::{braced, braced_or_statement};
use super::counter::{collection_trip, counted, r_sequence, Comparison, Step};
use super::lexical::{arguments, matching_close, split_top_level, Lexicon};
use super::rules::{collect_outputs, collect_sites, literal_bindings, InputRule, OutputRule, Target};
use super::{
    pattern, Direction, Grammar, InputSite, Language, LiteralBinding, LoopKind, LoopSignature,
    OutputStatement, Span, TripCount,
};
use regex::Regex;

#[derive(Debug)]
pub struct RGrammar {
    for_loop: Regex,
    repeat: Regex,
    inputs: Vec<InputRule>,
    outputs: Vec<OutputRule>,
}

/// Shape of the sequence after `in`
enum Sequence<'a> {
    Counted(TripCount, Direction),
    Collection(&'a str),
}

impl RGrammar {
    pub fn new() -> Self {
        RGrammar {
            for_loop: pattern(r"\bfor\s*\(\s*(\w+)\s+in\s+"),
            repeat: pattern(r"\brepeat\s*\{"),
            inputs: vec![
                InputRule::call(r"\breadline\s*\(", Target::Assigned, Some(0)),
                InputRule::call(r"\breadLines\s*\(", Target::Assigned, None),
                InputRule::call(r"\bscan\s*\(", Target::Assigned, None),
            ],
            outputs: vec![
                OutputRule::new(r"\bcat\s*\("),
                OutputRule::new(r"\bprint\s*\("),
                OutputRule::new(r"\bmessage\s*\("),
            ],
        }
    }

    /// Each `for (var in seq)` header with its sequence text and header span
    fn headers<'m>(&self, masked: &'m str) -> Vec<(String, &'m str, Span)> {
        let mut found = Vec::new();
        for caps in self.for_loop.captures_iter(masked) {
            let (Some(whole), Some(var)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let open = whole.start() + whole.as_str().find('(').unwrap_or_default();
            let Some(close) = matching_close(masked, open) else {
                continue;
            };
            let seq = masked[whole.end()..close].trim();
            found.push((var.as_str().to_string(), seq, Span::new(whole.start(), close + 1)));
        }
        found
    }
}

impl Default for RGrammar {
    fn default() -> Self {
        Self::new()
    }
}

/// `1:n`, `seq_len(n)`, `seq(a, b)`, `seq(a, b, by = k)`
fn sequence(seq: &str) -> Sequence<'_> {
    let ranged = split_top_level(seq, b':');
    if ranged.len() == 2 {
        let (from, to) = (&seq[ranged[0].0..ranged[0].1], &seq[ranged[1].0..ranged[1].1]);
        if let Some((trip, direction)) = r_sequence(from, to) {
            return Sequence::Counted(trip, direction);
        }
    }

    if let Some(args) = seq.strip_prefix("seq_len(").and_then(|s| s.strip_suffix(')')) {
        if let Some((trip, direction)) = counted("1", Comparison::LessEq, args, Step::Up(1)) {
            return Sequence::Counted(trip, direction);
        }
    }

    if let Some(args) = seq.strip_prefix("seq(").and_then(|s| s.strip_suffix(')')) {
        let args = arguments(args);
        let value = |i: usize| {
            args.get(i).map(|&(_, a)| match a.split_once('=') {
                Some((_, v)) => v.trim(),
                None => a,
            })
        };
        match (value(0), value(1), value(2)) {
            (Some(from), Some(to), None) => {
                if let Some((trip, direction)) = r_sequence(from, to) {
                    return Sequence::Counted(trip, direction);
                }
            }
            (Some(from), Some(to), Some(by)) => {
                if let Ok(by) = by.parse::<i64>() {
                    let step = if by > 0 {
                        counted(from, Comparison::LessEq, to, Step::Up(by as u64))
                    } else {
                        counted(from, Comparison::GreaterEq, to, Step::Down(by.unsigned_abs()))
                    };
                    if let Some((trip, direction)) = step {
                        return Sequence::Counted(trip, direction);
                    }
                }
            }
            _ => {}
        }
    }

    Sequence::Collection(seq)
}

impl Grammar for RGrammar {
    fn language(&self) -> Language {
        Language::R
    }

    fn find_primary_loop_from(&self, source: &str, from: usize) -> Option<LoopSignature> {
        let masked = Lexicon::R.mask(source);
        self.headers(&masked)
            .into_iter()
            .filter(|(_, _, header)| header.start >= from)
            .find_map(|(variable, seq, header)| match sequence(seq) {
                Sequence::Counted(trip, direction) => Some(LoopSignature {
                    kind: LoopKind::Primary,
                    trip,
                    direction,
                    variable: Some(variable),
                    collection: None,
                    header,
                    body: braced_or_statement(&masked, header.end, true),
                }),
                Sequence::Collection(_) => None,
            })
    }

    fn find_enhanced_loop_from(&self, source: &str, from: usize) -> Option<LoopSignature> {
        let masked = Lexicon::R.mask(source);
        self.headers(&masked)
            .into_iter()
            .filter(|(_, _, header)| header.start >= from)
            .find_map(|(variable, seq, header)| match sequence(seq) {
                Sequence::Collection(coll) => {
                    let coll = coll
                        .strip_prefix("seq_along(")
                        .and_then(|s| s.strip_suffix(')'))
                        .unwrap_or(coll);
                    Some(LoopSignature {
                        kind: LoopKind::Enhanced,
                        trip: collection_trip(&masked, coll),
                        direction: Direction::Ascending,
                        variable: Some(variable),
                        collection: Some(coll.to_string()),
                        header,
                        body: braced_or_statement(&masked, header.end, true),
                    })
                }
                Sequence::Counted(..) => None,
            })
    }

    /// `repeat { ... }` only ends through `break`, so its count is never known
    fn find_do_while_from(&self, source: &str, from: usize) -> Option<LoopSignature> {
        let masked = Lexicon::R.mask(source);
        let found = self.repeat.find_at(&masked, from)?;
        Some(LoopSignature {
            kind: LoopKind::DoWhile,
            trip: TripCount::opaque("repeat"),
            direction: Direction::Ascending,
            variable: None,
            collection: None,
            header: Span::new(found.start(), found.end()),
            body: braced(&masked, found.end() - 1),
        })
    }

    fn find_input_sites(&self, source: &str) -> Vec<InputSite> {
        let masked = Lexicon::R.mask(source);
        collect_sites(source, &masked, &self.inputs, "")
    }

    fn find_output_statements(&self, source: &str) -> Vec<OutputStatement> {
        let masked = Lexicon::R.mask(source);
        collect_outputs(source, &masked, &self.outputs, "")
    }

    fn find_literal_bindings(&self, source: &str) -> Vec<LiteralBinding> {
        literal_bindings(&Lexicon::R.mask(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::BoundExpr;

    #[test]
    fn test_colon_sequence() {
        let src = "n <- as.integer(readline(\"n: \"))\nfor (i in 1:n) {\n  x <- readline(\"x: \")\n}\n";
        let sig = RGrammar::new().find_primary_loop(src).unwrap();
        assert_eq!(sig.bound_expression(), "n");
        assert_eq!(sig.trip.offset, 0);
        assert!(sig.body.is_some());
    }

    #[test]
    fn test_seq_forms() {
        let grammar = RGrammar::new();
        let sig = grammar.find_primary_loop("for (i in seq_len(k)) print(i)").unwrap();
        assert_eq!(sig.bound_expression(), "k");

        let sig = grammar.find_primary_loop("for (i in seq(2, 10, by = 2)) print(i)").unwrap();
        assert_eq!(sig.trip.iterations(9), 5);
        assert_eq!(sig.trip.bound, BoundExpr::Literal(9));
    }

    #[test]
    fn test_unbraced_body_ends_at_newline() {
        let src = "for (i in 1:3) x <- scan(\"stdin\", n = 1)\ncat(\"done\")\n";
        let sig = RGrammar::new().find_primary_loop(src).unwrap();
        let body = sig.body.unwrap();
        assert!(!src[body.start..body.end].contains("done"));
        assert_eq!(sig.trip, TripCount::literal(3));
    }

    #[test]
    fn test_vector_iteration() {
        let src = "v <- c(3, 1, 2)\nfor (x in v) {\n  print(x)\n}\n";
        let grammar = RGrammar::new();
        assert!(grammar.find_primary_loop(src).is_none());
        let sig = grammar.find_enhanced_loop(src).unwrap();
        assert_eq!(sig.trip, TripCount::literal(3));
    }

    #[test]
    fn test_repeat_is_open_ended() {
        let src = "repeat {\n  x <- readline()\n  if (x == \"\") break\n}\n";
        let sig = RGrammar::new().find_do_while(src).unwrap();
        assert!(matches!(sig.trip.bound, BoundExpr::Opaque(_)));
    }

    #[test]
    fn test_named_prompt() {
        let src = "name <- readline(prompt = \"Your name: \")\n";
        let sites = RGrammar::new().find_input_sites(src);
        assert_eq!(sites[0].inline_prompt.as_deref(), Some("Your name: "));
        assert_eq!(sites[0].target.as_deref(), Some("name"));
    }
}
