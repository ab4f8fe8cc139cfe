//! Brace-block languages: C, C++, Java, JavaScript, TypeScript and PHP
//!
//! All six share `for (init; cond; step)` counter headers, `do { } while ()`
//! loops and `{ }` bodies; they differ in their foreach syntax and in the calls
//! that read stdin or print.

use super::blocks::{braced, braced_or_statement};
use super::counter::{c_style_header, collection_trip, counted, parse_step, Comparison};
use super::lexical::{matching_close, skip_ws, split_top_level, Lexicon};
use super::rules::{collect_outputs, collect_sites, literal_bindings, InputRule, OutputRule, Target};
use super::{
    pattern, BoundExpr, Direction, Grammar, InputSite, Language, LiteralBinding, LoopKind,
    LoopSignature, OutputStatement, Span, TripCount,
};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Foreach recogniser: `keyword` matches up to the header's `(`, `header`
/// is applied to the text inside the parentheses and must capture `var` and
/// `coll`.
#[derive(Debug)]
struct EnhancedRule {
    keyword: Regex,
    header: Regex,
}

#[derive(Debug)]
pub struct BraceGrammar {
    language: Language,
    lexicon: Lexicon,
    enhanced: Option<EnhancedRule>,
    inputs: Vec<InputRule>,
    outputs: Vec<OutputRule>,
}

const FOR_KEYWORD: &str = r"\bfor\s*\(";

fn c_inputs() -> Vec<InputRule> {
    vec![
        InputRule::destinations(r"\bscanf\s*\(", 1),
        InputRule::stream_destinations(r"\bfscanf\s*\(", 2, "stdin"),
        InputRule::call(r"\bgets\s*\(", Target::Arg(0), None),
        InputRule::stream_call(r"\bfgets\s*\(", Target::Arg(0), "stdin"),
        InputRule::call(r"\bgetchar\s*\(", Target::Assigned, None),
    ]
}

fn c_outputs() -> Vec<OutputRule> {
    vec![
        OutputRule::new(r"\bprintf\s*\("),
        OutputRule::new(r"\bputs\s*\("),
    ]
}

fn script_inputs() -> Vec<InputRule> {
    vec![
        InputRule::call(r"\bprompt\s*\(", Target::Assigned, Some(0)),
        InputRule::call(r"\b\w+\.question(?:Int|Float)?\s*\(", Target::Assigned, Some(0)),
        InputRule::call(r"\breadline\s*\(", Target::Assigned, None),
    ]
}

fn script_outputs() -> Vec<OutputRule> {
    vec![
        OutputRule::new(r"\bconsole\.log\s*\("),
        OutputRule::new(r"\bprocess\.stdout\.write\s*\("),
    ]
}

fn script_enhanced() -> EnhancedRule {
    EnhancedRule {
        keyword: pattern(FOR_KEYWORD),
        header: pattern(
            r"^(?:const|let|var)\s+(?P<var>\w+)(?:\s*:\s*[\w<>\[\]]+)?\s+(?:of|in)\s+(?P<coll>.+)$",
        ),
    }
}

impl BraceGrammar {
    pub fn c() -> Self {
        BraceGrammar {
            language: Language::C,
            lexicon: Lexicon::C_LIKE,
            enhanced: None,
            inputs: c_inputs(),
            outputs: c_outputs(),
        }
    }

    pub fn cpp() -> Self {
        let mut inputs = c_inputs();
        inputs.push(InputRule::extraction(r"\bcin\s*>>"));
        inputs.push(InputRule::stream_call(r"\bgetline\s*\(", Target::Arg(1), "cin"));
        let mut outputs = c_outputs();
        outputs.push(OutputRule::new(r"\bcout\s*<<"));

        BraceGrammar {
            language: Language::Cpp,
            lexicon: Lexicon::C_LIKE,
            enhanced: Some(EnhancedRule {
                keyword: pattern(FOR_KEYWORD),
                header: pattern(r"^(?:const\s+)?[\w:<>,\s]+?[\s&*]+(?P<var>\w+)\s*:\s*(?P<coll>[^:].*)$"),
            }),
            inputs,
            outputs,
        }
    }

    pub fn java() -> Self {
        BraceGrammar {
            language: Language::Java,
            lexicon: Lexicon::C_LIKE,
            enhanced: Some(EnhancedRule {
                keyword: pattern(FOR_KEYWORD),
                header: pattern(r"^(?:final\s+)?[\w<>\[\].,?\s]+?\s+(?P<var>\w+)\s*:\s*(?P<coll>.+)$"),
            }),
            inputs: vec![
                InputRule::call(
                    r"\b\w[\w.]*\.next(?:Int|Line|Double|Float|Long|Short|Byte|Boolean|BigInteger|BigDecimal)?\s*\(",
                    Target::Assigned,
                    None,
                ),
                InputRule::call(r"\b\w[\w.]*(?:\(\s*\))?\.readLine\s*\(", Target::Assigned, Some(0)),
            ],
            outputs: vec![OutputRule::new(r"\bSystem\.out\.print(?:ln|f)?\s*\(")],
        }
    }

    pub fn javascript() -> Self {
        BraceGrammar {
            language: Language::JavaScript,
            lexicon: Lexicon::JAVASCRIPT,
            enhanced: Some(script_enhanced()),
            inputs: script_inputs(),
            outputs: script_outputs(),
        }
    }

    pub fn typescript() -> Self {
        BraceGrammar {
            language: Language::TypeScript,
            ..BraceGrammar::javascript()
        }
    }

    pub fn php() -> Self {
        BraceGrammar {
            language: Language::Php,
            lexicon: Lexicon::PHP,
            enhanced: Some(EnhancedRule {
                keyword: pattern(r"\bforeach\s*\("),
                header: pattern(r"^(?P<coll>.+?)\s+as\s+(?:\$\w+\s*=>\s*)?&?\$(?P<var>\w+)$"),
            }),
            inputs: vec![
                InputRule::call(r"\breadline\s*\(", Target::Assigned, Some(0)),
                InputRule::stream_call(r"\bfgets\s*\(", Target::Assigned, "STDIN"),
                InputRule::stream_destinations(r"\bfscanf\s*\(", 2, "STDIN"),
            ],
            outputs: vec![
                OutputRule::new(r"\becho\b"),
                OutputRule::new(r"\bprint\b\s*\(?"),
                OutputRule::new(r"\bprintf\s*\("),
            ],
        }
    }
}

impl Grammar for BraceGrammar {
    fn language(&self) -> Language {
        self.language
    }

    fn find_primary_loop_from(&self, source: &str, from: usize) -> Option<LoopSignature> {
        static FOR: OnceLock<Regex> = OnceLock::new();
        let for_re = FOR.get_or_init(|| pattern(FOR_KEYWORD));
        let masked = self.lexicon.mask(source);

        let mut resume = from;
        for found in for_re.find_iter(&masked) {
            if found.start() < resume {
                continue;
            }
            let open = found.end() - 1;
            let Some(close) = matching_close(&masked, open) else {
                continue;
            };
            let header = &masked[open + 1..close];
            if split_top_level(header, b';').len() != 3 {
                continue;
            }
            let body = braced_or_statement(&masked, close + 1, false);

            match c_style_header(header) {
                Some(counter) => {
                    return Some(LoopSignature {
                        kind: LoopKind::Primary,
                        trip: counter.trip,
                        direction: counter.direction,
                        variable: Some(counter.variable),
                        collection: None,
                        header: Span::new(found.start(), close + 1),
                        body,
                    });
                }
                None => {
                    debug!(language = %self.language, header = header.trim(), "skipping ambiguous counter header");
                    resume = body.map_or(close + 1, |b| b.end);
                }
            }
        }
        None
    }

    fn find_enhanced_loop_from(&self, source: &str, from: usize) -> Option<LoopSignature> {
        let rule = self.enhanced.as_ref()?;
        let masked = self.lexicon.mask(source);

        for found in rule.keyword.find_iter(&masked) {
            if found.start() < from {
                continue;
            }
            let open = found.end() - 1;
            let Some(close) = matching_close(&masked, open) else {
                continue;
            };
            let header = masked[open + 1..close].trim();
            if header.contains(';') {
                continue;
            }
            let Some(caps) = rule.header.captures(header) else {
                continue;
            };
            let collection = caps["coll"].trim().to_string();
            return Some(LoopSignature {
                kind: LoopKind::Enhanced,
                trip: collection_trip(&masked, &collection),
                direction: Direction::Ascending,
                variable: Some(caps["var"].to_string()),
                collection: Some(collection),
                header: Span::new(found.start(), close + 1),
                body: braced_or_statement(&masked, close + 1, false),
            });
        }
        None
    }

    fn find_do_while_from(&self, source: &str, from: usize) -> Option<LoopSignature> {
        let masked = self.lexicon.mask(source);
        brace_do_while(&masked, from)
    }

    fn find_input_sites(&self, source: &str) -> Vec<InputSite> {
        let masked = self.lexicon.mask(source);
        collect_sites(source, &masked, &self.inputs, "")
    }

    fn find_output_statements(&self, source: &str) -> Vec<OutputStatement> {
        let masked = self.lexicon.mask(source);
        collect_outputs(source, &masked, &self.outputs, "")
    }

    fn find_literal_bindings(&self, source: &str) -> Vec<LiteralBinding> {
        literal_bindings(&self.lexicon.mask(source))
    }
}

/// `do { ... } while (cond);` on masked text.
///
/// The count is derived only for a plain counter: the condition compares a
/// variable assigned before the loop and stepped inside the body. Anything
/// else is opaque.
pub(crate) fn brace_do_while(masked: &str, from: usize) -> Option<LoopSignature> {
    static DO: OnceLock<Regex> = OnceLock::new();
    static WHILE: OnceLock<Regex> = OnceLock::new();
    let do_re = DO.get_or_init(|| pattern(r"\bdo\s*\{"));
    let while_re = WHILE.get_or_init(|| pattern(r"^while\s*\("));

    let found = do_re.find_at(masked, from)?;
    let open = found.end() - 1;
    let header = Span::new(found.start(), found.end());
    let body = braced(masked, open);

    let condition = body.and_then(|b| {
        let after = skip_ws(masked, b.end + 1);
        let m = while_re.find(&masked[after..])?;
        let cond_open = after + m.end() - 1;
        let cond_close = matching_close(masked, cond_open)?;
        Some(masked[cond_open + 1..cond_close].trim().to_string())
    });

    let (trip, direction, variable) = match (&condition, body) {
        (Some(cond), Some(b)) => counter_do_while(masked, found.start(), &masked[b.start..b.end], cond)
            .map(|(trip, direction, var)| (trip, direction, Some(var)))
            .unwrap_or_else(|| (TripCount::opaque(cond.as_str()), Direction::Ascending, None)),
        _ => (TripCount::opaque("do"), Direction::Ascending, None),
    };
    if matches!(trip.bound, BoundExpr::Opaque(_)) {
        debug!(condition = ?condition, "do-while count is not derivable");
    }

    Some(LoopSignature {
        kind: LoopKind::DoWhile,
        trip,
        direction,
        variable,
        collection: None,
        header,
        body,
    })
}

fn counter_do_while(
    masked: &str,
    loop_start: usize,
    body: &str,
    cond: &str,
) -> Option<(TripCount, Direction, String)> {
    static COND: OnceLock<Regex> = OnceLock::new();
    let cond_re = COND.get_or_init(|| pattern(r"^\$?([A-Za-z_]\w*)\s*(<=|>=|!=|<|>)\s*(.+)$"));

    let caps = cond_re.captures(cond)?;
    let variable = caps[1].to_string();
    let cmp = match &caps[2] {
        "<" => Comparison::Less,
        "<=" => Comparison::LessEq,
        ">" => Comparison::Greater,
        ">=" => Comparison::GreaterEq,
        _ => Comparison::NotEq,
    };

    let assign = pattern(&format!(
        r"\$?\b{}\s*=\s*([^=;\n][^;\n]*)",
        regex::escape(&variable)
    ));
    let start = assign
        .captures_iter(&masked[..loop_start])
        .last()
        .map(|c| c[1].trim().to_string())?;
    let step = body
        .split([';', '\n', '{', '}'])
        .find_map(|stmt| parse_step(stmt, &variable))?;

    let (trip, direction) = counted(&start, cmp, &caps[3], step)?;
    Some((trip, direction, variable))
}
