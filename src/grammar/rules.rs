//! Table-driven input and output recognition
//!
//! Each grammar lists its input calls as [`InputRule`]s and its print calls as
//! [`OutputRule`]s. A rule pattern must match up to and including the opening
//! parenthesis of the call (or the keyword, for `echo` and `cout <<`).

use super::lexical::{
    arguments, assignment_target, call_span, destination_name, is_identifier, line_end,
    matching_close, sole_literal,
};
use super::{pattern, InputSite, LiteralBinding, OutputStatement, Span};
use regex::Regex;
use rustc_hash::FxHashSet;
use std::sync::OnceLock;

/// Where the value read by a call ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// `n = input()`
    Assigned,
    /// Written into the nth argument: `gets(buf)`, `getline(cin, s)`
    Arg(usize),
}

#[derive(Debug)]
pub enum InputRule {
    /// One value per call
    Call {
        pattern: Regex,
        target: Target,
        /// Argument holding an inline prompt literal
        prompt: Option<usize>,
        /// Some argument must name this stream (`stdin`, `STDIN`, `cin`)
        stream: Option<&'static str>,
    },
    /// One value per destination argument after `leading` fixed arguments
    /// (`scanf("%d %d", &a, &b)`, `fmt.Scan(&n)`)
    Destinations {
        pattern: Regex,
        leading: usize,
        stream: Option<&'static str>,
    },
    /// `cin >> a >> b`: one value per operand
    Extraction { pattern: Regex },
}

impl InputRule {
    pub fn call(src: &str, target: Target, prompt: Option<usize>) -> Self {
        InputRule::Call {
            pattern: pattern(src),
            target,
            prompt,
            stream: None,
        }
    }

    pub fn stream_call(src: &str, target: Target, stream: &'static str) -> Self {
        InputRule::Call {
            pattern: pattern(src),
            target,
            prompt: None,
            stream: Some(stream),
        }
    }

    pub fn destinations(src: &str, leading: usize) -> Self {
        InputRule::Destinations {
            pattern: pattern(src),
            leading,
            stream: None,
        }
    }

    pub fn stream_destinations(src: &str, leading: usize, stream: &'static str) -> Self {
        InputRule::Destinations {
            pattern: pattern(src),
            leading,
            stream: Some(stream),
        }
    }

    pub fn extraction(src: &str) -> Self {
        InputRule::Extraction {
            pattern: pattern(src),
        }
    }

    fn pattern(&self) -> &Regex {
        match self {
            InputRule::Call { pattern, .. }
            | InputRule::Destinations { pattern, .. }
            | InputRule::Extraction { pattern } => pattern,
        }
    }
}

/// A print-like call or keyword whose argument may be a prompt literal
#[derive(Debug)]
pub struct OutputRule {
    pub pattern: Regex,
}

impl OutputRule {
    pub fn new(src: &str) -> Self {
        OutputRule {
            pattern: pattern(src),
        }
    }
}

/// Apply `rules` in order and return one site per consumed value, sorted by
/// position. A match start claimed by an earlier rule is not matched again.
pub fn collect_sites(
    original: &str,
    masked: &str,
    rules: &[InputRule],
    literal_prefixes: &str,
) -> Vec<InputSite> {
    let mut sites = Vec::new();
    let mut claimed = FxHashSet::default();

    for rule in rules {
        for found in rule.pattern().find_iter(masked) {
            if !claimed.insert(found.start()) {
                continue;
            }
            match rule {
                InputRule::Call {
                    target,
                    prompt,
                    stream,
                    ..
                } => {
                    let open = found.end() - 1;
                    let args = call_arguments(masked, open);
                    if !names_stream(&args, *stream) {
                        continue;
                    }
                    let target = match target {
                        Target::Assigned => assignment_target(masked, found.start()),
                        Target::Arg(n) => args.get(*n).and_then(|(_, a)| destination_name(a)),
                    };
                    let inline = prompt.and_then(|n| {
                        let (at, _) = *args.get(n)?;
                        prompt_literal(original, masked, at, literal_prefixes)
                    });
                    let span = call_span(masked, found.start(), open);
                    sites.push(InputSite::new(span, target, inline));
                }
                InputRule::Destinations {
                    leading, stream, ..
                } => {
                    let open = found.end() - 1;
                    let args = call_arguments(masked, open);
                    if !names_stream(&args, *stream) {
                        continue;
                    }
                    let destinations = args.iter().skip(*leading).collect::<Vec<_>>();
                    if destinations.is_empty() {
                        let span = call_span(masked, found.start(), open);
                        let target = assignment_target(masked, found.start());
                        sites.push(InputSite::new(span, target, None));
                        continue;
                    }
                    for &(at, arg) in destinations {
                        let span = Span::new(at, at + arg.len());
                        sites.push(InputSite::new(span, destination_name(arg), None));
                    }
                }
                InputRule::Extraction { .. } => {
                    let end = masked[found.end()..]
                        .find(';')
                        .map_or(masked.len(), |n| found.end() + n);
                    let chain = &masked[found.end()..end];
                    let mut offset = found.end();
                    for operand in chain.split(">>") {
                        let trimmed = operand.trim();
                        if !trimmed.is_empty() {
                            let at = offset + (operand.len() - operand.trim_start().len());
                            let span = Span::new(at, at + trimmed.len());
                            sites.push(InputSite::new(span, destination_name(trimmed), None));
                        }
                        offset += operand.len() + 2;
                    }
                }
            }
        }
    }

    sites.sort_by_key(|site| site.span.start);
    sites
}

/// Apply output rules; a statement carries a literal only when its sole
/// argument is a string literal.
pub fn collect_outputs(
    original: &str,
    masked: &str,
    rules: &[OutputRule],
    literal_prefixes: &str,
) -> Vec<OutputStatement> {
    let mut outputs = Vec::new();
    let mut claimed = FxHashSet::default();

    for rule in rules {
        for found in rule.pattern.find_iter(masked) {
            if !claimed.insert(found.start()) {
                continue;
            }
            let mut literal = sole_literal(original, masked, found.end(), literal_prefixes);
            let span = if masked[..found.end()].ends_with('(') {
                let open = found.end() - 1;
                let extra = call_arguments(masked, open);
                if extra.iter().skip(1).any(|(_, arg)| !is_keyword_argument(arg)) {
                    literal = None;
                }
                call_span(masked, found.start(), open)
            } else {
                let stop = masked[found.end()..]
                    .find(';')
                    .map_or(masked.len(), |n| found.end() + n + 1);
                Span::new(found.start(), stop.min(line_end(masked, found.end())))
            };
            outputs.push(OutputStatement { span, literal });
        }
    }

    outputs.sort_by_key(|out| out.span.start);
    outputs
}

/// `name = 5`, `int n = 5;`, `n := 5`, `n <- 5`, `$n = 5;`, `#define N 5`,
/// in source order
pub fn literal_bindings(masked: &str) -> Vec<LiteralBinding> {
    static ASSIGN: OnceLock<Regex> = OnceLock::new();
    static DEFINE: OnceLock<Regex> = OnceLock::new();
    let assign = ASSIGN.get_or_init(|| {
        pattern(
            r"(?m)(?:^|[;{(,])[ \t]*(?:[\w<>\[\]]+[ \t]+)*\$?([A-Za-z_]\w*)[ \t]*(?::[ \t]*\w+[ \t]*)?(?::=|=|<-)[ \t]*(-?\d+)[ \t]*\r?(?:;|,|\)|$)",
        )
    });
    let define = DEFINE.get_or_init(|| pattern(r"(?m)^[ \t]*#define[ \t]+(\w+)[ \t]+(-?\d+)[ \t]*$"));

    let mut found = Vec::new();
    for re in [assign, define] {
        for caps in re.captures_iter(masked) {
            let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            if let Ok(value) = value.as_str().parse::<i64>() {
                found.push(LiteralBinding {
                    name: name.as_str().to_string(),
                    value,
                    at: name.start(),
                });
            }
        }
    }
    found.sort_by_key(|b| b.at);
    found
}

fn call_arguments(masked: &str, open: usize) -> Vec<(usize, &str)> {
    let Some(close) = matching_close(masked, open) else {
        return Vec::new();
    };
    arguments(&masked[open + 1..close])
        .into_iter()
        .map(|(off, arg)| (open + 1 + off, arg))
        .collect()
}

/// `end=""`, `sep = ""`
fn is_keyword_argument(arg: &str) -> bool {
    match arg.split_once('=') {
        Some((name, rest)) => is_identifier(name.trim()) && !rest.starts_with('='),
        None => false,
    }
}

fn names_stream(args: &[(usize, &str)], stream: Option<&str>) -> bool {
    match stream {
        None => true,
        Some(name) => args
            .iter()
            .any(|(_, arg)| arg.trim_start_matches("std::") == name),
    }
}

/// Literal passed positionally or by name (`prompt = "..."`)
fn prompt_literal(original: &str, masked: &str, at: usize, prefixes: &str) -> Option<String> {
    static NAMED: OnceLock<Regex> = OnceLock::new();
    let named = NAMED.get_or_init(|| pattern(r"^\w+\s*=\s*"));
    let skip = named.find(&masked[at..]).map_or(0, |m| m.end());
    let text = sole_literal(original, masked, at + skip, prefixes)?;
    (!text.trim().is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::lexical::Lexicon;

    fn sites(src: &str, rules: &[InputRule]) -> Vec<InputSite> {
        let masked = Lexicon::C_LIKE.mask(src);
        collect_sites(src, &masked, rules, "")
    }

    #[test]
    fn test_scanf_yields_one_site_per_destination() {
        let rules = [InputRule::destinations(r"\bscanf\s*\(", 1)];
        let found = sites("scanf(\"%d %d\", &rows, &cols);", &rules);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].target.as_deref(), Some("rows"));
        assert_eq!(found[1].target.as_deref(), Some("cols"));
    }

    #[test]
    fn test_call_with_inline_prompt() {
        let rules = [InputRule::call(r"\bprompt\s*\(", Target::Assigned, Some(0))];
        let found = sites("let n = Number(prompt(\"How many? \"));", &rules);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].target.as_deref(), Some("n"));
        assert_eq!(found[0].inline_prompt.as_deref(), Some("How many? "));
    }

    #[test]
    fn test_named_prompt_argument() {
        let rules = [InputRule::call(r"\breadline\s*\(", Target::Assigned, Some(0))];
        let src = "n <- as.integer(readline(prompt = \"Count: \"))";
        let masked = Lexicon::R.mask(src);
        let found = collect_sites(src, &masked, &rules, "");
        assert_eq!(found[0].inline_prompt.as_deref(), Some("Count: "));
        assert_eq!(found[0].target.as_deref(), Some("n"));
    }

    #[test]
    fn test_stream_requirement() {
        let rules = [InputRule::stream_call(r"\bfgets\s*\(", Target::Arg(0), "stdin")];
        assert_eq!(sites("fgets(line, 80, stdin);", &rules).len(), 1);
        assert!(sites("fgets(line, 80, fp);", &rules).is_empty());
    }

    #[test]
    fn test_extraction_chain() {
        let rules = [InputRule::extraction(r"\bcin\s*>>")];
        let found = sites("std::cin >> a >> b;", &rules);
        let targets: Vec<_> = found.iter().map(|s| s.target.clone().unwrap()).collect();
        assert_eq!(targets, ["a", "b"]);
    }

    #[test]
    fn test_claimed_start_not_matched_twice() {
        let rules = [
            InputRule::destinations(r"\bfmt\.Scan\s*\(", 0),
            InputRule::call(r"\b\w+\.Scan\s*\(", Target::Assigned, None),
        ];
        let found = sites("fmt.Scan(&n)\nfor sc.Scan() {}", &rules);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].target.as_deref(), Some("n"));
    }

    #[test]
    fn test_outputs_capture_sole_literals() {
        let src = "printf(\"Enter n: \");\nprintf(\"%d\\n\", n);\ncout << \"Name: \";\nprint(\"Next: \", end=\"\")";
        let masked = Lexicon::C_LIKE.mask(src);
        let rules = [
            OutputRule::new(r"\bprintf\s*\("),
            OutputRule::new(r"\bcout\s*<<"),
            OutputRule::new(r"\bprint\s*\("),
        ];
        let outs = collect_outputs(src, &masked, &rules, "");
        assert_eq!(outs.len(), 4);
        assert_eq!(outs[0].literal.as_deref(), Some("Enter n: "));
        assert_eq!(outs[1].literal, None);
        assert_eq!(outs[2].literal.as_deref(), Some("Name: "));
        assert_eq!(outs[3].literal.as_deref(), Some("Next: "));
    }

    #[test]
    fn test_literal_bindings_in_source_order() {
        let src = "#define SIZE 10\nint n = 3;\nx := 7\nn = 4;\nif (n == 5) {}\n";
        let found: Vec<_> = literal_bindings(src)
            .into_iter()
            .map(|b| (b.name, b.value))
            .collect();
        assert_eq!(
            found,
            [("SIZE".to_string(), 10), ("n".to_string(), 3), ("x".to_string(), 7), ("n".to_string(), 4)]
        );
        assert_eq!(literal_bindings(src)[1].at, src.find("n = 3").unwrap());
    }
}
