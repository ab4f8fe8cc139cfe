//! Trip counts for counter loops
//!
//! A counter loop is described by its start value, its comparison against a
//! limit and its step. The count is expressed as a [`TripCount`] over the one
//! side that may be unknown until the user answers (usually the limit for an
//! ascending loop and the start for a descending one).
//!
//! The step must agree with the comparison: `i < n` needs an increment,
//! `i > 0` needs an explicit decrement. Anything else is treated as an
//! ambiguous header and produces no signature.

use super::lexical::{arguments, is_identifier, matching_close, split_top_level};
use super::{pattern, BoundExpr, Direction, TripCount};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Less,
    LessEq,
    Greater,
    GreaterEq,
    NotEq,
}

impl Comparison {
    fn parse(op: &str) -> Option<Comparison> {
        match op {
            "<" => Some(Comparison::Less),
            "<=" => Some(Comparison::LessEq),
            ">" => Some(Comparison::Greater),
            ">=" => Some(Comparison::GreaterEq),
            "!=" => Some(Comparison::NotEq),
            _ => None,
        }
    }

    /// `n > i` is `i < n`
    fn flipped(self) -> Comparison {
        match self {
            Comparison::Less => Comparison::Greater,
            Comparison::LessEq => Comparison::GreaterEq,
            Comparison::Greater => Comparison::Less,
            Comparison::GreaterEq => Comparison::LessEq,
            Comparison::NotEq => Comparison::NotEq,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Up(u64),
    Down(u64),
}

/// `name + constant`, or a bare constant when `var` is `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linear {
    pub var: Option<String>,
    pub constant: i64,
}

/// Parse `5`, `n`, `$n`, `n - 1`, `(n + 1)` or `1 + n`
pub fn linear(expr: &str) -> Option<Linear> {
    static VAR: OnceLock<Regex> = OnceLock::new();
    static LEAD: OnceLock<Regex> = OnceLock::new();
    let var_re = VAR.get_or_init(|| {
        pattern(r"^\$?([A-Za-z_]\w*)\s*(?:([+-])\s*(\d+))?$")
    });
    let lead_re = LEAD.get_or_init(|| pattern(r"^(\d+)\s*\+\s*\$?([A-Za-z_]\w*)$"));

    let mut text = expr.trim();
    while text.starts_with('(') && text.ends_with(')') {
        text = text[1..text.len() - 1].trim();
    }

    if let Ok(n) = text.parse::<i64>() {
        return Some(Linear {
            var: None,
            constant: n,
        });
    }
    if let Some(caps) = var_re.captures(text) {
        let name = caps[1].to_string();
        if matches!(name.as_str(), "true" | "false" | "null" | "None" | "nil" | "NULL") {
            return None;
        }
        let magnitude: i64 = caps.get(3).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
        let constant = match caps.get(2).map(|m| m.as_str()) {
            Some("-") => -magnitude,
            _ => magnitude,
        };
        return Some(Linear {
            var: Some(name),
            constant,
        });
    }
    let caps = lead_re.captures(text)?;
    Some(Linear {
        var: Some(caps[2].to_string()),
        constant: caps[1].parse().ok()?,
    })
}

/// Trip count of a counter running from `start` against `limit`.
///
/// Returns `None` when the step disagrees with the comparison.
pub fn counted(start: &str, cmp: Comparison, limit: &str, step: Step) -> Option<(TripCount, Direction)> {
    let (ascending, inclusive, stride) = match (cmp, step) {
        (Comparison::Less | Comparison::NotEq, Step::Up(k)) => (true, false, k),
        (Comparison::LessEq, Step::Up(k)) => (true, true, k),
        (Comparison::Greater | Comparison::NotEq, Step::Down(k)) => (false, false, k),
        (Comparison::GreaterEq, Step::Down(k)) => (false, true, k),
        _ => return None,
    };
    if stride == 0 {
        return None;
    }

    // iterations = far - near (+1 when inclusive)
    let (near, far) = if ascending { (start, limit) } else { (limit, start) };
    let direction = if ascending {
        Direction::Ascending
    } else {
        Direction::Descending
    };
    let extra = i64::from(inclusive);

    let opaque = || TripCount {
        bound: BoundExpr::Opaque(far.trim().to_string()),
        offset: 0,
        stride,
    };
    let trip = match (linear(near), linear(far)) {
        (Some(Linear { var: None, constant: n }), Some(far_side)) => {
            // Out-of-range literals leave the count unknown
            let span = far_side
                .constant
                .checked_sub(n)
                .and_then(|d| d.checked_add(extra));
            match (far_side.var, span) {
                (None, Some(count)) => TripCount {
                    bound: BoundExpr::Literal(count),
                    offset: 0,
                    stride,
                },
                (Some(name), Some(offset)) => TripCount {
                    bound: BoundExpr::Identifier(name),
                    offset,
                    stride,
                },
                (_, None) => opaque(),
            }
        }
        _ => opaque(),
    };
    Some((trip, direction))
}

/// Counter variable plus trip count of a `init; cond; step` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterHeader {
    pub variable: String,
    pub trip: TripCount,
    pub direction: Direction,
}

/// Parse the three clauses of a C-style header (`int i = 0; i < n; i++`).
///
/// All three clauses must name the same counter.
pub fn c_style_header(header: &str) -> Option<CounterHeader> {
    static INIT: OnceLock<Regex> = OnceLock::new();
    static COND: OnceLock<Regex> = OnceLock::new();
    static COND_REVERSED: OnceLock<Regex> = OnceLock::new();

    let init_re = INIT.get_or_init(|| {
        pattern(r"^(?:\w+(?:::\w+)*(?:<[^>]*>)?[*&]?\s+)*(\$?[A-Za-z_]\w*)\s*(?::\s*\w+\s*)?:?=\s*(.+)$")
    });
    let cond_re = COND.get_or_init(|| pattern(r"^(\$?[A-Za-z_]\w*)\s*(<=|>=|!=|<|>)\s*(.+)$"));
    let cond_rev_re =
        COND_REVERSED.get_or_init(|| pattern(r"^(.+?)\s*(<=|>=|<|>)\s*(\$?[A-Za-z_]\w*)$"));

    let parts = split_top_level(header, b';');
    if parts.len() != 3 {
        return None;
    }
    let clause = |i: usize| header[parts[i].0..parts[i].1].trim();
    let (init, cond, step) = (clause(0), clause(1), clause(2));

    let init_caps = init_re.captures(init)?;
    let variable = init_caps[1].trim_start_matches('$').to_string();
    let start = init_caps[2].to_string();

    let (cmp, limit) = match cond_re.captures(cond) {
        Some(caps) if caps[1].trim_start_matches('$') == variable => {
            (Comparison::parse(&caps[2])?, caps[3].to_string())
        }
        _ => {
            let caps = cond_rev_re.captures(cond)?;
            if caps[3].trim_start_matches('$') != variable {
                return None;
            }
            (Comparison::parse(&caps[2])?.flipped(), caps[1].to_string())
        }
    };

    let step = parse_step(step, &variable)?;
    let (trip, direction) = counted(&start, cmp, &limit, step)?;
    Some(CounterHeader {
        variable,
        trip,
        direction,
    })
}

/// `i++`, `--i`, `i += 2`, `i = i - 1` for the named counter
pub fn parse_step(step: &str, variable: &str) -> Option<Step> {
    static INC: OnceLock<Regex> = OnceLock::new();
    static COMPOUND: OnceLock<Regex> = OnceLock::new();
    static EXPANDED: OnceLock<Regex> = OnceLock::new();

    let inc_re = INC.get_or_init(|| {
        pattern(r"^(?:(\+\+|--)\s*\$?([A-Za-z_]\w*)|\$?([A-Za-z_]\w*)\s*(\+\+|--))$")
    });
    let compound_re =
        COMPOUND.get_or_init(|| pattern(r"^\$?([A-Za-z_]\w*)\s*([+-])=\s*(\d+)$"));
    let expanded_re = EXPANDED.get_or_init(|| {
        pattern(r"^\$?([A-Za-z_]\w*)\s*=\s*\$?([A-Za-z_]\w*)\s*([+-])\s*(\d+)$")
    });

    let step = step.trim();
    if let Some(caps) = inc_re.captures(step) {
        let (op, name) = match (caps.get(1), caps.get(2)) {
            (Some(op), Some(name)) => (op.as_str(), name.as_str()),
            _ => (caps.get(4)?.as_str(), caps.get(3)?.as_str()),
        };
        if name != variable {
            return None;
        }
        return Some(if op == "++" { Step::Up(1) } else { Step::Down(1) });
    }
    if let Some(caps) = compound_re.captures(step) {
        if &caps[1] != variable {
            return None;
        }
        return signed_step(&caps[2], &caps[3]);
    }
    let caps = expanded_re.captures(step)?;
    if &caps[1] != variable || &caps[2] != variable {
        return None;
    }
    signed_step(&caps[3], &caps[4])
}

fn signed_step(sign: &str, amount: &str) -> Option<Step> {
    let k: u64 = amount.parse().ok()?;
    Some(if sign == "+" { Step::Up(k) } else { Step::Down(k) })
}

/// Python `range(...)` arguments
pub fn python_range(args: &str) -> Option<(TripCount, Direction)> {
    let args: Vec<&str> = arguments(args).into_iter().map(|(_, a)| a).collect();
    match args.as_slice() {
        [stop] => counted("0", Comparison::Less, stop, Step::Up(1)),
        [start, stop] => counted(start, Comparison::Less, stop, Step::Up(1)),
        [start, stop, step] => {
            let step: i64 = step.replace(' ', "").parse().ok()?;
            if step > 0 {
                counted(start, Comparison::Less, stop, Step::Up(step as u64))
            } else {
                counted(start, Comparison::Greater, stop, Step::Down(step.unsigned_abs()))
            }
        }
        _ => None,
    }
}

/// R sequence `a:b`; direction follows the literal ends when both are known
pub fn r_sequence(from: &str, to: &str) -> Option<(TripCount, Direction)> {
    match (linear(from), linear(to)) {
        (Some(a), Some(b)) if a.var.is_none() && b.var.is_none() => {
            if a.constant <= b.constant {
                counted(from, Comparison::LessEq, to, Step::Up(1))
            } else {
                counted(from, Comparison::GreaterEq, to, Step::Down(1))
            }
        }
        (Some(a), Some(_)) if a.var.is_some() => {
            counted(from, Comparison::GreaterEq, to, Step::Down(1))
        }
        _ => counted(from, Comparison::LessEq, to, Step::Up(1)),
    }
}

/// Element count of the collection `name` as declared in `masked`.
///
/// Sized allocations (`new int[n]`, `make([]int, n)`, `[0] * n`, `int xs[5]`)
/// give a literal or identifier count; literal lists (`[1, 2]`, `{1, 2}`,
/// `c(1, 2)`, `array(1, 2)`) are counted. Empty literals return `None` since
/// such collections are filled later.
pub fn collection_size(masked: &str, name: &str) -> Option<TripCount> {
    let name = regex::escape(name.trim_start_matches('$'));
    let sized = [
        format!(r"\$?\b{name}\s*(?:\[\s*\])?\s*(?::[^=\n]+)?=\s*new\s+[\w<>.]+\s*\[\s*([^\]]+)\]"),
        format!(r"\b{name}\s*:?=\s*make\s*\(\s*\[\][\w.]+\s*,\s*([^,)]+)"),
        format!(r"\b{name}\s*=\s*\[[^\]]*\]\s*\*\s*(\w+)"),
        format!(r"\b(?:int|char|float|double|long|short|bool|string|auto|unsigned)\s+{name}\s*\[\s*([^\]]+)\]"),
        format!(r"\bvar\s+{name}\s+\[\s*(\w+)\s*\]"),
    ];
    for src in &sized {
        if let Some(caps) = pattern(src).captures(masked) {
            let size = linear(&caps[1])?;
            return Some(match size.var {
                None => TripCount::literal(size.constant),
                Some(var) => TripCount {
                    bound: BoundExpr::Identifier(var),
                    offset: size.constant,
                    stride: 1,
                },
            });
        }
    }

    let listed = pattern(&format!(
        r"\$?\b{name}\s*(?:\[\s*\w*\s*\])?\s*(?::[^=\n]+)?(?::=|=|<-)\s*(?:new\s+[\w<>.]+\s*\[\s*\]\s*|\[\s*\d*\s*\][\w.]+\s*|array\s*|c\s*|list\s*|Arrays\.asList\s*|List\.of\s*)?[\[({{]"
    ));
    let found = listed.find(masked)?;
    let open = found.end() - 1;
    let close = matching_close(masked, open)?;
    let count = arguments(&masked[open + 1..close]).len();
    (count > 0).then(|| TripCount::literal(count as i64))
}

/// Trip count of an enhanced loop over `expr`: a named collection, an inline
/// list literal, or anything else as an opaque bound.
pub fn collection_trip(masked: &str, expr: &str) -> TripCount {
    let expr = expr.trim();
    let name = expr.trim_start_matches('$');
    if is_identifier(name) {
        return collection_size(masked, name).unwrap_or_else(|| TripCount::opaque(expr));
    }
    if let Some(open) = expr.find(['[', '(', '{']) {
        let head = expr[..open].trim();
        let whole = matching_close(expr, open) == Some(expr.len() - 1);
        if whole && matches!(head, "" | "c" | "array" | "list") {
            let count = arguments(&expr[open + 1..expr.len() - 1]).len();
            return TripCount::literal(count as i64);
        }
    }
    TripCount::opaque(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_trip() {
        assert_eq!(collection_trip("", "[1, 2, 3]"), TripCount::literal(3));
        assert_eq!(collection_trip("", "c(1, 2)"), TripCount::literal(2));
        assert_eq!(collection_trip("xs = [1, 2]", "xs"), TripCount::literal(2));
        assert_eq!(collection_trip("", "input().split()").bound, BoundExpr::Opaque("input().split()".into()));
        assert_eq!(collection_trip("", "names").bound, BoundExpr::Opaque("names".into()));
    }

    #[test]
    fn test_collection_size() {
        let masked = "int[] xs = new int[n];\nnames := make([]string, 3)\nys = [1, 2, 3]";
        assert_eq!(
            collection_size(masked, "xs").unwrap().bound,
            BoundExpr::Identifier("n".into())
        );
        assert_eq!(collection_size(masked, "names"), Some(TripCount::literal(3)));
        assert_eq!(collection_size(masked, "ys"), Some(TripCount::literal(3)));
        assert_eq!(collection_size("v <- c(4, 5)", "v"), Some(TripCount::literal(2)));
        assert_eq!(collection_size("$a = array(1, 2, 3);", "$a"), Some(TripCount::literal(3)));
        assert_eq!(collection_size("xs = []", "xs"), None);
        assert_eq!(collection_size("xs = load()", "xs"), None);
    }

    fn ident(name: &str, offset: i64) -> TripCount {
        TripCount {
            bound: BoundExpr::Identifier(name.into()),
            offset,
            stride: 1,
        }
    }

    #[test]
    fn test_linear_forms() {
        assert_eq!(linear("5").unwrap().constant, 5);
        let l = linear("(n - 1)").unwrap();
        assert_eq!(l.var.as_deref(), Some("n"));
        assert_eq!(l.constant, -1);
        assert_eq!(linear("$n").unwrap().var.as_deref(), Some("n"));
        assert_eq!(linear("1 + n").unwrap().constant, 1);
        assert!(linear("arr.length").is_none());
        assert!(linear("len(xs)").is_none());
    }

    #[test]
    fn test_ascending_header() {
        let h = c_style_header("int i = 0; i < n; i++").unwrap();
        assert_eq!(h.variable, "i");
        assert_eq!(h.trip, ident("n", 0));
        assert_eq!(h.direction, Direction::Ascending);

        let h = c_style_header("int i = 1; i <= n; ++i").unwrap();
        assert_eq!(h.trip, ident("n", 0));
    }

    #[test]
    fn test_descending_header() {
        let h = c_style_header("int i = n; i > 0; i--").unwrap();
        assert_eq!(h.trip, ident("n", 0));
        assert_eq!(h.direction, Direction::Descending);

        let h = c_style_header("i = n - 1; i >= 0; i -= 1").unwrap();
        assert_eq!(h.trip, ident("n", 0));
    }

    #[test]
    fn test_step_must_agree_with_comparison() {
        assert!(c_style_header("int i = 0; i < n; i--").is_none());
        assert!(c_style_header("int i = n; i > 0; i++").is_none());
        assert!(c_style_header("int i = 1; i < n; i *= 2").is_none());
        assert!(c_style_header("int i = 0; j < n; i++").is_none());
    }

    #[test]
    fn test_typed_and_sigil_headers() {
        let h = c_style_header("let i: number = 0; i < count; i += 2").unwrap();
        assert_eq!(h.trip.stride, 2);
        assert_eq!(h.trip.iterations(5), 3);

        let h = c_style_header("$i = 0; $i < $n; $i++").unwrap();
        assert_eq!(h.variable, "i");
        assert_eq!(h.trip, ident("n", 0));

        let h = c_style_header("i := 0; i < 10; i++").unwrap();
        assert_eq!(h.trip, TripCount::literal(10));
    }

    #[test]
    fn test_reversed_condition() {
        let h = c_style_header("int i = 0; n > i; i++").unwrap();
        assert_eq!(h.trip, ident("n", 0));
    }

    #[test]
    fn test_opaque_limit() {
        let h = c_style_header("int i = 0; i < arr.length; i++").unwrap();
        assert_eq!(h.trip.bound, BoundExpr::Opaque("arr.length".into()));
    }

    #[test]
    fn test_python_range() {
        let (trip, dir) = python_range("n, 0, -1").unwrap();
        assert_eq!(trip, ident("n", 0));
        assert_eq!(dir, Direction::Descending);

        let (trip, _) = python_range("1, n + 1").unwrap();
        assert_eq!(trip, ident("n", 0));

        let (trip, _) = python_range("0, 10, 3").unwrap();
        assert_eq!(trip.iterations(10), 4);
    }

    #[test]
    fn test_extreme_literals_leave_count_unknown() {
        let h = c_style_header("int i = 9223372036854775807; i >= -9223372036854775807; i--").unwrap();
        assert_eq!(h.trip.bound, BoundExpr::Opaque("9223372036854775807".into()));
        assert_eq!(h.direction, Direction::Descending);

        let (trip, _) = python_range("-9000000000000000000, 9000000000000000000").unwrap();
        assert_eq!(trip.bound, BoundExpr::Opaque("9000000000000000000".into()));

        let (trip, _) = python_range("-9000000000000000000, n").unwrap();
        assert_eq!(trip, ident("n", 9000000000000000000));
        let (trip, _) = python_range("-9223372036854775807, 9223372036854775807 + n").unwrap();
        assert!(matches!(trip.bound, BoundExpr::Opaque(_)));
    }

    #[test]
    fn test_r_sequence() {
        let (trip, dir) = r_sequence("1", "n").unwrap();
        assert_eq!(trip, ident("n", 0));
        assert_eq!(dir, Direction::Ascending);

        let (trip, dir) = r_sequence("n", "1").unwrap();
        assert_eq!(trip, ident("n", 0));
        assert_eq!(dir, Direction::Descending);

        let (trip, _) = r_sequence("5", "1").unwrap();
        assert_eq!(trip, TripCount::literal(5));
    }
}
