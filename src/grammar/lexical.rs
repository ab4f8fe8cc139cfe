//! Comment/string masking and small text scanning helpers
//!
//! Recognisers run over a *masked* copy of the source: comment text and the
//! contents of string literals are replaced by spaces of the same byte length,
//! quote characters and newlines are kept. Offsets found in the masked copy
//! therefore index the original text directly, which is where literal prompt
//! text is read from.

use super::{pattern, Span};
use regex::Regex;
use std::sync::OnceLock;

/// Comment and quoting conventions of one language
#[derive(Debug, Clone, Copy)]
pub struct Lexicon {
    pub line_comments: &'static [&'static str],
    pub block_comment: Option<(&'static str, &'static str)>,
    pub quotes: &'static [char],
    /// Quotes whose literals may run across lines (template and raw strings)
    pub multiline_quotes: &'static [char],
    /// Python-style `"""` / `'''` literals
    pub triple_quotes: bool,
}

impl Lexicon {
    pub const C_LIKE: Lexicon = Lexicon {
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        quotes: &['"', '\''],
        multiline_quotes: &[],
        triple_quotes: false,
    };

    pub const JAVASCRIPT: Lexicon = Lexicon {
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        quotes: &['"', '\'', '`'],
        multiline_quotes: &['`'],
        triple_quotes: false,
    };

    pub const GO: Lexicon = Lexicon {
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        quotes: &['"', '\'', '`'],
        multiline_quotes: &['`'],
        triple_quotes: false,
    };

    pub const PHP: Lexicon = Lexicon {
        line_comments: &["//", "#"],
        block_comment: Some(("/*", "*/")),
        quotes: &['"', '\''],
        multiline_quotes: &['"', '\''],
        triple_quotes: false,
    };

    pub const PYTHON: Lexicon = Lexicon {
        line_comments: &["#"],
        block_comment: None,
        quotes: &['"', '\''],
        multiline_quotes: &[],
        triple_quotes: true,
    };

    pub const R: Lexicon = Lexicon {
        line_comments: &["#"],
        block_comment: None,
        quotes: &['"', '\''],
        multiline_quotes: &['"', '\''],
        triple_quotes: false,
    };

    pub const SQL: Lexicon = Lexicon {
        line_comments: &["--"],
        block_comment: Some(("/*", "*/")),
        quotes: &['\''],
        multiline_quotes: &['\''],
        triple_quotes: false,
    };

    /// Blank comments and string contents, preserving byte offsets
    pub fn mask(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len());
        let mut i = 0;

        while i < source.len() {
            let tail = &source[i..];

            if self.line_comments.iter().any(|tok| tail.starts_with(*tok)) {
                let end = tail.find('\n').map_or(source.len(), |n| i + n);
                blank_into(&mut out, &source[i..end]);
                i = end;
                continue;
            }

            if let Some((open, close)) = self.block_comment {
                if tail.starts_with(open) {
                    let end = tail[open.len()..]
                        .find(close)
                        .map_or(source.len(), |n| i + open.len() + n + close.len());
                    blank_into(&mut out, &source[i..end]);
                    i = end;
                    continue;
                }
            }

            let Some(c) = tail.chars().next() else { break };

            if self.quotes.contains(&c) {
                let delim_len = if self.is_triple(tail, c) { 3 } else { 1 };
                let (content_end, close_end) = self.string_end(source, i, c, delim_len);
                out.push_str(&source[i..i + delim_len]);
                blank_into(&mut out, &source[i + delim_len..content_end]);
                out.push_str(&source[content_end..close_end]);
                i = close_end;
                continue;
            }

            out.push(c);
            i += c.len_utf8();
        }

        out
    }

    fn is_triple(&self, tail: &str, quote: char) -> bool {
        self.triple_quotes && tail.chars().take(3).filter(|&c| c == quote).count() == 3
    }

    /// Returns (end of contents, end of closing delimiter). Unterminated
    /// single-line literals stop at the newline.
    fn string_end(&self, source: &str, start: usize, quote: char, delim_len: usize) -> (usize, usize) {
        let multiline = delim_len == 3 || self.multiline_quotes.contains(&quote);
        let mut chars = source[start + delim_len..].char_indices();

        while let Some((off, c)) = chars.next() {
            let at = start + delim_len + off;
            if c == '\\' {
                chars.next();
                continue;
            }
            if c == '\n' && !multiline {
                return (at, at);
            }
            if c == quote {
                if delim_len == 1 {
                    return (at, at + 1);
                }
                let closing: String = std::iter::repeat(quote).take(3).collect();
                if source[at..].starts_with(&closing) {
                    return (at, at + 3);
                }
            }
        }
        (source.len(), source.len())
    }
}

fn blank_into(out: &mut String, text: &str) {
    for c in text.chars() {
        if c == '\n' {
            out.push('\n');
        } else {
            out.extend(std::iter::repeat(' ').take(c.len_utf8()));
        }
    }
}

/// String literal starting at `pos` in the original text.
///
/// `pos` must point at a quote character that the masked copy kept.
/// Returns the unescaped contents and the offset just past the closing quote.
pub fn literal_at(original: &str, masked: &str, pos: usize) -> Option<(String, usize)> {
    let quote = masked[pos..].chars().next()?;
    if !matches!(quote, '"' | '\'' | '`') {
        return None;
    }
    let triple: String = std::iter::repeat(quote).take(3).collect();
    let delim_len = if masked[pos..].starts_with(&triple) && original[pos..].starts_with(&triple) {
        3
    } else {
        1
    };
    let body_start = pos + delim_len;
    let found = if delim_len == 3 {
        masked[body_start..].find(&triple)
    } else {
        masked[body_start..].find(quote)
    };
    let close = body_start + found?;

    let text = unescape(&original[body_start..close]);
    Some((text, close + delim_len))
}

/// Resolve the common backslash escapes found in prompt strings
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => {}
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// The sole string-literal argument starting at `pos` (after `(` or a keyword).
///
/// Returns `None` when the argument is not a lone literal, e.g. a variable or
/// a concatenation. `prefixes` lists letters allowed before the opening quote
/// (`f`, `r` in Python).
pub fn sole_literal(original: &str, masked: &str, pos: usize, prefixes: &str) -> Option<String> {
    let mut at = skip_ws(masked, pos);
    let bytes = masked.as_bytes();
    let mut taken = 0;
    while at < masked.len() && taken < 2 && prefixes.contains(bytes[at] as char) {
        at += 1;
        taken += 1;
    }
    let (text, end) = literal_at(original, masked, at)?;

    let after = skip_inline_ws(masked, end);
    let rest = &masked[after..];
    let terminated = rest.is_empty()
        || rest.starts_with([')', ',', ';', '\n', '\r'])
        || rest.starts_with("<<")
        || rest.starts_with("?>");
    terminated.then(|| text.trim_end_matches(['\n', '\r']).to_string())
}

/// Index of the bracket closing the one at `open`
pub fn matching_close(masked: &str, open: usize) -> Option<usize> {
    let bytes = masked.as_bytes();
    let mut depth = 0usize;
    for (idx, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Byte ranges of `text` split on `sep` outside any brackets
pub fn split_top_level(text: &str, sep: u8) -> Vec<(usize, usize)> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, &b) in text.as_bytes().iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            _ if b == sep && depth == 0 => {
                parts.push((start, idx));
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push((start, text.len()));
    parts
}

/// Non-empty top-level arguments of `text` as trimmed slices paired with
/// their offset within `text`
pub fn arguments(text: &str) -> Vec<(usize, &str)> {
    split_top_level(text, b',')
        .into_iter()
        .filter_map(|(s, e)| {
            let raw = &text[s..e];
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| (s + raw.len() - raw.trim_start().len(), trimmed))
        })
        .collect()
}

pub fn skip_ws(text: &str, pos: usize) -> usize {
    let rest = &text[pos.min(text.len())..];
    pos + (rest.len() - rest.trim_start().len())
}

fn skip_inline_ws(text: &str, pos: usize) -> usize {
    let rest = &text[pos.min(text.len())..];
    pos + (rest.len() - rest.trim_start_matches([' ', '\t']).len())
}

pub fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map_or(0, |n| n + 1)
}

pub fn line_end(text: &str, pos: usize) -> usize {
    text[pos..].find('\n').map_or(text.len(), |n| pos + n)
}

/// Width of the leading whitespace of the line containing `pos`
pub fn indentation(text: &str, pos: usize) -> usize {
    let start = line_start(text, pos);
    let line = &text[start..line_end(text, start)];
    line.len() - line.trim_start().len()
}

/// Start of the statement containing `pos` on its line
pub fn statement_start(masked: &str, pos: usize) -> usize {
    masked[..pos]
        .rfind(['\n', ';', '{', '}'])
        .map_or(0, |n| n + 1)
}

/// Variable assigned from an input call starting at `site_start`.
///
/// Handles `int n = sc.nextInt()`, `n = int(input())`, `n <- as.integer(readline())`,
/// `$n = (int)readline()`, `text, _ := reader.ReadString('\n')`.
pub fn assignment_target(masked: &str, site_start: usize) -> Option<String> {
    static TARGET: OnceLock<Regex> = OnceLock::new();
    let re = TARGET.get_or_init(|| {
        pattern(
            r"(\$?[A-Za-z_]\w*)(?:\s*,\s*\$?\w+)*\s*(?:\[[^\]]*\]\s*)?(?::\s*[\w\[\]<>]+\s*)?(?:=|<-|:=)\s*(?:\(\s*\w+\s*\)\s*)?(?:[A-Za-z_][\w.:]*\s*\(\s*)*$",
        )
    });
    let from = statement_start(masked, site_start);
    let prefix = &masked[from..site_start];
    re.captures(prefix)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_start_matches('$').to_string())
}

/// Base identifier of a destination argument: `&arr[i]` → `arr`, `$n` → `n`
pub fn destination_name(arg: &str) -> Option<String> {
    let stripped = arg.trim().trim_start_matches(['&', '*', '$', ' ']);
    let name: String = stripped
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    is_identifier(&name).then_some(name)
}

pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Span of a `(`-terminated call match through its closing parenthesis
pub fn call_span(masked: &str, start: usize, open: usize) -> Span {
    let end = matching_close(masked, open).map_or(open + 1, |close| close + 1);
    Span::new(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_preserves_offsets() {
        let src = "x = 1 // for (i = 0; i < n; i++)\ny = \"for\"; /* input() */ z";
        let masked = Lexicon::C_LIKE.mask(src);
        assert_eq!(masked.len(), src.len());
        assert!(!masked.contains("for"));
        assert!(!masked.contains("input"));
        assert!(masked.contains("y = \"   \";"));
        assert!(masked.ends_with(" z"));
    }

    #[test]
    fn test_mask_python_triple_quotes() {
        let src = "s = \"\"\"for i in range(3):\n  input()\"\"\"\nn = input()";
        let masked = Lexicon::PYTHON.mask(src);
        assert_eq!(masked.len(), src.len());
        assert_eq!(masked.matches("input").count(), 1);
    }

    #[test]
    fn test_mask_handles_escaped_quote() {
        let src = r#"print("say \"hi\"") ; x"#;
        let masked = Lexicon::PYTHON.mask(src);
        assert!(masked.ends_with("\") ; x"));
    }

    #[test]
    fn test_sole_literal_rejects_concatenation() {
        let src = r#"print("Total: " + str(x))"#;
        let masked = Lexicon::PYTHON.mask(src);
        assert_eq!(sole_literal(src, &masked, 6, "fFrR"), None);

        let src = r#"print("Enter name: ")"#;
        let masked = Lexicon::PYTHON.mask(src);
        assert_eq!(
            sole_literal(src, &masked, 6, "fFrR").as_deref(),
            Some("Enter name: ")
        );
    }

    #[test]
    fn test_sole_literal_strips_trailing_newline() {
        let src = r#"printf("Enter n:\n");"#;
        let masked = Lexicon::C_LIKE.mask(src);
        assert_eq!(sole_literal(src, &masked, 7, "").as_deref(), Some("Enter n:"));
    }

    #[test]
    fn test_assignment_target_shapes() {
        let cases = [
            ("int n = sc.nextInt();", "sc", "n"),
            ("x = int(input())", "input", "x"),
            ("n <- as.integer(readline())", "readline", "n"),
            ("$n = (int)readline();", "readline", "n"),
            ("text, _ := reader.ReadString('\\n')", "reader", "text"),
        ];
        for (src, call, expected) in cases {
            let masked = Lexicon::C_LIKE.mask(src);
            let at = src.find(call).unwrap();
            assert_eq!(assignment_target(&masked, at).as_deref(), Some(expected), "{}", src);
        }
    }

    #[test]
    fn test_assignment_target_ignores_comparison() {
        let src = "if (a == input())";
        let at = src.find("input").unwrap();
        assert_eq!(assignment_target(src, at), None);
    }

    #[test]
    fn test_arguments_and_destinations() {
        let args = arguments(r#""%d %d", &a, &arr[i]"#);
        assert_eq!(args.len(), 3);
        assert_eq!(destination_name(args[1].1).as_deref(), Some("a"));
        assert_eq!(destination_name(args[2].1).as_deref(), Some("arr"));
    }

    #[test]
    fn test_matching_close_nested() {
        let text = "f(a, (b), [c])";
        assert_eq!(matching_close(text, 1), Some(13));
        assert_eq!(matching_close("(()", 0), None);
    }
}
