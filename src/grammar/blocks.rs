//! Loop body delimitation
//!
//! Bodies are located on masked text so braces inside strings or comments
//! never count. Three shapes are recognised:
//! - a `{ ... }` block (the span covers the text between the braces)
//! - a single unbraced statement after a header (`for (...) x = read();`)
//! - a Python indentation block, or the rest of the header line after `:`

use super::lexical::{indentation, line_end, matching_close, skip_ws};
use super::Span;

/// Body following a loop header that ends at `after`
pub fn braced_or_statement(masked: &str, after: usize, newline_ends: bool) -> Option<Span> {
    let start = skip_ws(masked, after);
    if start >= masked.len() {
        return None;
    }
    if masked.as_bytes()[start] == b'{' {
        return braced(masked, start);
    }
    statement(masked, start, newline_ends)
}

/// Contents of the block whose `{` sits at `open`
pub fn braced(masked: &str, open: usize) -> Option<Span> {
    let close = matching_close(masked, open)?;
    Some(Span::new(open + 1, close))
}

/// One statement starting at `start`. A nested header (`for (...) if (...) x;`)
/// is swallowed together with its own body.
fn statement(masked: &str, start: usize, newline_ends: bool) -> Option<Span> {
    let bytes = masked.as_bytes();
    let mut depth = 0i32;

    for (idx, &b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'(' | b'[' => depth += 1,
            b')' | b']' => {
                depth -= 1;
                if depth < 0 {
                    return Some(Span::new(start, idx));
                }
            }
            b'{' if depth == 0 => {
                let close = matching_close(masked, idx)?;
                return Some(Span::new(start, close + 1));
            }
            b'}' if depth == 0 => return Some(Span::new(start, idx)),
            b';' if depth == 0 => return Some(Span::new(start, idx + 1)),
            b'\n' if depth == 0 && newline_ends && idx > start => {
                return Some(Span::new(start, idx));
            }
            _ => {}
        }
    }
    Some(Span::new(start, bytes.len()))
}

/// Body of an indentation block whose header ends with the `:` at `colon`
pub fn indented(masked: &str, colon: usize) -> Option<Span> {
    let header_indent = indentation(masked, colon);
    let eol = line_end(masked, colon);
    if !masked[colon + 1..eol].trim().is_empty() {
        return Some(Span::new(colon + 1, eol));
    }

    let mut end = None;
    let mut pos = eol;
    while pos < masked.len() {
        let start = pos + 1;
        let stop = line_end(masked, start);
        let line = &masked[start..stop];
        if !line.trim().is_empty() {
            let indent = line.len() - line.trim_start().len();
            if indent <= header_indent {
                break;
            }
            end = Some(stop);
        }
        pos = stop;
    }
    end.map(|e| Span::new(eol, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_braced_body() {
        let src = "for (;;) { a(); { b(); } } tail";
        let body = braced_or_statement(src, 8, false).unwrap();
        assert_eq!(&src[body.start..body.end], " a(); { b(); } ");
    }

    #[test]
    fn test_single_statement_body() {
        let src = "for(int i=0;i<n;i++) sc.nextLine();\nnext();";
        let after = src.find(')').unwrap() + 1;
        let body = braced_or_statement(src, after, false).unwrap();
        assert_eq!(&src[body.start..body.end], "sc.nextLine();");
    }

    #[test]
    fn test_statement_swallows_nested_header() {
        let src = "for (i) for (j) read(x); done();";
        let body = braced_or_statement(src, 7, false).unwrap();
        assert_eq!(&src[body.start..body.end], "for (j) read(x);");
    }

    #[test]
    fn test_newline_terminated_statement() {
        let src = "for (i in 1:n) x <- readline()\ny <- 2";
        let body = braced_or_statement(src, 14, true).unwrap();
        assert_eq!(&src[body.start..body.end], "x <- readline()");
    }

    #[test]
    fn test_indented_block() {
        let src = "for i in range(n):\n    a = input()\n\n    b = input()\nprint(a)";
        let colon = src.find(':').unwrap();
        let body = indented(src, colon).unwrap();
        let text = &src[body.start..body.end];
        assert!(text.contains("a = input()"));
        assert!(text.contains("b = input()"));
        assert!(!text.contains("print"));
    }

    #[test]
    fn test_inline_suite() {
        let src = "for i in range(n, 0, -1): x = int(input(\"T-minus: \"))\nprint(x)";
        let colon = src.find(": x").unwrap();
        let body = indented(src, colon).unwrap();
        assert_eq!(src[body.start..body.end].trim(), "x = int(input(\"T-minus: \"))");
    }

    #[test]
    fn test_unbalanced_block_has_no_body() {
        assert_eq!(braced_or_statement("for (;;) { a();", 8, false), None);
    }
}
