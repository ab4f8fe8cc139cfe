//! Structural extraction: at most one top-level loop, at most one nested loop,
//! and every input site tagged with its position relative to them.

use crate::grammar::{Grammar, InputSite, LiteralBinding, LoopSignature};
use tracing::debug;

/// Everything the demand calculation needs from one source text
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub top_loop: Option<LoopSignature>,
    /// Spans are in whole-source coordinates
    pub nested_loop: Option<LoopSignature>,
    /// In source order
    pub sites: Vec<InputSite>,
    /// `name = <integer>` assignments whose names are never read from input,
    /// in source order
    pub literal_bindings: Vec<LiteralBinding>,
}

impl Structure {
    /// Number of sites inside the top-level loop body
    pub fn loop_inputs(&self) -> usize {
        self.sites.iter().filter(|s| s.inside_loop).count()
    }

    /// Value of the last literal assignment to `name` ahead of `offset`
    pub fn literal_before(&self, name: &str, offset: usize) -> Option<i64> {
        self.literal_bindings
            .iter()
            .rev()
            .find(|b| b.name == name && b.at < offset)
            .map(|b| b.value)
    }
}

/// Pick the top-level loop: the first candidate in priority order (primary,
/// then enhanced, then do-while) whose body reads input, else the first
/// candidate. The chosen loop's body is re-scanned for a nested loop.
pub fn extract(grammar: &dyn Grammar, source: &str) -> Structure {
    let mut sites = grammar.find_input_sites(source);

    let candidates = grammar.find_loop_candidates(source);
    let reads_input = |sig: &LoopSignature| {
        sig.body
            .is_some_and(|b| sites.iter().any(|site| b.contains(site.span.start)))
    };
    let chosen = candidates.iter().position(reads_input).unwrap_or(0);
    if candidates.len() > 1 {
        debug!(candidates = candidates.len(), chosen, "several top-level loops");
    }
    let top_loop = candidates.into_iter().nth(chosen);

    let nested_loop = top_loop
        .as_ref()
        .and_then(|top| top.body)
        .and_then(|body| {
            grammar
                .find_nested_loop(&source[body.start..body.end])
                .map(|inner| inner.offset_by(body.start))
        });

    let top_body = top_loop.as_ref().and_then(|l| l.body);
    let nested_body = nested_loop.as_ref().and_then(|l| l.body);
    let mut ordinal = 0;
    for site in &mut sites {
        site.inside_loop = top_body.is_some_and(|b| b.contains(site.span.start));
        site.inside_nested = site.inside_loop && nested_body.is_some_and(|b| b.contains(site.span.start));
        if site.inside_loop {
            site.ordinal_within_loop_body = Some(ordinal);
            ordinal += 1;
        }
    }

    let mut literal_bindings = grammar.find_literal_bindings(source);
    literal_bindings.retain(|b| {
        !sites
            .iter()
            .any(|site| site.target.as_deref() == Some(b.name.as_str()))
    });

    if let Some(top) = &top_loop {
        debug!(
            language = %grammar.language(),
            kind = ?top.kind,
            bound = %top.bound_expression(),
            nested = nested_loop.is_some(),
            "loop recognised"
        );
        if top.body.is_none() {
            debug!("loop body could not be delimited");
        }
    }
    debug!(sites = sites.len(), loop_inputs = ordinal, "input sites tagged");

    Structure {
        top_loop,
        nested_loop,
        sites,
        literal_bindings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GrammarRegistry, LoopKind};

    fn structure(tag: &str, source: &str) -> Structure {
        let grammar = GrammarRegistry::shared().lookup(tag).unwrap();
        extract(grammar, source)
    }

    #[test]
    fn test_no_loop_sites_are_unconditional() {
        let s = structure("python", "a = input()\nb = input()\n");
        assert!(s.top_loop.is_none());
        assert_eq!(s.sites.len(), 2);
        assert!(s.sites.iter().all(|site| !site.inside_loop));
    }

    #[test]
    fn test_primary_preferred_over_enhanced() {
        let src = "for x in xs:\n    pass\nfor i in range(3):\n    v = input()\n";
        let s = structure("python", src);
        assert_eq!(s.top_loop.as_ref().unwrap().kind, LoopKind::Primary);
        assert_eq!(s.loop_inputs(), 1);
    }

    #[test]
    fn test_nested_loop_tagging() {
        let src = "#include <stdio.h>\nint main() {\n  int r, c, v;\n  scanf(\"%d %d\", &r, &c);\n  for (int i = 0; i < r; i++) {\n    for (int j = 0; j < c; j++) {\n      scanf(\"%d\", &v);\n    }\n  }\n}\n";
        let s = structure("c", src);
        let nested = s.nested_loop.as_ref().unwrap();
        assert_eq!(nested.bound_expression(), "c");
        let nested_body = nested.body.unwrap();
        assert!(src[nested_body.start..nested_body.end].contains("&v"));

        assert_eq!(s.sites.len(), 3);
        assert!(!s.sites[0].inside_loop);
        assert!(s.sites[2].inside_loop && s.sites[2].inside_nested);
        assert_eq!(s.sites[2].ordinal_within_loop_body, Some(0));
    }

    #[test]
    fn test_input_targets_shadow_literal_bindings() {
        let src = "n = 3\nk = 4\nn = int(input())\n";
        let s = structure("python", src);
        assert_eq!(s.literal_before("k", src.len()), Some(4));
        assert_eq!(s.literal_before("n", src.len()), None);
    }

    #[test]
    fn test_literal_before_ignores_later_assignments() {
        let src = "n = 3\nfor i in range(n):\n    x = input()\nn = 10\n";
        let s = structure("python", src);
        let header = s.top_loop.as_ref().unwrap().header.start;
        assert_eq!(s.literal_before("n", header), Some(3));
        assert_eq!(s.literal_before("n", src.len()), Some(10));
    }

    #[test]
    fn test_loop_reading_input_preferred() {
        let src = "n = int(input(\"n: \"))\nfor i in range(3):\n    print(i)\nfor j in range(n):\n    x = input(\"x: \")\n";
        let s = structure("python", src);
        let top = s.top_loop.as_ref().unwrap();
        assert_eq!(top.variable.as_deref(), Some("j"));
        assert_eq!(top.bound_expression(), "n");
        assert_eq!(s.loop_inputs(), 1);

        let c_src = "int main() {\n  int n, x;\n  scanf(\"%d\", &n);\n  for (int i = 0; i < 3; i++) {\n    printf(\"%d\\n\", i);\n  }\n  for (int j = 0; j < n; j++) {\n    scanf(\"%d\", &x);\n  }\n}\n";
        let s = structure("c", c_src);
        assert_eq!(s.top_loop.as_ref().unwrap().variable.as_deref(), Some("j"));
        assert_eq!(s.loop_inputs(), 1);
    }

    #[test]
    fn test_first_loop_kept_when_none_reads_input() {
        let src = "for i in range(3):\n    print(i)\nfor j in range(5):\n    print(j)\n";
        let s = structure("python", src);
        assert_eq!(s.top_loop.unwrap().variable.as_deref(), Some("i"));
    }
}
