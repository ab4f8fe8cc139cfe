//! Language detection from a file name or from the source text itself
//!
//! Content detection scores weighted markers per language and reports the
//! best match together with its share of the total score as a confidence.

use super::{pattern, Language};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub language: Language,
    /// Share of the total marker score, in `0.0..=1.0`
    pub confidence: f32,
}

/// Language for a file extension such as `.py` or `.cpp`
pub fn from_extension(path: &Path) -> Option<Language> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let language = match ext.as_str() {
        "py" | "pyw" => Language::Python,
        "js" | "mjs" | "cjs" => Language::JavaScript,
        "ts" | "mts" => Language::TypeScript,
        "java" => Language::Java,
        "c" | "h" => Language::C,
        "cpp" | "cc" | "cxx" | "hpp" | "c++" => Language::Cpp,
        "go" => Language::Go,
        "php" => Language::Php,
        "r" => Language::R,
        "sql" => Language::Sql,
        _ => return None,
    };
    Some(language)
}

struct Marker {
    language: Language,
    weight: u32,
    pattern: Regex,
}

fn markers() -> &'static [Marker] {
    static MARKERS: OnceLock<Vec<Marker>> = OnceLock::new();
    MARKERS.get_or_init(|| {
        let table: &[(Language, u32, &str)] = &[
            (Language::Php, 10, r"<\?php"),
            (Language::Php, 2, r"\$\w+\s*="),
            (Language::Php, 2, r"\becho\b"),
            (Language::Go, 10, r"(?m)^package\s+main\b"),
            (Language::Go, 4, r"\bfmt\.\w+\("),
            (Language::Go, 3, r":=|\bfunc\s+\w+\("),
            (Language::Cpp, 6, r"#include\s*<(?:iostream|vector|string|bits/stdc\+\+\.h)>"),
            (Language::Cpp, 5, r"\bstd::|\bcout\s*<<|\bcin\s*>>"),
            (Language::Cpp, 2, r"using\s+namespace\s+std"),
            (Language::C, 4, r"#include\s*<(?:stdio|stdlib|string|math)\.h>"),
            (Language::C, 3, r"\bprintf\s*\(|\bscanf\s*\("),
            (Language::Java, 8, r"\bpublic\s+(?:final\s+)?class\b"),
            (Language::Java, 6, r"\bSystem\.out\.print"),
            (Language::Java, 4, r"public\s+static\s+void\s+main"),
            (Language::Python, 5, r"(?m)^\s*def\s+\w+\s*\(.*\)\s*:"),
            (Language::Python, 3, r"\bprint\s*\("),
            (Language::Python, 4, r"(?m)^\s*(?:import|from)\s+\w+|\binput\s*\(|:\s*$"),
            (Language::R, 5, r"<-"),
            (Language::R, 4, r"\b(?:cat|readline|library)\s*\("),
            (Language::Sql, 8, r"(?i)\b(?:select\s+.+\s+from|insert\s+into|create\s+table|update\s+\w+\s+set)\b"),
            (Language::TypeScript, 6, r":\s*(?:number|string|boolean)\b|\binterface\s+\w+"),
            (Language::JavaScript, 5, r"\bconsole\.log\s*\("),
            (Language::JavaScript, 3, r"\b(?:const|let)\s+\w+\s*="),
            (Language::JavaScript, 2, r"=>|\bfunction\b"),
        ];
        table
            .iter()
            .map(|&(language, weight, src)| Marker {
                language,
                weight,
                pattern: pattern(src),
            })
            .collect()
    })
}

/// Best guess from content markers; `None` when nothing matches
pub fn detect(source: &str) -> Option<Detection> {
    let mut scores = [0u32; Language::ALL.len()];
    for marker in markers() {
        if marker.pattern.is_match(source) {
            let slot = Language::ALL.iter().position(|&l| l == marker.language)?;
            scores[slot] += marker.weight;
        }
    }

    // TypeScript is JavaScript with annotations
    let ts = Language::ALL.iter().position(|&l| l == Language::TypeScript)?;
    let js = Language::ALL.iter().position(|&l| l == Language::JavaScript)?;
    if scores[ts] > 0 {
        scores[ts] += scores[js];
    }

    let total: u32 = scores.iter().sum();
    let (best, &score) = scores.iter().enumerate().max_by_key(|&(_, s)| *s)?;
    if score == 0 {
        return None;
    }
    Some(Detection {
        language: Language::ALL[best],
        confidence: score as f32 / total as f32,
    })
}
