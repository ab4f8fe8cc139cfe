//! SQL scripts run as a batch: no loops and no stdin reads

use super::{Grammar, InputSite, Language, LiteralBinding, LoopSignature, OutputStatement};

#[derive(Debug, Default)]
pub struct SqlGrammar;

impl SqlGrammar {
    pub fn new() -> Self {
        SqlGrammar
    }
}

impl Grammar for SqlGrammar {
    fn language(&self) -> Language {
        Language::Sql
    }

    fn find_primary_loop_from(&self, _source: &str, _from: usize) -> Option<LoopSignature> {
        None
    }

    fn find_enhanced_loop_from(&self, _source: &str, _from: usize) -> Option<LoopSignature> {
        None
    }

    fn find_do_while_from(&self, _source: &str, _from: usize) -> Option<LoopSignature> {
        None
    }

    fn find_input_sites(&self, _source: &str) -> Vec<InputSite> {
        Vec::new()
    }

    fn find_output_statements(&self, _source: &str) -> Vec<OutputStatement> {
        Vec::new()
    }

    fn find_literal_bindings(&self, _source: &str) -> Vec<LiteralBinding> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_never_demands_input() {
        let src = "SELECT name FROM users WHERE id = 1;\n-- for (i = 0; i < n; i++)";
        let grammar = SqlGrammar::new();
        assert!(grammar.find_primary_loop(src).is_none());
        assert!(grammar.find_input_sites(src).is_empty());
    }
}
