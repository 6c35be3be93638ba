//! Semantic analyzer - both passes over one syntax tree

use super::binder::build_symtab;
use super::checker::type_check;
use super::listing;
use super::scope::{ScopeDirectory, ScopeId};
use crate::common::{CompileResult, SemanticError};
use crate::frontend::ast::SyntaxTree;

/// Everything semantic analysis learned about a program
#[derive(Debug)]
pub struct Analysis {
    scopes: ScopeDirectory,
    global: ScopeId,
    errors: Vec<SemanticError>,
}

impl Analysis {
    pub fn new(scopes: ScopeDirectory, global: ScopeId, errors: Vec<SemanticError>) -> Self {
        Self { scopes, global, errors }
    }

    pub fn scopes(&self) -> &ScopeDirectory {
        &self.scopes
    }

    pub fn global(&self) -> ScopeId {
        self.global
    }

    /// Diagnostics from both passes, in the order they were found
    pub fn errors(&self) -> &[SemanticError] {
        &self.errors
    }

    /// Set once any semantic error has been reported
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(super) fn extend_errors(&mut self, errors: Vec<SemanticError>) {
        self.errors.extend(errors);
    }
}

/// Runs symbol table construction followed by type checking
pub struct SemanticAnalyzer {
    trace: bool,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self { trace: false }
    }

    /// Print the symbol listings to stderr once the tables are built
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Analyze a parsed program.
    ///
    /// User errors are collected in the returned `Analysis`; `Err` means an
    /// internal invariant of the analyzer itself was broken.
    pub fn analyze(&self, tree: &mut SyntaxTree) -> CompileResult<Analysis> {
        let mut analysis = build_symtab(tree)?;
        if self.trace {
            Self::trace_tables(tree, &analysis);
        }
        type_check(tree, &mut analysis)?;
        Ok(analysis)
    }

    fn trace_tables(tree: &SyntaxTree, analysis: &Analysis) {
        eprintln!("=== Symbol Table ===");
        eprint!("{}", listing::symbol_table(analysis));
        eprintln!("=== Functions ===");
        eprint!("{}", listing::functions(tree, analysis));
        eprintln!("=== Global Symbols ===");
        eprint!("{}", listing::globals(analysis));
        eprintln!("=== Scopes ===");
        eprint!("{}", listing::scopes(analysis));
        eprintln!("=== End Symbol Table ===\n");
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SemanticErrorKind;
    use crate::frontend::Parser;

    fn analyze(source: &str) -> Analysis {
        let mut tree = Parser::new(source).unwrap().parse().unwrap();
        SemanticAnalyzer::new().analyze(&mut tree).unwrap()
    }

    #[test]
    fn test_clean_program() {
        let analysis = analyze(
            "\
int gcd(int u, int v) {
    if (v == 0) return u;
    else return gcd(v, u - u / v * v);
}
void main(void) {
    int x; int y;
    x = input(); y = input();
    output(gcd(x, y));
}
",
        );
        assert!(!analysis.has_errors());
        assert!(analysis.errors().is_empty());
    }

    #[test]
    fn test_errors_from_both_passes_in_order() {
        let analysis = analyze("void x;\nint main(void) {\n return;\n}\n");

        let found: Vec<_> = analysis.errors().iter().map(|e| (e.line, e.kind.clone())).collect();
        assert_eq!(
            found,
            vec![
                (1, SemanticErrorKind::VoidVariable { name: "x".into() }),
                (3, SemanticErrorKind::InvalidReturn),
            ]
        );
        assert!(analysis.has_errors());
    }

    #[test]
    fn test_recursive_call_sees_own_declaration() {
        let analysis = analyze("int f(int n) { return f(n - 1); }");
        assert!(!analysis.has_errors());
    }

    #[test]
    fn test_trace_does_not_change_results() {
        let source = "int x;\nint x;\nvoid v;\n";
        let mut first = Parser::new(source).unwrap().parse().unwrap();
        let mut second = first.clone();

        let plain = SemanticAnalyzer::new().analyze(&mut first).unwrap();
        let traced = SemanticAnalyzer::new().with_trace(true).analyze(&mut second).unwrap();
        assert_eq!(plain.errors(), traced.errors());
        assert_eq!(plain.errors().len(), 2);
    }
}
