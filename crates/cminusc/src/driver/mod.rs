//! Compilation driver and pipeline orchestration

use crate::common::{CompileResult, DiagnosticReporter};
use crate::frontend::{Lexer, Parser, SyntaxTree};
use crate::sema::{Analysis, SemanticAnalyzer};

/// Configuration for one analysis run
#[derive(Debug, Clone, Default)]
pub struct AnalyzeConfig {
    pub dump_tokens: bool,
    pub dump_ast: bool,
    /// Print the symbol listings after the tables are built
    pub trace_analyze: bool,
    pub verbose: bool,
}

/// Compilation context providing access to diagnostics and file info
pub struct CompileContext<'a> {
    pub filename: String,
    pub file_id: usize,
    pub reporter: &'a DiagnosticReporter,
}

impl<'a> CompileContext<'a> {
    pub fn new(filename: String, file_id: usize, reporter: &'a DiagnosticReporter) -> Self {
        Self { filename, file_id, reporter }
    }
}

/// A parsed program together with its semantic analysis
#[derive(Debug)]
pub struct CheckedProgram {
    pub tree: SyntaxTree,
    pub analysis: Analysis,
}

impl CheckedProgram {
    /// Error flag: set when any semantic error was reported
    pub fn has_errors(&self) -> bool {
        self.analysis.has_errors()
    }
}

/// Runs lexing, parsing and both semantic passes over a single source
pub struct Pipeline;

impl Pipeline {
    pub fn new() -> Self {
        Self
    }

    /// Analyze `source`, reporting every diagnostic through `ctx.reporter`.
    ///
    /// Semantic errors do not fail the run; check `CheckedProgram::has_errors`.
    pub fn analyze_source(
        &self,
        source: &str,
        ctx: &CompileContext,
        config: &AnalyzeConfig,
    ) -> CompileResult<CheckedProgram> {
        // Phase 1: Lexing (optional token dump)
        if config.dump_tokens {
            let tokens = Lexer::new(source).tokenize_all().inspect_err(|e| {
                ctx.reporter.report_error(ctx.file_id, e);
            })?;
            eprintln!("=== C-minus Tokens ===");
            for token in &tokens {
                eprintln!("{:?}", token);
            }
            eprintln!("=== End Tokens ===\n");
        }

        // Phase 2: Parsing
        if config.verbose {
            eprintln!("Parsing {}...", ctx.filename);
        }
        let mut tree = Parser::new(source)
            .and_then(Parser::parse)
            .inspect_err(|e| ctx.reporter.report_error(ctx.file_id, e))?;

        if config.dump_ast {
            eprintln!("=== C-minus AST ===");
            eprintln!("{:#?}", tree);
            eprintln!("=== End AST ===\n");
        }

        // Phase 3: Semantic analysis
        if config.verbose {
            eprintln!("Analyzing...");
        }
        let analyzer = SemanticAnalyzer::new().with_trace(config.trace_analyze);
        let analysis = analyzer
            .analyze(&mut tree)
            .inspect_err(|e| ctx.reporter.report_error(ctx.file_id, e))?;

        for error in analysis.errors() {
            ctx.reporter.report_semantic(ctx.file_id, error);
        }
        if config.verbose {
            eprintln!(
                "Analyzed {} nodes in {} scopes, {} semantic error(s)",
                tree.len(),
                analysis.scopes().len(),
                analysis.errors().len()
            );
        }

        Ok(CheckedProgram { tree, analysis })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{CompileError, SemanticErrorKind};
    use crate::frontend::{NodeKind, Type};

    fn run(source: &str) -> CompileResult<CheckedProgram> {
        let mut reporter = DiagnosticReporter::new();
        let file_id = reporter.add_file("test.cm", source);
        let ctx = CompileContext::new("test.cm".to_string(), file_id, &reporter);
        Pipeline::new().analyze_source(source, &ctx, &AnalyzeConfig::default())
    }

    #[test]
    fn test_clean_program() {
        let program = run("int main(void) { return input() + 1; }").unwrap();
        assert!(!program.has_errors());

        let ret = program
            .tree
            .ids()
            .find(|&id| matches!(program.tree[id].kind, NodeKind::BinOp(_)))
            .unwrap();
        assert_eq!(program.tree[ret].ty, Type::Integer);
    }

    #[test]
    fn test_semantic_errors_set_flag() {
        let program = run("void main(void) { x = 1; }").unwrap();
        assert!(program.has_errors());
        assert_eq!(
            program.analysis.errors()[0].kind,
            SemanticErrorKind::UndeclaredVariable { name: "x".into() }
        );
    }

    #[test]
    fn test_syntax_error_is_fatal() {
        assert!(matches!(run("int main(void) { return 1 }"), Err(CompileError::Parser { .. })));
    }

    #[test]
    fn test_dumps_and_trace() {
        let source = "int x;\nvoid main(void) { x = 1; }\n";
        let mut reporter = DiagnosticReporter::new();
        let file_id = reporter.add_file("trace.cm", source);
        let ctx = CompileContext::new("trace.cm".to_string(), file_id, &reporter);
        let config = AnalyzeConfig {
            dump_tokens: true,
            dump_ast: true,
            trace_analyze: true,
            verbose: true,
        };

        let program = Pipeline::new().analyze_source(source, &ctx, &config).unwrap();
        assert!(!program.has_errors());
    }
}
