//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use thiserror::Error;
use super::Span;

/// Fatal error that stops the current compilation
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexer error at {span:?}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span:?}: {message}")]
    Parser { message: String, span: Span },

    /// A precondition the analyzer itself should have guaranteed was broken.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Recoverable semantic error found by the binder or the type checker
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub line: usize,
    pub span: Span,
}

impl SemanticError {
    pub fn new(kind: SemanticErrorKind, line: usize, span: Span) -> Self {
        Self { kind, line, span }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticErrorKind {
    #[error("symbol \"{name}\" is redefined (already defined at line {})", join_lines(.previous))]
    Redefinition { name: String, previous: Vec<usize> },

    #[error("variable \"{name}\" is declared with a void type")]
    VoidVariable { name: String },

    #[error("undeclared function \"{name}\" is called")]
    UndeclaredFunction { name: String },

    #[error("undeclared variable \"{name}\" is used")]
    UndeclaredVariable { name: String },

    #[error("invalid condition")]
    InvalidCondition,

    #[error("invalid return")]
    InvalidReturn,

    #[error("invalid assignment")]
    InvalidAssignment,

    #[error("invalid operation")]
    InvalidOperation,

    #[error("invalid call of function \"{name}\"")]
    InvalidCall { name: String },

    #[error("\"{name}\" is not an int[] variable and cannot be indexed")]
    NotIndexable { name: String },

    #[error("index into \"{name}\" must be an int")]
    BadIndexType { name: String },
}

fn join_lines(lines: &[usize]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Diagnostic reporter for pretty error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    pub fn report_error(&self, file_id: usize, error: &CompileError) {
        let diagnostic = match error {
            CompileError::Lexer { message, span } => Diagnostic::error()
                .with_message("Lexer error")
                .with_labels(vec![
                    Label::primary(file_id, span.range()).with_message(message)
                ]),

            CompileError::Parser { message, span } => Diagnostic::error()
                .with_message("Syntax error")
                .with_labels(vec![
                    Label::primary(file_id, span.range()).with_message(message)
                ]),

            CompileError::Internal { message } => {
                Diagnostic::bug().with_message(format!("Internal analyzer error: {}", message))
            }
        };

        self.emit(&diagnostic);
    }

    pub fn report_semantic(&self, file_id: usize, error: &SemanticError) {
        let mut diagnostic = Diagnostic::error()
            .with_message("Semantic error")
            .with_labels(vec![
                Label::primary(file_id, error.span.range()).with_message(error.kind.to_string())
            ]);

        if let SemanticErrorKind::Redefinition { previous, .. } = &error.kind {
            diagnostic = diagnostic.with_notes(
                previous.iter().map(|line| format!("previous declaration at line {}", line)).collect(),
            );
        }

        self.emit(&diagnostic);
    }

    fn emit(&self, diagnostic: &Diagnostic<usize>) {
        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, diagnostic);
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}
