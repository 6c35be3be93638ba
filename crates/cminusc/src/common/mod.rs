//! Common infrastructure shared by the frontend and the analyzer

mod error;
mod span;

pub use error::{CompileError, CompileResult, DiagnosticReporter, SemanticError, SemanticErrorKind};
pub use span::Span;
