//! C-minus Compiler - semantic analysis for the C-minus teaching language
//!
//! This library turns C-minus source into a type-annotated syntax tree plus
//! the scope directory and symbol tables describing it.
//!
//! ## Architecture
//!
//! The compiler is organized into:
//! - **Frontend** (`frontend/`): lexing and parsing into an arena syntax tree
//! - **Sema** (`sema/`): scope directory, symbol tables, binding and type checking
//! - **Driver** (`driver/`): pipeline orchestration and diagnostics
//! - **Common** (`common/`): shared infrastructure (errors, spans)

pub mod common;
pub mod frontend;
pub mod sema;
pub mod driver;

// Re-exports for convenience
pub use common::{CompileError, CompileResult, DiagnosticReporter, SemanticError, Span};
pub use driver::{AnalyzeConfig, CheckedProgram, CompileContext, Pipeline};
pub use sema::{Analysis, SemanticAnalyzer};
