//! Semantic analysis module
//!
//! Pass 1 (`build_symtab`) builds the scope directory and symbol tables and
//! attaches scopes to the tree. Pass 2 (`type_check`) re-enters those
//! scopes, types every expression and validates statements.

mod analyzer;
mod binder;
mod checker;
pub mod listing;
mod scope;
mod symtab;
mod walker;

pub use analyzer::{Analysis, SemanticAnalyzer};
pub use binder::build_symtab;
pub use checker::type_check;
pub use scope::{Scope, ScopeDirectory, ScopeId, ScopeState};
pub use symtab::{Symbol, SymbolKind, SymbolRef, SymbolState, SymbolTable};
pub use walker::{traverse, Visitor};
