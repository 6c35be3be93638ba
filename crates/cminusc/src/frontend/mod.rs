//! C-minus frontend
//!
//! This frontend handles:
//! - Lexing C-minus source into tokens
//! - Parsing tokens into the arena syntax tree handed to `sema`

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::*;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
