//! Lexer module for tokenizing C-minus source code

mod token;
mod scanner;

pub use token::{Token, TokenKind};
pub use scanner::Lexer;
