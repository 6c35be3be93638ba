//! Parser module producing the arena syntax tree

mod parser;

pub use parser::Parser;
