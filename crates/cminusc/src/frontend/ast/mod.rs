//! Abstract Syntax Tree definitions
//!
//! The tree is stored in an arena: nodes refer to their children, their
//! next sibling and their scope by index, never by pointer.

mod node;
mod types;

pub use node::*;
pub use types::*;
