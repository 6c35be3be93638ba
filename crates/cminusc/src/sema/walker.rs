//! Generic syntax tree traversal

use crate::common::CompileResult;
use crate::frontend::ast::{NodeId, SyntaxTree, MAX_CHILDREN};

/// Callbacks run by `traverse` around each node's children
pub trait Visitor {
    fn pre_visit(&mut self, tree: &mut SyntaxTree, id: NodeId) -> CompileResult<()>;
    fn post_visit(&mut self, tree: &mut SyntaxTree, id: NodeId) -> CompileResult<()>;
}

/// Visit `start` and its sibling chain: pre-visit, every child slot in
/// order, post-visit, then the next sibling.
pub fn traverse<V: Visitor + ?Sized>(
    tree: &mut SyntaxTree,
    start: Option<NodeId>,
    visitor: &mut V,
) -> CompileResult<()> {
    let mut cursor = start;
    while let Some(id) = cursor {
        visitor.pre_visit(tree, id)?;
        for slot in 0..MAX_CHILDREN {
            let child = tree.child(id, slot);
            traverse(tree, child, visitor)?;
        }
        visitor.post_visit(tree, id)?;
        cursor = tree[id].sibling;
    }
    Ok(())
}
