//! Syntax tree nodes and the arena that owns them

use std::ops::{Index, IndexMut};

use super::{Opcode, Type};
use crate::common::Span;
use crate::sema::ScopeId;

/// Number of child slots on every node
pub const MAX_CHILDREN: usize = 3;

/// Index of a node inside its `SyntaxTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Node kinds
///
/// Child slot layout:
/// - `VariableDecl`: array size constant
/// - `FunctionDecl`: parameter chain, body
/// - `Compound`: local declaration chain, statement chain
/// - `If`: condition, then branch, else branch
/// - `While`: condition, body
/// - `Return`: returned value
/// - `Assign`, `BinOp`: left operand, right operand
/// - `Call`: argument chain
/// - `VarAccess`: index expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Standalone type keyword; the parser folds types into declarations
    TypeSpecifier,
    VariableDecl,
    FunctionDecl,
    /// Function parameter; `empty_list` marks the `(void)` parameter list
    Param { empty_list: bool },
    /// Block; `function_body` marks the block directly owned by a function
    Compound { function_body: bool },
    If,
    While,
    Return { valueless: bool },
    Assign,
    BinOp(Opcode),
    Call,
    VarAccess,
    Const(i64),
    /// Standalone operator code; `BinOp` carries its own
    Opcode(Opcode),
}

impl NodeKind {
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::Assign
                | NodeKind::BinOp(_)
                | NodeKind::Call
                | NodeKind::VarAccess
                | NodeKind::Const(_)
        )
    }
}

/// A syntax tree node
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub lineno: usize,
    pub span: Span,
    pub ty: Type,
    pub name: Option<String>,
    pub children: [Option<NodeId>; MAX_CHILDREN],
    pub sibling: Option<NodeId>,
    /// Scope opened by this node, attached by the binder
    pub scope: Option<ScopeId>,
}

impl Node {
    pub fn new(kind: NodeKind, lineno: usize, span: Span) -> Self {
        Self {
            kind,
            lineno,
            span,
            ty: Type::None,
            name: None,
            children: [None; MAX_CHILDREN],
            sibling: None,
            scope: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_type(mut self, ty: Type) -> Self {
        self.ty = ty;
        self
    }

    pub fn with_child(mut self, slot: usize, child: Option<NodeId>) -> Self {
        self.children[slot] = child;
        self
    }

    /// Name of the node, or an empty string for unnamed nodes
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Arena owning every node of one program
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn child(&self, id: NodeId, slot: usize) -> Option<NodeId> {
        self.nodes[id.index()].children[slot]
    }

    /// Links `list` into a sibling chain, returning its head
    pub fn chain(&mut self, list: &[NodeId]) -> Option<NodeId> {
        for pair in list.windows(2) {
            self[pair[0]].sibling = Some(pair[1]);
        }
        list.first().copied()
    }

    /// Iterates `start` and every sibling after it
    pub fn siblings(&self, start: Option<NodeId>) -> Siblings<'_> {
        Siblings { tree: self, next: start }
    }

    /// All node ids in allocation order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|i| NodeId(i as u32))
    }
}

impl Index<NodeId> for SyntaxTree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for SyntaxTree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}

pub struct Siblings<'a> {
    tree: &'a SyntaxTree,
    next: Option<NodeId>,
}

impl Iterator for Siblings<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree[id].sibling;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_and_siblings() {
        let mut tree = SyntaxTree::new();
        let ids: Vec<NodeId> = (0..3)
            .map(|i| tree.alloc(Node::new(NodeKind::Const(i), 1, Span::default())))
            .collect();
        let head = tree.chain(&ids);

        assert_eq!(head, Some(ids[0]));
        assert_eq!(tree.siblings(head).collect::<Vec<_>>(), ids);
        assert_eq!(tree[ids[2]].sibling, None);
    }

    #[test]
    fn test_chain_empty() {
        let mut tree = SyntaxTree::new();
        assert_eq!(tree.chain(&[]), None);
        assert_eq!(tree.siblings(None).count(), 0);
    }
}
