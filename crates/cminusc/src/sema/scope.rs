//! Scope directory
//!
//! Owns every scope created during binding. Scopes are never removed, so a
//! `ScopeId` stays valid for the lifetime of the directory.

use super::symtab::SymbolTable;
use crate::common::{CompileError, CompileResult};
use crate::frontend::ast::NodeId;

/// Index of a scope inside its `ScopeDirectory`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    Normal,
    Redefined,
}

/// A lexical region: the global scope, a function, or an anonymous block
#[derive(Debug)]
pub struct Scope {
    pub name: String,
    pub state: ScopeState,
    /// Function declaration owning this scope; `None` for the global scope
    pub func: Option<NodeId>,
    pub parent: Option<ScopeId>,
    pub(super) symbols: SymbolTable,
    anonymous_children: usize,
}

impl Scope {
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn is_redefined(&self) -> bool {
        self.state == ScopeState::Redefined
    }
}

/// Every scope of one program, in creation order
#[derive(Debug, Default)]
pub struct ScopeDirectory {
    scopes: Vec<Scope>,
}

impl ScopeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope and append it to the directory.
    ///
    /// An absent `name` derives `"<parent>.<n>"` from the parent's counter of
    /// anonymous children. A name that already exists marks the new scope
    /// `Redefined`, as does a `Redefined` parent.
    pub fn insert_scope(
        &mut self,
        name: Option<&str>,
        parent: Option<ScopeId>,
        func: Option<NodeId>,
    ) -> CompileResult<ScopeId> {
        let name = match (name, parent) {
            (Some(name), _) => name.to_string(),
            (None, Some(parent)) => {
                let parent = &mut self.scopes[parent.index()];
                let name = format!("{}.{}", parent.name, parent.anonymous_children);
                parent.anonymous_children += 1;
                name
            }
            (None, None) => {
                return Err(CompileError::internal("anonymous scope without a parent"));
            }
        };

        let parent_redefined = parent.is_some_and(|p| self.scopes[p.index()].is_redefined());
        let duplicate = self.scopes.iter().any(|s| s.name == name);
        let state = if parent_redefined || duplicate {
            ScopeState::Redefined
        } else {
            ScopeState::Normal
        };

        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            name,
            state,
            func,
            parent,
            symbols: SymbolTable::new(),
            anonymous_children: 0,
        });
        Ok(id)
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.get(id).parent
    }

    /// First scope created with `name`
    pub fn find(&self, name: &str) -> Option<ScopeId> {
        self.iter().find(|(_, s)| s.name == name).map(|(id, _)| id)
    }

    /// `id` followed by each enclosing scope up to the global scope
    pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(id), |&s| self.parent(s))
    }

    /// Number of parent links between `id` and the outermost scope
    pub fn depth(&self, id: ScopeId) -> usize {
        self.ancestors(id).count() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes
            .iter()
            .enumerate()
            .map(|(i, s)| (ScopeId(i as u32), s))
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
