//! Symbol table
//!
//! Each scope embeds one `SymbolTable`. Entries sharing a name are chained
//! in insertion order; a chain holds more than one entry only after a
//! redefinition or when a variable and a function share a name.

use std::collections::HashMap;
use std::fmt;

use super::scope::{ScopeDirectory, ScopeId};
use crate::common::{CompileError, CompileResult};
use crate::frontend::ast::{NodeId, Type};

/// Kind of symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    Function,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Variable => f.pad("Variable"),
            SymbolKind::Function => f.pad("Function"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolState {
    Normal,
    Redefined,
    /// Placeholder created after an undeclared-identifier error
    Undeclared,
}

/// A symbol in the symbol table
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub state: SymbolState,
    pub ty: Type,
    pub kind: SymbolKind,
    /// Declaring node; `None` for placeholders
    pub decl: Option<NodeId>,
    /// Insertion index within the owning scope
    pub slot: usize,
    /// Declaration line followed by every use, in order
    pub lines: Vec<usize>,
}

impl Symbol {
    pub fn is_placeholder(&self) -> bool {
        self.state == SymbolState::Undeclared
    }
}

/// Stable handle to a symbol: its scope and slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolRef {
    pub scope: ScopeId,
    pub slot: usize,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: Vec<Symbol>,
    chains: HashMap<String, Vec<usize>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Symbols in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Symbol> {
        self.entries.iter()
    }

    pub fn get(&self, slot: usize) -> Option<&Symbol> {
        self.entries.get(slot)
    }

    /// Slots of every entry named `name`, oldest first
    pub fn chain(&self, name: &str) -> &[usize] {
        self.chains.get(name).map_or(&[][..], Vec::as_slice)
    }

    /// Most recent binding of `name`
    fn latest(&self, name: &str) -> Option<usize> {
        self.chain(name).last().copied()
    }

    fn latest_with_kind(&self, name: &str, kind: SymbolKind) -> Option<usize> {
        self.chain(name)
            .iter()
            .rev()
            .copied()
            .find(|&slot| self.entries[slot].kind == kind)
    }
}

impl ScopeDirectory {
    /// Insert a declaration (or, with `decl == None`, a placeholder) into
    /// `scope`'s own table.
    ///
    /// A placeholder of the same name and kind is promoted in place. A live
    /// symbol of the same name and kind is an internal error: callers check
    /// for redefinition first and mark the old entries `Redefined`.
    pub fn insert_symbol(
        &mut self,
        scope: ScopeId,
        name: &str,
        ty: Type,
        kind: SymbolKind,
        lineno: usize,
        decl: Option<NodeId>,
    ) -> CompileResult<SymbolRef> {
        let table = &mut self.get_mut(scope).symbols;

        let placeholder = table
            .chain(name)
            .iter()
            .copied()
            .find(|&slot| table.entries[slot].kind == kind && table.entries[slot].is_placeholder());
        if let Some(slot) = placeholder {
            let symbol = &mut table.entries[slot];
            symbol.ty = ty;
            if decl.is_some() {
                symbol.state = SymbolState::Normal;
                symbol.decl = decl;
            }
            return Ok(SymbolRef { scope, slot });
        }

        let chain = table.chain(name);
        if chain
            .iter()
            .any(|&slot| table.entries[slot].kind == kind && table.entries[slot].state == SymbolState::Normal)
        {
            return Err(CompileError::internal(format!(
                "symbol '{}' inserted twice without a redefinition check",
                name
            )));
        }

        let redefined = chain
            .iter()
            .any(|&slot| table.entries[slot].state == SymbolState::Redefined);
        let state = if decl.is_none() {
            SymbolState::Undeclared
        } else if redefined {
            SymbolState::Redefined
        } else {
            SymbolState::Normal
        };

        let slot = table.entries.len();
        table.entries.push(Symbol {
            name: name.to_string(),
            state,
            ty,
            kind,
            decl,
            slot,
            lines: vec![lineno],
        });
        table.chains.entry(name.to_string()).or_default().push(slot);
        Ok(SymbolRef { scope, slot })
    }

    /// Record a use of `name` at `lineno` on the innermost visible binding
    /// of the given kind
    pub fn append_symbol(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: SymbolKind,
        lineno: usize,
    ) -> CompileResult<SymbolRef> {
        let found = self.lookup_symbol_with_kind(scope, name, kind).ok_or_else(|| {
            CompileError::internal(format!("use of '{}' recorded before any binding", name))
        })?;
        self.symbol_mut(found).lines.push(lineno);
        Ok(found)
    }

    /// Innermost binding of `name`, walking from `scope` outward
    pub fn lookup_symbol(&self, scope: ScopeId, name: &str) -> Option<SymbolRef> {
        self.ancestors(scope).find_map(|s| {
            self.get(s)
                .symbols
                .latest(name)
                .map(|slot| SymbolRef { scope: s, slot })
        })
    }

    /// Binding of `name` in `scope` itself
    pub fn lookup_symbol_in_current_scope(&self, scope: ScopeId, name: &str) -> Option<SymbolRef> {
        self.get(scope)
            .symbols
            .latest(name)
            .map(|slot| SymbolRef { scope, slot })
    }

    /// Innermost binding of `name` with the given kind
    pub fn lookup_symbol_with_kind(&self, scope: ScopeId, name: &str, kind: SymbolKind) -> Option<SymbolRef> {
        self.ancestors(scope).find_map(|s| {
            self.get(s)
                .symbols
                .latest_with_kind(name, kind)
                .map(|slot| SymbolRef { scope: s, slot })
        })
    }

    /// Every declared (non-placeholder) entry named `name` in `scope`
    pub fn declarations_in(&self, scope: ScopeId, name: &str) -> Vec<SymbolRef> {
        let table = &self.get(scope).symbols;
        table
            .chain(name)
            .iter()
            .copied()
            .filter(|&slot| table.entries[slot].decl.is_some())
            .map(|slot| SymbolRef { scope, slot })
            .collect()
    }

    pub fn symbol(&self, r: SymbolRef) -> &Symbol {
        &self.get(r.scope).symbols.entries[r.slot]
    }

    pub fn symbol_mut(&mut self, r: SymbolRef) -> &mut Symbol {
        &mut self.get_mut(r.scope).symbols.entries[r.slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::{Node, NodeKind, SyntaxTree};
    use crate::common::Span;

    fn setup() -> (ScopeDirectory, ScopeId, ScopeId, NodeId) {
        let mut tree = SyntaxTree::new();
        let node = tree.alloc(Node::new(NodeKind::VariableDecl, 1, Span::default()));
        let mut dir = ScopeDirectory::new();
        let global = dir.insert_scope(Some("global"), None, None).unwrap();
        let func = dir.insert_scope(Some("main"), Some(global), None).unwrap();
        (dir, global, func, node)
    }

    #[test]
    fn test_slots_follow_insertion_order() {
        let (mut dir, global, _, node) = setup();
        let a = dir.insert_symbol(global, "a", Type::Integer, SymbolKind::Variable, 1, Some(node)).unwrap();
        let b = dir.insert_symbol(global, "b", Type::Integer, SymbolKind::Variable, 2, Some(node)).unwrap();

        assert_eq!(a.slot, 0);
        assert_eq!(b.slot, 1);
        let names: Vec<_> = dir.get(global).symbols().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_placeholder_promotion() {
        let (mut dir, global, _, node) = setup();
        let placeholder = dir.insert_symbol(global, "f", Type::Undetermined, SymbolKind::Function, 3, None).unwrap();
        assert_eq!(dir.symbol(placeholder).state, SymbolState::Undeclared);

        let promoted = dir.insert_symbol(global, "f", Type::Void, SymbolKind::Function, 9, Some(node)).unwrap();
        assert_eq!(promoted, placeholder);
        let symbol = dir.symbol(promoted);
        assert_eq!(symbol.state, SymbolState::Normal);
        assert_eq!(symbol.ty, Type::Void);
        assert_eq!(symbol.decl, Some(node));
        assert_eq!(dir.get(global).symbols().len(), 1);
    }

    #[test]
    fn test_duplicate_live_symbol_is_internal_error() {
        let (mut dir, global, _, node) = setup();
        dir.insert_symbol(global, "x", Type::Integer, SymbolKind::Variable, 1, Some(node)).unwrap();
        assert!(matches!(
            dir.insert_symbol(global, "x", Type::Integer, SymbolKind::Variable, 2, Some(node)),
            Err(CompileError::Internal { .. })
        ));
    }

    #[test]
    fn test_redefinition_chains_latest_binding() {
        let (mut dir, global, _, node) = setup();
        let first = dir.insert_symbol(global, "x", Type::Integer, SymbolKind::Variable, 1, Some(node)).unwrap();
        dir.symbol_mut(first).state = SymbolState::Redefined;
        let second = dir.insert_symbol(global, "x", Type::IntegerArray, SymbolKind::Variable, 2, Some(node)).unwrap();

        assert_eq!(dir.symbol(second).state, SymbolState::Redefined);
        assert_eq!(dir.lookup_symbol(global, "x"), Some(second));
        assert_eq!(dir.declarations_in(global, "x"), vec![first, second]);
    }

    #[test]
    fn test_lookups_and_shadowing() {
        let (mut dir, global, func, node) = setup();
        let outer = dir.insert_symbol(global, "x", Type::Integer, SymbolKind::Variable, 1, Some(node)).unwrap();
        let f = dir.insert_symbol(global, "f", Type::Integer, SymbolKind::Function, 1, Some(node)).unwrap();
        let inner = dir.insert_symbol(func, "x", Type::IntegerArray, SymbolKind::Variable, 2, Some(node)).unwrap();

        assert_eq!(dir.lookup_symbol(func, "x"), Some(inner));
        assert_eq!(dir.lookup_symbol(global, "x"), Some(outer));
        assert_eq!(dir.lookup_symbol_in_current_scope(func, "f"), None);
        assert_eq!(dir.lookup_symbol_with_kind(func, "f", SymbolKind::Function), Some(f));
        assert_eq!(dir.lookup_symbol_with_kind(func, "f", SymbolKind::Variable), None);
        assert_eq!(dir.lookup_symbol(func, "missing"), None);
    }

    #[test]
    fn test_append_symbol() {
        let (mut dir, global, func, node) = setup();
        let x = dir.insert_symbol(global, "x", Type::Integer, SymbolKind::Variable, 1, Some(node)).unwrap();

        assert_eq!(dir.append_symbol(func, "x", SymbolKind::Variable, 4).unwrap(), x);
        dir.append_symbol(func, "x", SymbolKind::Variable, 6).unwrap();
        assert_eq!(dir.symbol(x).lines, vec![1, 4, 6]);
        assert!(matches!(
            dir.append_symbol(func, "y", SymbolKind::Variable, 7),
            Err(CompileError::Internal { .. })
        ));
    }

    #[test]
    fn test_append_symbol_respects_kind() {
        let (mut dir, global, func, node) = setup();
        let var = dir.insert_symbol(global, "x", Type::Integer, SymbolKind::Variable, 1, Some(node)).unwrap();
        let placeholder = dir.insert_symbol(global, "x", Type::Undetermined, SymbolKind::Function, 3, None).unwrap();

        assert_eq!(dir.append_symbol(func, "x", SymbolKind::Variable, 4).unwrap(), var);
        assert_eq!(dir.append_symbol(func, "x", SymbolKind::Function, 5).unwrap(), placeholder);
        assert_eq!(dir.symbol(var).lines, vec![1, 4]);
        assert_eq!(dir.symbol(placeholder).lines, vec![3, 5]);
    }
}
