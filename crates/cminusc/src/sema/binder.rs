//! Pass 1: build scopes and symbol tables

use super::analyzer::Analysis;
use super::scope::{ScopeDirectory, ScopeId, ScopeState};
use super::symtab::{SymbolKind, SymbolState};
use super::walker::{traverse, Visitor};
use crate::common::{CompileError, CompileResult, SemanticError, SemanticErrorKind, Span};
use crate::frontend::ast::{Node, NodeId, NodeKind, SyntaxTree, Type};

/// Build the scope directory and symbol tables for `tree`.
///
/// Scopes opened by function declarations and blocks are attached to their
/// nodes so the type checker can re-enter them.
pub fn build_symtab(tree: &mut SyntaxTree) -> CompileResult<Analysis> {
    let mut scopes = ScopeDirectory::new();
    let global = scopes.insert_scope(Some("global"), None, None)?;
    declare_builtins(tree, &mut scopes, global)?;

    let mut binder = Binder {
        scopes,
        errors: Vec::new(),
        global,
        current: global,
    };
    let root = tree.root();
    traverse(tree, root, &mut binder)?;

    Ok(Analysis::new(binder.scopes, global, binder.errors))
}

/// `int input(void)` and `void output(int value)`
fn declare_builtins(tree: &mut SyntaxTree, scopes: &mut ScopeDirectory, global: ScopeId) -> CompileResult<()> {
    let no_params = tree.alloc(
        Node::new(NodeKind::Param { empty_list: true }, 0, Span::default()).with_type(Type::Void),
    );
    let input = tree.alloc(
        Node::new(NodeKind::FunctionDecl, 0, Span::default())
            .with_name("input")
            .with_type(Type::Integer)
            .with_child(0, Some(no_params)),
    );

    let value = tree.alloc(
        Node::new(NodeKind::Param { empty_list: false }, 0, Span::default())
            .with_name("value")
            .with_type(Type::Integer),
    );
    let output = tree.alloc(
        Node::new(NodeKind::FunctionDecl, 0, Span::default())
            .with_name("output")
            .with_type(Type::Void)
            .with_child(0, Some(value)),
    );

    scopes.insert_symbol(global, "input", Type::Integer, SymbolKind::Function, 0, Some(input))?;
    scopes.insert_symbol(global, "output", Type::Void, SymbolKind::Function, 0, Some(output))?;
    let output_scope = scopes.insert_scope(Some("output"), Some(global), Some(output))?;
    tree[output].scope = Some(output_scope);
    scopes.insert_symbol(output_scope, "value", Type::Integer, SymbolKind::Variable, 0, Some(value))?;
    Ok(())
}

struct Binder {
    scopes: ScopeDirectory,
    errors: Vec<SemanticError>,
    global: ScopeId,
    current: ScopeId,
}

impl Binder {
    fn report(&mut self, kind: SemanticErrorKind, node: &Node) {
        self.errors.push(SemanticError::new(kind, node.lineno, node.span));
    }

    /// Report a redefinition if `name` is already declared in `scope`.
    ///
    /// Every earlier declaration, and the scope it opened, becomes
    /// `Redefined`. Placeholders do not count as declarations.
    fn check_redefinition(&mut self, tree: &SyntaxTree, scope: ScopeId, id: NodeId) {
        let node = &tree[id];
        let previous = self.scopes.declarations_in(scope, node.name());
        if previous.is_empty() {
            return;
        }

        let mut lines = Vec::with_capacity(previous.len());
        for r in previous {
            let symbol = self.scopes.symbol_mut(r);
            symbol.state = SymbolState::Redefined;
            lines.extend(symbol.lines.first().copied());
            if let Some(opened) = symbol.decl.and_then(|decl| tree[decl].scope) {
                self.scopes.get_mut(opened).state = ScopeState::Redefined;
            }
        }

        self.report(
            SemanticErrorKind::Redefinition { name: node.name().to_string(), previous: lines },
            node,
        );
    }

    fn declare_variable(&mut self, tree: &SyntaxTree, id: NodeId) -> CompileResult<()> {
        let node = &tree[id];
        if node.ty.is_void() {
            self.report(SemanticErrorKind::VoidVariable { name: node.name().to_string() }, node);
        }
        self.check_redefinition(tree, self.current, id);
        self.scopes
            .insert_symbol(self.current, node.name(), node.ty, SymbolKind::Variable, node.lineno, Some(id))?;
        Ok(())
    }

    fn declare_function(&mut self, tree: &mut SyntaxTree, id: NodeId) -> CompileResult<()> {
        if self.current != self.global {
            return Err(CompileError::internal(format!(
                "function '{}' declared outside the global scope",
                tree[id].name()
            )));
        }
        self.check_redefinition(tree, self.global, id);

        let node = &tree[id];
        self.scopes
            .insert_symbol(self.global, node.name(), node.ty, SymbolKind::Function, node.lineno, Some(id))?;
        let scope = self.scopes.insert_scope(Some(node.name()), Some(self.current), Some(id))?;
        tree[id].scope = Some(scope);
        self.current = scope;
        Ok(())
    }

    fn open_block(&mut self, tree: &mut SyntaxTree, id: NodeId) -> CompileResult<()> {
        let func = self.scopes.get(self.current).func;
        let scope = self.scopes.insert_scope(None, Some(self.current), func)?;
        tree[id].scope = Some(scope);
        self.current = scope;
        Ok(())
    }

    fn bind_call(&mut self, tree: &SyntaxTree, id: NodeId) -> CompileResult<()> {
        let node = &tree[id];
        match self.scopes.lookup_symbol_with_kind(self.global, node.name(), SymbolKind::Function) {
            Some(_) => {
                self.scopes.append_symbol(self.global, node.name(), SymbolKind::Function, node.lineno)?;
            }
            None => {
                self.report(SemanticErrorKind::UndeclaredFunction { name: node.name().to_string() }, node);
                self.scopes.insert_symbol(
                    self.global,
                    node.name(),
                    Type::Undetermined,
                    SymbolKind::Function,
                    node.lineno,
                    None,
                )?;
            }
        }
        Ok(())
    }

    fn bind_variable(&mut self, tree: &SyntaxTree, id: NodeId) -> CompileResult<()> {
        let node = &tree[id];
        match self.scopes.lookup_symbol_with_kind(self.current, node.name(), SymbolKind::Variable) {
            Some(_) => {
                self.scopes.append_symbol(self.current, node.name(), SymbolKind::Variable, node.lineno)?;
            }
            None => {
                self.report(SemanticErrorKind::UndeclaredVariable { name: node.name().to_string() }, node);
                self.scopes.insert_symbol(
                    self.current,
                    node.name(),
                    Type::Undetermined,
                    SymbolKind::Variable,
                    node.lineno,
                    None,
                )?;
            }
        }
        Ok(())
    }
}

impl Visitor for Binder {
    fn pre_visit(&mut self, tree: &mut SyntaxTree, id: NodeId) -> CompileResult<()> {
        let kind = tree[id].kind;
        match kind {
            NodeKind::VariableDecl => self.declare_variable(tree, id),
            NodeKind::FunctionDecl => self.declare_function(tree, id),
            NodeKind::Param { empty_list: true } => Ok(()),
            NodeKind::Param { empty_list: false } => self.declare_variable(tree, id),
            // Parameters and body-local declarations share the function's scope
            NodeKind::Compound { function_body: true } => Ok(()),
            NodeKind::Compound { function_body: false } => self.open_block(tree, id),
            NodeKind::Call => self.bind_call(tree, id),
            NodeKind::VarAccess => self.bind_variable(tree, id),
            NodeKind::TypeSpecifier
            | NodeKind::If
            | NodeKind::While
            | NodeKind::Return { .. }
            | NodeKind::Assign
            | NodeKind::BinOp(_)
            | NodeKind::Const(_)
            | NodeKind::Opcode(_) => Ok(()),
        }
    }

    fn post_visit(&mut self, tree: &mut SyntaxTree, id: NodeId) -> CompileResult<()> {
        if let Some(scope) = tree[id].scope {
            self.current = self.scopes.parent(scope).ok_or_else(|| {
                CompileError::internal(format!("scope '{}' has no parent", self.scopes.get(scope).name))
            })?;
        }
        Ok(())
    }
}
