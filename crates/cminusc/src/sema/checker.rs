//! Pass 2: type checking

use super::analyzer::Analysis;
use super::scope::{ScopeDirectory, ScopeId};
use super::symtab::SymbolKind;
use super::walker::{traverse, Visitor};
use crate::common::{CompileError, CompileResult, SemanticError, SemanticErrorKind};
use crate::frontend::ast::{NodeId, NodeKind, SyntaxTree, Type};

/// Assign a type to every expression of `tree` and validate statements,
/// appending any errors to `analysis`. Requires `build_symtab` to have run
/// on the same tree.
pub fn type_check(tree: &mut SyntaxTree, analysis: &mut Analysis) -> CompileResult<()> {
    let mut checker = TypeChecker {
        scopes: analysis.scopes(),
        global: analysis.global(),
        current: analysis.global(),
        errors: Vec::new(),
    };
    let root = tree.root();
    traverse(tree, root, &mut checker)?;

    let errors = checker.errors;
    analysis.extend_errors(errors);
    Ok(())
}

struct TypeChecker<'a> {
    scopes: &'a ScopeDirectory,
    global: ScopeId,
    current: ScopeId,
    errors: Vec<SemanticError>,
}

fn missing_child(tree: &SyntaxTree, id: NodeId, slot: usize) -> CompileError {
    CompileError::internal(format!(
        "{:?} node at line {} has no child {}",
        tree[id].kind, tree[id].lineno, slot
    ))
}

impl TypeChecker<'_> {
    fn report(&mut self, tree: &SyntaxTree, id: NodeId, kind: SemanticErrorKind) {
        let node = &tree[id];
        self.errors.push(SemanticError::new(kind, node.lineno, node.span));
    }

    fn operand(&self, tree: &SyntaxTree, id: NodeId, slot: usize) -> CompileResult<Type> {
        tree.child(id, slot)
            .map(|child| tree[child].ty)
            .ok_or_else(|| missing_child(tree, id, slot))
    }

    fn check_condition(&mut self, tree: &SyntaxTree, id: NodeId) -> CompileResult<()> {
        if self.operand(tree, id, 0)? != Type::Integer {
            self.report(tree, id, SemanticErrorKind::InvalidCondition);
        }
        Ok(())
    }

    fn check_return(&mut self, tree: &SyntaxTree, id: NodeId, valueless: bool) -> CompileResult<()> {
        let func = self.scopes.get(self.current).func.ok_or_else(|| {
            CompileError::internal(format!("return at line {} outside any function", tree[id].lineno))
        })?;
        let expected = tree[func].ty;

        let valid = if valueless {
            expected == Type::Void
        } else {
            self.operand(tree, id, 0)? == expected
        };
        if !valid {
            self.report(tree, id, SemanticErrorKind::InvalidReturn);
        }
        Ok(())
    }

    /// Assignment and binary operators: both sides resolved and identical
    fn check_operands(&mut self, tree: &mut SyntaxTree, id: NodeId, error: SemanticErrorKind) -> CompileResult<()> {
        let lhs = self.operand(tree, id, 0)?;
        let rhs = self.operand(tree, id, 1)?;
        if !(lhs.is_resolved() && lhs == rhs) {
            self.report(tree, id, error);
        }
        tree[id].ty = lhs;
        Ok(())
    }

    fn check_call(&mut self, tree: &mut SyntaxTree, id: NodeId) -> CompileResult<()> {
        let scopes = self.scopes;
        let name = tree[id].name();
        let callee = scopes
            .lookup_symbol_with_kind(self.global, name, SymbolKind::Function)
            .ok_or_else(|| CompileError::internal(format!("call of unbound function '{}'", name)))?;
        let callee = scopes.symbol(callee);

        // Undeclared callee: reported by the binder already
        if callee.is_placeholder() {
            tree[id].ty = callee.ty;
            return Ok(());
        }

        let decl = callee
            .decl
            .ok_or_else(|| CompileError::internal(format!("function '{}' has no declaration", callee.name)))?;

        let mut param = tree.child(decl, 0);
        let mut arg = tree.child(id, 0);
        let mut valid = true;
        while let Some(a) = arg {
            let arg_ty = tree[a].ty;
            match param {
                Some(p) if tree[p].ty == arg_ty && arg_ty != Type::Void => {
                    arg = tree[a].sibling;
                    param = tree[p].sibling;
                }
                _ => {
                    valid = false;
                    break;
                }
            }
        }
        if let Some(p) = param.filter(|_| valid) {
            // leftover parameters, unless the list is `(void)`
            if !matches!(tree[p].kind, NodeKind::Param { empty_list: true }) {
                valid = false;
            }
        }

        if !valid {
            let name = callee.name.clone();
            self.report(tree, id, SemanticErrorKind::InvalidCall { name });
        }
        tree[id].ty = callee.ty;
        Ok(())
    }

    fn check_var_access(&mut self, tree: &mut SyntaxTree, id: NodeId) -> CompileResult<()> {
        let scopes = self.scopes;
        let name = tree[id].name();
        let symbol = scopes
            .lookup_symbol_with_kind(self.current, name, SymbolKind::Variable)
            .ok_or_else(|| CompileError::internal(format!("use of unbound variable '{}'", name)))?;
        let symbol = scopes.symbol(symbol);

        // Undeclared variable: reported by the binder already
        if symbol.is_placeholder() {
            tree[id].ty = symbol.ty;
            return Ok(());
        }

        let Some(index) = tree.child(id, 0) else {
            tree[id].ty = symbol.ty;
            return Ok(());
        };

        if symbol.ty != Type::IntegerArray {
            let name = symbol.name.clone();
            self.report(tree, id, SemanticErrorKind::NotIndexable { name });
        } else if tree[index].ty != Type::Integer {
            let name = symbol.name.clone();
            self.report(tree, id, SemanticErrorKind::BadIndexType { name });
        }
        // an element is always an int, even after an indexing error
        tree[id].ty = Type::Integer;
        Ok(())
    }

    fn check_node(&mut self, tree: &mut SyntaxTree, id: NodeId) -> CompileResult<()> {
        let kind = tree[id].kind;
        match kind {
            NodeKind::If | NodeKind::While => self.check_condition(tree, id),
            NodeKind::Return { valueless } => self.check_return(tree, id, valueless),
            NodeKind::Assign => self.check_operands(tree, id, SemanticErrorKind::InvalidAssignment),
            NodeKind::BinOp(_) => self.check_operands(tree, id, SemanticErrorKind::InvalidOperation),
            NodeKind::Call => self.check_call(tree, id),
            NodeKind::VarAccess => self.check_var_access(tree, id),
            NodeKind::Const(_) => {
                tree[id].ty = Type::Integer;
                Ok(())
            }
            // Fully resolved by the binder
            NodeKind::TypeSpecifier
            | NodeKind::VariableDecl
            | NodeKind::FunctionDecl
            | NodeKind::Param { .. }
            | NodeKind::Compound { .. }
            | NodeKind::Opcode(_) => Ok(()),
        }
    }
}

impl Visitor for TypeChecker<'_> {
    fn pre_visit(&mut self, tree: &mut SyntaxTree, id: NodeId) -> CompileResult<()> {
        if let Some(scope) = tree[id].scope {
            self.current = scope;
        }
        Ok(())
    }

    fn post_visit(&mut self, tree: &mut SyntaxTree, id: NodeId) -> CompileResult<()> {
        self.check_node(tree, id)?;
        if let Some(scope) = tree[id].scope {
            self.current = self.scopes.parent(scope).ok_or_else(|| {
                CompileError::internal(format!("scope '{}' has no parent", self.scopes.get(scope).name))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Parser;
    use crate::sema::build_symtab;

    fn check(source: &str) -> (SyntaxTree, Analysis) {
        let mut tree = Parser::new(source).unwrap().parse().unwrap();
        let mut analysis = build_symtab(&mut tree).unwrap();
        type_check(&mut tree, &mut analysis).unwrap();
        (tree, analysis)
    }

    fn kinds(source: &str) -> Vec<SemanticErrorKind> {
        let (_, analysis) = check(source);
        analysis.errors().iter().map(|e| e.kind.clone()).collect()
    }

    #[test]
    fn test_clean_program_types_every_expression() {
        let source = "\
int g[10];
int add(int a, int b[]) { return a + b[0]; }
void main(void) {
    int i;
    i = input();
    while (i < 10) {
        g[i] = add(i, g) * 2;
        i = i + 1;
    }
    if (i == 10) output(g[0]); else return;
}
";
        let (tree, analysis) = check(source);
        assert!(!analysis.has_errors(), "{:?}", analysis.errors());

        for id in tree.ids() {
            let node = &tree[id];
            if node.kind.is_expression() {
                assert!(node.ty.is_resolved(), "{:?} at line {} untyped", node.kind, node.lineno);
            }
        }
    }

    #[test]
    fn test_indexing() {
        assert!(kinds("void main(void) { int a[3]; a[1] = 2; }").is_empty());
        assert_eq!(
            kinds("void main(void) { int a[3]; int b; b = a[a]; }"),
            vec![SemanticErrorKind::BadIndexType { name: "a".into() }]
        );
        assert_eq!(
            kinds("void main(void) { int b; b = b[1]; }"),
            vec![SemanticErrorKind::NotIndexable { name: "b".into() }]
        );
    }

    #[test]
    fn test_indexed_assignment_target() {
        assert_eq!(
            kinds("void main(void) { int a[10]; a[a] = 2; }"),
            vec![SemanticErrorKind::BadIndexType { name: "a".into() }]
        );
        assert_eq!(
            kinds("void main(void) { int b; b[1] = 2; }"),
            vec![SemanticErrorKind::NotIndexable { name: "b".into() }]
        );
    }

    #[test]
    fn test_indexed_element_is_int() {
        let (tree, _) = check("void main(void) { int b; b[1]; }");
        let access = tree.ids().find(|&id| matches!(tree[id].kind, NodeKind::VarAccess)).unwrap();
        assert_eq!(tree[access].ty, Type::Integer);
    }

    #[test]
    fn test_builtin_calls() {
        assert!(kinds("void main(void) { int x; x = input(); output(x); }").is_empty());
        assert_eq!(
            kinds("void main(void) { output(); }"),
            vec![SemanticErrorKind::InvalidCall { name: "output".into() }]
        );
        assert_eq!(
            kinds("void main(void) { input(1); }"),
            vec![SemanticErrorKind::InvalidCall { name: "input".into() }]
        );
    }

    #[test]
    fn test_call_arguments() {
        let prelude = "int f(int a, int b[]) { return a; }\nvoid v(void) { }\n";
        let call = |body: &str| kinds(&format!("{prelude}void main(void) {{ int x; int y[2]; {body} }}"));

        assert!(call("f(x, y);").is_empty());
        let invalid = vec![SemanticErrorKind::InvalidCall { name: "f".into() }];
        assert_eq!(call("f(x);"), invalid);
        assert_eq!(call("f(x, y, x);"), invalid);
        assert_eq!(call("f(y, x);"), invalid);
        assert_eq!(call("f(v(), y);"), invalid);
    }

    #[test]
    fn test_returns() {
        assert_eq!(
            kinds("int f(void) { return; }"),
            vec![SemanticErrorKind::InvalidReturn]
        );
        assert_eq!(
            kinds("void g(void) { return 1; }"),
            vec![SemanticErrorKind::InvalidReturn]
        );
        assert!(kinds("int f(void) { { return 1; } }").is_empty());
    }

    #[test]
    fn test_conditions_and_operands() {
        let prelude = "void v(void) { }\n";
        assert_eq!(
            kinds(&format!("{prelude}void main(void) {{ if (v()) return; }}")),
            vec![SemanticErrorKind::InvalidCondition]
        );
        assert_eq!(
            kinds(&format!("{prelude}void main(void) {{ int a[2]; while (a) return; }}")),
            vec![SemanticErrorKind::InvalidCondition]
        );
        assert_eq!(
            kinds("void main(void) { int a[2]; int x; x = a + 1; }"),
            vec![SemanticErrorKind::InvalidOperation, SemanticErrorKind::InvalidAssignment]
        );
        assert_eq!(
            kinds("void main(void) { int a[2]; int b[2]; a = b; }"),
            Vec::new()
        );
    }

    #[test]
    fn test_undeclared_names_are_not_reported_again() {
        assert_eq!(
            kinds("void main(void) { int x; x = foo(1) + y; }"),
            vec![
                SemanticErrorKind::UndeclaredFunction { name: "foo".into() },
                SemanticErrorKind::UndeclaredVariable { name: "y".into() },
                SemanticErrorKind::InvalidOperation,
                SemanticErrorKind::InvalidAssignment,
            ]
        );
    }

    #[test]
    fn test_binop_takes_left_type() {
        let (tree, _) = check("void main(void) { int x; x + 1; }");
        let binop = tree.ids().find(|&id| matches!(tree[id].kind, NodeKind::BinOp(_))).unwrap();
        assert_eq!(tree[binop].ty, Type::Integer);
    }
}
