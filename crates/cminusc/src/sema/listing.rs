//! Text listings of the scope directory and symbol tables
//!
//! Scopes appear in creation order and symbols in insertion order, so two
//! runs over the same program produce identical listings.

use super::analyzer::Analysis;
use super::symtab::SymbolKind;
use crate::frontend::ast::{NodeKind, SyntaxTree, Type};

fn push_row(output: &mut String, row: &str) {
    output.push_str(row.trim_end());
    output.push('\n');
}

/// Every symbol of every scope with its slot and line list
pub fn symbol_table(analysis: &Analysis) -> String {
    let mut output = String::new();
    push_row(&mut output, " Symbol Name   Symbol Kind   Symbol Type    Scope Name   Location  Line Numbers");
    push_row(&mut output, "-------------  -----------  -------------  ------------  --------  ------------");

    for (_, scope) in analysis.scopes().iter() {
        for symbol in scope.symbols().iter() {
            let mut row = format!(
                "{:<13}  {:<11}  {:<13}  {:<12}  {:<8} ",
                symbol.name, symbol.kind, symbol.ty, scope.name, symbol.slot
            );
            for line in &symbol.lines {
                row.push_str(&format!("{:>4} ", line));
            }
            push_row(&mut output, &row);
        }
    }
    output
}

/// Function signatures: return type, then one row per parameter
pub fn functions(tree: &SyntaxTree, analysis: &Analysis) -> String {
    let mut output = String::new();
    push_row(&mut output, "Function Name   Return Type   Parameter Name  Parameter Type");
    push_row(&mut output, "-------------  -------------  --------------  --------------");

    let functions = analysis
        .scopes()
        .iter()
        .flat_map(|(_, scope)| scope.symbols().iter())
        .filter(|symbol| symbol.kind == SymbolKind::Function);

    for function in functions {
        let head = format!("{:<13}  {:<13} ", function.name, function.ty);
        let params = function.decl.and_then(|decl| tree.child(decl, 0));

        let Some(first) = params.filter(|_| !function.is_placeholder()) else {
            push_row(&mut output, &format!("{} {:<14}  {:<12}", head, "", Type::Undetermined));
            continue;
        };
        if matches!(tree[first].kind, NodeKind::Param { empty_list: true }) {
            push_row(&mut output, &format!("{} {:<14}  {:<12}", head, "", Type::Void));
            continue;
        }

        push_row(&mut output, &head);
        for param in tree.siblings(Some(first)) {
            let row = format!("{:<13}  {:<13}  {:<14}  {:<12}", "-", "-", tree[param].name(), tree[param].ty);
            push_row(&mut output, &row);
        }
    }
    output
}

/// Symbols declared directly in the global scope
pub fn globals(analysis: &Analysis) -> String {
    let mut output = String::new();
    push_row(&mut output, " Symbol Name   Symbol Kind   Symbol Type");
    push_row(&mut output, "-------------  -----------  -------------");

    for symbol in analysis.scopes().get(analysis.global()).symbols().iter() {
        let row = format!("{:<13}  {:<11}  {:<13}", symbol.name, symbol.kind, symbol.ty);
        push_row(&mut output, &row);
    }
    output
}

/// Symbols of every non-global scope with the scope's nesting level
pub fn scopes(analysis: &Analysis) -> String {
    let mut output = String::new();
    push_row(&mut output, " Scope Name   Nested Level   Symbol Name   Symbol Type");
    push_row(&mut output, "------------  ------------  -------------  -----------");

    let directory = analysis.scopes();
    for (id, scope) in directory.iter() {
        if id == analysis.global() || scope.symbols().is_empty() {
            continue;
        }
        let level = directory.depth(id);
        for symbol in scope.symbols().iter() {
            let row = format!("{:<12}  {:<12}  {:<13}  {:<11}", scope.name, level, symbol.name, symbol.ty);
            push_row(&mut output, &row);
        }
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Parser;
    use crate::sema::SemanticAnalyzer;
    use pretty_assertions::assert_eq;

    const PROGRAM: &str = "\
int g;
int sum(int a[], int n) {
    int i;
    i = 0;
    { int t; t = a[i]; }
    return i + n;
}
void main(void) {
    g = sum(g, input());
    foo();
}
";

    fn analyze(source: &str) -> (SyntaxTree, Analysis) {
        let mut tree = Parser::new(source).unwrap().parse().unwrap();
        let analysis = SemanticAnalyzer::new().analyze(&mut tree).unwrap();
        (tree, analysis)
    }

    #[test]
    fn test_symbol_table() {
        let (_, analysis) = analyze(PROGRAM);
        let expected = " Symbol Name   Symbol Kind   Symbol Type    Scope Name   Location  Line Numbers
-------------  -----------  -------------  ------------  --------  ------------
input          Function     int            global        0           0    9
output         Function     void           global        1           0
g              Variable     int            global        2           1    9    9
sum            Function     int            global        3           2    9
main           Function     void           global        4           8
foo            Function     undetermined   global        5          10
value          Variable     int            output        0           0
a              Variable     int[]          sum           0           2    5
n              Variable     int            sum           1           2    6
i              Variable     int            sum           2           3    4    5    6
t              Variable     int            sum.0         0           5    5
";
        assert_eq!(symbol_table(&analysis), expected);
    }

    #[test]
    fn test_functions() {
        let (tree, analysis) = analyze(PROGRAM);
        let expected = "\
Function Name   Return Type   Parameter Name  Parameter Type
-------------  -------------  --------------  --------------
input          int                            void
output         void
-              -              value           int
sum            int
-              -              a               int[]
-              -              n               int
main           void                           void
foo            undetermined                   undetermined
";
        assert_eq!(functions(&tree, &analysis), expected);
    }

    #[test]
    fn test_globals() {
        let (_, analysis) = analyze(PROGRAM);
        let expected = " Symbol Name   Symbol Kind   Symbol Type
-------------  -----------  -------------
input          Function     int
output         Function     void
g              Variable     int
sum            Function     int
main           Function     void
foo            Function     undetermined
";
        assert_eq!(globals(&analysis), expected);
    }

    #[test]
    fn test_scopes_skip_global_and_empty() {
        let (_, analysis) = analyze(PROGRAM);
        let expected = " Scope Name   Nested Level   Symbol Name   Symbol Type
------------  ------------  -------------  -----------
output        1             value          int

sum           1             a              int[]
sum           1             n              int
sum           1             i              int

sum.0         2             t              int

";
        assert_eq!(scopes(&analysis), expected);
    }
}
