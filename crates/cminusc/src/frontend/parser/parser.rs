//! Recursive descent parser for C-minus

use crate::common::{CompileError, CompileResult, Span};
use crate::frontend::ast::*;
use crate::frontend::lexer::{Lexer, Token, TokenKind};

/// Recursive descent parser for C-minus
///
/// Builds the arena tree consumed by the semantic analyzer. Lists
/// (declarations, statements, parameters, arguments) are linked through
/// the nodes' sibling slot.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    tree: SyntaxTree,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source
    pub fn new(source: &'a str) -> CompileResult<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            tree: SyntaxTree::new(),
        })
    }

    /// Parse a complete program
    pub fn parse(mut self) -> CompileResult<SyntaxTree> {
        let mut declarations = Vec::new();

        while !self.at_end() {
            declarations.push(self.parse_declaration()?);
        }

        let root = self.tree.chain(&declarations);
        self.tree.set_root(root);
        Ok(self.tree)
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    fn at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> CompileResult<Token> {
        let prev = std::mem::replace(&mut self.current, self.lexer.next_token()?);
        Ok(prev)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> CompileResult<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        if self.check(&kind) {
            self.advance()
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn expect_identifier(&mut self) -> CompileResult<(String, Token)> {
        let token = self.advance()?;
        match &token.kind {
            TokenKind::Identifier(name) => Ok((name.clone(), token.clone())),
            other => Err(CompileError::parser(
                format!("expected identifier, found {}", other),
                token.span,
            )),
        }
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        CompileError::parser(
            format!("expected {}, found {}", expected, self.current.kind),
            self.current.span,
        )
    }

    fn node(&mut self, node: Node) -> NodeId {
        self.tree.alloc(node)
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn parse_type_specifier(&mut self) -> CompileResult<Type> {
        match self.current.kind {
            TokenKind::Int => {
                self.advance()?;
                Ok(Type::Integer)
            }
            TokenKind::Void => {
                self.advance()?;
                Ok(Type::Void)
            }
            _ => Err(self.unexpected("type specifier")),
        }
    }

    fn parse_declaration(&mut self) -> CompileResult<NodeId> {
        let start = self.current.span;
        let ty = self.parse_type_specifier()?;
        let (name, name_token) = self.expect_identifier()?;

        if self.check(&TokenKind::LParen) {
            self.parse_function_rest(ty, name, name_token, start)
        } else {
            self.parse_variable_rest(ty, name, name_token, start)
        }
    }

    /// Parse `type ID ;` or `type ID [ NUM ] ;` after the identifier
    fn parse_variable_rest(
        &mut self,
        ty: Type,
        name: String,
        name_token: Token,
        start: Span,
    ) -> CompileResult<NodeId> {
        let mut decl = Node::new(NodeKind::VariableDecl, name_token.line, start).with_name(name);

        if self.match_token(&TokenKind::LBracket)? {
            let size = self.parse_number()?;
            self.expect(TokenKind::RBracket)?;
            decl = decl.with_type(ty.array_of()).with_child(0, Some(size));
        } else {
            decl = decl.with_type(ty);
        }

        let end = self.expect(TokenKind::Semi)?;
        decl.span = start.merge(end.span);
        Ok(self.node(decl))
    }

    fn parse_function_rest(
        &mut self,
        ty: Type,
        name: String,
        name_token: Token,
        start: Span,
    ) -> CompileResult<NodeId> {
        self.expect(TokenKind::LParen)?;
        let params = self.parse_params()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_compound(true)?;
        let span = start.merge(self.tree[body].span);

        let func = Node::new(NodeKind::FunctionDecl, name_token.line, span)
            .with_name(name)
            .with_type(ty)
            .with_child(0, params)
            .with_child(1, Some(body));
        Ok(self.node(func))
    }

    fn parse_params(&mut self) -> CompileResult<Option<NodeId>> {
        // `( void )` is the empty parameter list; `( void x ...` is a
        // (void-typed) parameter.
        if self.check(&TokenKind::Void) {
            let token = self.advance()?;
            if self.check(&TokenKind::RParen) {
                let param = Node::new(NodeKind::Param { empty_list: true }, token.line, token.span)
                    .with_type(Type::Void);
                return Ok(Some(self.node(param)));
            }
            let first = self.parse_param_rest(Type::Void, token.span)?;
            return self.parse_param_list(first).map(Some);
        }

        let first = self.parse_param()?;
        self.parse_param_list(first).map(Some)
    }

    fn parse_param_list(&mut self, first: NodeId) -> CompileResult<NodeId> {
        let mut params = vec![first];
        while self.match_token(&TokenKind::Comma)? {
            params.push(self.parse_param()?);
        }
        Ok(self.tree.chain(&params).unwrap_or(first))
    }

    fn parse_param(&mut self) -> CompileResult<NodeId> {
        let start = self.current.span;
        let ty = self.parse_type_specifier()?;
        self.parse_param_rest(ty, start)
    }

    fn parse_param_rest(&mut self, ty: Type, start: Span) -> CompileResult<NodeId> {
        let (name, token) = self.expect_identifier()?;
        let mut span = start.merge(token.span);
        let ty = if self.match_token(&TokenKind::LBracket)? {
            span = span.merge(self.expect(TokenKind::RBracket)?.span);
            ty.array_of()
        } else {
            ty
        };

        let param = Node::new(NodeKind::Param { empty_list: false }, token.line, span)
            .with_name(name)
            .with_type(ty);
        Ok(self.node(param))
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_compound(&mut self, function_body: bool) -> CompileResult<NodeId> {
        let open = self.expect(TokenKind::LBrace)?;

        let mut locals = Vec::new();
        while self.current.kind.is_type_specifier() {
            let start = self.current.span;
            let ty = self.parse_type_specifier()?;
            let (name, token) = self.expect_identifier()?;
            locals.push(self.parse_variable_rest(ty, name, token, start)?);
        }

        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.at_end() {
                return Err(self.unexpected("'}'"));
            }
            if let Some(stmt) = self.parse_statement()? {
                statements.push(stmt);
            }
        }
        let close = self.expect(TokenKind::RBrace)?;

        let locals = self.tree.chain(&locals);
        let statements = self.tree.chain(&statements);
        let block = Node::new(NodeKind::Compound { function_body }, open.line, open.span.merge(close.span))
            .with_child(0, locals)
            .with_child(1, statements);
        Ok(self.node(block))
    }

    /// Parse one statement; the empty statement yields no node
    fn parse_statement(&mut self) -> CompileResult<Option<NodeId>> {
        match self.current.kind {
            TokenKind::LBrace => self.parse_compound(false).map(Some),
            TokenKind::If => self.parse_if().map(Some),
            TokenKind::While => self.parse_while().map(Some),
            TokenKind::Return => self.parse_return().map(Some),
            TokenKind::Semi => {
                self.advance()?;
                Ok(None)
            }
            _ => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::Semi)?;
                Ok(Some(expr))
            }
        }
    }

    fn parse_if(&mut self) -> CompileResult<NodeId> {
        let keyword = self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        let then_branch = self.parse_statement()?;
        let else_branch = if self.match_token(&TokenKind::Else)? {
            self.parse_statement()?
        } else {
            None
        };

        let stmt = Node::new(NodeKind::If, keyword.line, keyword.span)
            .with_child(0, Some(condition))
            .with_child(1, then_branch)
            .with_child(2, else_branch);
        Ok(self.node(stmt))
    }

    fn parse_while(&mut self) -> CompileResult<NodeId> {
        let keyword = self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_statement()?;

        let stmt = Node::new(NodeKind::While, keyword.line, keyword.span)
            .with_child(0, Some(condition))
            .with_child(1, body);
        Ok(self.node(stmt))
    }

    fn parse_return(&mut self) -> CompileResult<NodeId> {
        let keyword = self.expect(TokenKind::Return)?;
        if self.check(&TokenKind::Semi) {
            let end = self.advance()?;
            let stmt = Node::new(NodeKind::Return { valueless: true }, keyword.line, keyword.span.merge(end.span));
            return Ok(self.node(stmt));
        }

        let value = self.parse_expression()?;
        let end = self.expect(TokenKind::Semi)?;
        let stmt = Node::new(NodeKind::Return { valueless: false }, keyword.line, keyword.span.merge(end.span))
            .with_child(0, Some(value));
        Ok(self.node(stmt))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expression(&mut self) -> CompileResult<NodeId> {
        let lhs = self.parse_simple_expression()?;

        if self.check(&TokenKind::Eq) {
            if !matches!(self.tree[lhs].kind, NodeKind::VarAccess) {
                return Err(CompileError::parser(
                    "left side of assignment must be a variable",
                    self.tree[lhs].span,
                ));
            }
            let op = self.advance()?;
            let rhs = self.parse_expression()?;
            let span = self.tree[lhs].span.merge(self.tree[rhs].span);
            let assign = Node::new(NodeKind::Assign, op.line, span)
                .with_child(0, Some(lhs))
                .with_child(1, Some(rhs));
            return Ok(self.node(assign));
        }

        Ok(lhs)
    }

    fn parse_simple_expression(&mut self) -> CompileResult<NodeId> {
        let lhs = self.parse_additive()?;
        let op = match self.current.kind {
            TokenKind::Lt => Opcode::Lt,
            TokenKind::LtEq => Opcode::Le,
            TokenKind::Gt => Opcode::Gt,
            TokenKind::GtEq => Opcode::Ge,
            TokenKind::EqEq => Opcode::Eq,
            TokenKind::NotEq => Opcode::Ne,
            _ => return Ok(lhs),
        };
        let token = self.advance()?;
        let rhs = self.parse_additive()?;
        Ok(self.binary(op, &token, lhs, rhs))
    }

    fn parse_additive(&mut self) -> CompileResult<NodeId> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => Opcode::Plus,
                TokenKind::Minus => Opcode::Minus,
                _ => return Ok(lhs),
            };
            let token = self.advance()?;
            let rhs = self.parse_term()?;
            lhs = self.binary(op, &token, lhs, rhs);
        }
    }

    fn parse_term(&mut self) -> CompileResult<NodeId> {
        let mut lhs = self.parse_factor()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => Opcode::Times,
                TokenKind::Slash => Opcode::Over,
                _ => return Ok(lhs),
            };
            let token = self.advance()?;
            let rhs = self.parse_factor()?;
            lhs = self.binary(op, &token, lhs, rhs);
        }
    }

    fn binary(&mut self, op: Opcode, token: &Token, lhs: NodeId, rhs: NodeId) -> NodeId {
        let span = self.tree[lhs].span.merge(self.tree[rhs].span);
        let node = Node::new(NodeKind::BinOp(op), token.line, span)
            .with_child(0, Some(lhs))
            .with_child(1, Some(rhs));
        self.node(node)
    }

    fn parse_factor(&mut self) -> CompileResult<NodeId> {
        match self.current.kind {
            TokenKind::LParen => {
                self.advance()?;
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Number(_) => self.parse_number(),
            TokenKind::Identifier(_) => {
                let (name, token) = self.expect_identifier()?;
                if self.check(&TokenKind::LParen) {
                    self.parse_call(name, token)
                } else {
                    self.parse_var_access(name, token)
                }
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_var_access(&mut self, name: String, token: Token) -> CompileResult<NodeId> {
        let mut span = token.span;
        let index = if self.match_token(&TokenKind::LBracket)? {
            let index = self.parse_expression()?;
            span = span.merge(self.expect(TokenKind::RBracket)?.span);
            Some(index)
        } else {
            None
        };

        let access = Node::new(NodeKind::VarAccess, token.line, span)
            .with_name(name)
            .with_child(0, index);
        Ok(self.node(access))
    }

    fn parse_call(&mut self, name: String, token: Token) -> CompileResult<NodeId> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            args.push(self.parse_expression()?);
            while self.match_token(&TokenKind::Comma)? {
                args.push(self.parse_expression()?);
            }
        }
        let close = self.expect(TokenKind::RParen)?;

        let args = self.tree.chain(&args);
        let call = Node::new(NodeKind::Call, token.line, token.span.merge(close.span))
            .with_name(name)
            .with_child(0, args);
        Ok(self.node(call))
    }

    fn parse_number(&mut self) -> CompileResult<NodeId> {
        let token = self.advance()?;
        let TokenKind::Number(text) = &token.kind else {
            return Err(CompileError::parser(
                format!("expected number, found {}", token.kind),
                token.span,
            ));
        };
        let value: i64 = text.parse().map_err(|_| {
            CompileError::parser(format!("integer literal '{}' is out of range", text), token.span)
        })?;
        Ok(self.node(Node::new(NodeKind::Const(value), token.line, token.span)))
    }
}
