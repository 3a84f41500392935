//! Parsing (tokens to AST)
//!
//! Recursive-descent parser with precedence climbing for expressions.
//! Recovers at statement boundaries so a single syntax error does not hide
//! the rest of the file.

use crate::ast::{AssignTarget, BinaryOp, Block, Expr, ExprKind, Program, Stmt, StmtKind, UnaryOp};
use crate::diagnostic::Diagnostic;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parser state for building an AST from tokens
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    /// Create a new parser for the given tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Parse tokens into a program, collecting diagnostics
    pub fn parse(mut self) -> (Program, Vec<Diagnostic>) {
        let mut statements = Vec::new();
        while !self.at_eof() {
            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => self.recover(),
            }
        }
        (Program { statements }, self.diagnostics)
    }

    // ── Statements ───────────────────────────────────────────────────────────

    fn parse_statement(&mut self) -> Option<Stmt> {
        let start = self.peek_span();
        match self.peek_kind() {
            TokenKind::Let => self.parse_let(),
            TokenKind::Fn => self.parse_function(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Loop => self.parse_loop(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => {
                self.advance();
                self.expect_semicolon()?;
                Some(self.stmt(StmtKind::Break, start))
            }
            TokenKind::Continue => {
                self.advance();
                self.expect_semicolon()?;
                Some(self.stmt(StmtKind::Continue, start))
            }
            _ => self.parse_expr_or_assign(),
        }
    }

    fn parse_let(&mut self) -> Option<Stmt> {
        let start = self.peek_span();
        self.advance(); // let
        let name = self.expect_ident()?;
        self.expect(TokenKind::Assign, "expected '=' after variable name")?;
        let init = self.parse_expr()?;
        self.expect_semicolon()?;
        Some(self.stmt(StmtKind::Let { name, init }, start))
    }

    fn parse_function(&mut self) -> Option<Stmt> {
        let start = self.peek_span();
        self.advance(); // fn
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen, "expected '(' after function name")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.expect_ident()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "expected ')' after parameters")?;
        let body = self.parse_block()?;
        Some(self.stmt(StmtKind::Function { name, params, body }, start))
    }

    fn parse_if(&mut self) -> Option<Stmt> {
        let start = self.peek_span();
        self.advance(); // if
        self.expect(TokenKind::LParen, "expected '(' after 'if'")?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen, "expected ')' after condition")?;
        let then_block = self.parse_block()?;
        let else_block = if self.eat(&TokenKind::Else) {
            Some(self.parse_block()?)
        } else {
            None
        };
        Some(self.stmt(
            StmtKind::If {
                cond,
                then_block,
                else_block,
            },
            start,
        ))
    }

    fn parse_while(&mut self) -> Option<Stmt> {
        let start = self.peek_span();
        self.advance(); // while
        self.expect(TokenKind::LParen, "expected '(' after 'while'")?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen, "expected ')' after condition")?;
        let body = self.parse_block()?;
        Some(self.stmt(StmtKind::While { cond, body }, start))
    }

    fn parse_for(&mut self) -> Option<Stmt> {
        let start = self.peek_span();
        self.advance(); // for
        self.expect(TokenKind::LParen, "expected '(' after 'for'")?;
        let init = Box::new(if self.check(&TokenKind::Let) {
            self.parse_let()?
        } else {
            self.parse_expr_or_assign()?
        });
        let cond = self.parse_expr()?;
        self.expect_semicolon()?;
        let step = Box::new(self.parse_assign_no_semicolon()?);
        self.expect(TokenKind::RParen, "expected ')' after for clauses")?;
        let body = self.parse_block()?;
        Some(self.stmt(
            StmtKind::For {
                init,
                cond,
                step,
                body,
            },
            start,
        ))
    }

    fn parse_loop(&mut self) -> Option<Stmt> {
        let start = self.peek_span();
        self.advance(); // loop
        let body = self.parse_block()?;
        Some(self.stmt(StmtKind::Loop { body }, start))
    }

    fn parse_return(&mut self) -> Option<Stmt> {
        let start = self.peek_span();
        self.advance(); // return
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_semicolon()?;
        Some(self.stmt(StmtKind::Return(value), start))
    }

    /// Expression statement or assignment, distinguished after parsing the
    /// left-hand side
    fn parse_expr_or_assign(&mut self) -> Option<Stmt> {
        let stmt = self.parse_assign_no_semicolon()?;
        self.expect_semicolon()?;
        Some(stmt)
    }

    fn parse_assign_no_semicolon(&mut self) -> Option<Stmt> {
        let start = self.peek_span();
        let expr = self.parse_expr()?;

        if self.eat(&TokenKind::Assign) {
            let target = match expr.kind {
                ExprKind::Ident(name) => AssignTarget::Name(name),
                ExprKind::Index { target, index } => AssignTarget::Index {
                    target: *target,
                    index: *index,
                },
                _ => {
                    self.error("invalid assignment target", expr.span.start);
                    return None;
                }
            };
            let value = self.parse_expr()?;
            Some(self.stmt(StmtKind::Assign { target, value }, start))
        } else {
            Some(self.stmt(StmtKind::Expr(expr), start))
        }
    }

    fn parse_block(&mut self) -> Option<Block> {
        let start = self.peek_span();
        self.expect(TokenKind::LBrace, "expected '{'")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => self.recover(),
            }
        }
        let end = self.peek_span();
        self.expect(TokenKind::RBrace, "expected '}'")?;
        Some(Block {
            statements,
            span: start.merge(end),
        })
    }

    // ── Expressions ──────────────────────────────────────────────────────────

    fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_binary(0)
    }

    /// Precedence-climbing binary expression parser
    fn parse_binary(&mut self, min_prec: u8) -> Option<Expr> {
        let mut left = self.parse_unary()?;

        while let Some((op, prec)) = binary_op(self.peek_kind()) {
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary(prec + 1)?;
            let span = left.span.merge(right.span);
            left = Expr {
                kind: ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            };
        }

        Some(left)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let start = self.peek_span();
        let op = match self.peek_kind() {
            TokenKind::Minus => Some(UnaryOp::Negate),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let expr = self.parse_unary()?;
            let span = start.merge(expr.span);
            return Some(Expr {
                kind: ExprKind::Unary {
                    op,
                    expr: Box::new(expr),
                },
                span,
            });
        }
        self.parse_postfix()
    }

    /// Primary expression followed by any number of index suffixes
    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        while self.eat(&TokenKind::LBracket) {
            let index = self.parse_expr()?;
            let end = self.peek_span();
            self.expect(TokenKind::RBracket, "expected ']' after index")?;
            let span = expr.span.merge(end);
            expr = Expr {
                kind: ExprKind::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                },
                span,
            };
        }
        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let span = self.peek_span();
        let token = self.advance();
        let kind = match token.kind {
            TokenKind::Int(n) => ExprKind::Int(n),
            TokenKind::Float(f) => ExprKind::Float(f),
            TokenKind::String(s) => ExprKind::String(s),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Null => ExprKind::Null,
            TokenKind::Ident(name) => {
                if self.eat(&TokenKind::LParen) {
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let end = self.peek_span();
                    self.expect(TokenKind::RParen, "expected ')' after arguments")?;
                    return Some(Expr {
                        kind: ExprKind::Call { callee: name, args },
                        span: span.merge(end),
                    });
                }
                ExprKind::Ident(name)
            }
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                let end = self.peek_span();
                self.expect(TokenKind::RParen, "expected ')'")?;
                return Some(Expr {
                    kind: ExprKind::Group(Box::new(inner)),
                    span: span.merge(end),
                });
            }
            TokenKind::LBracket => {
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RBracket) {
                    loop {
                        elements.push(self.parse_expr()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let end = self.peek_span();
                self.expect(TokenKind::RBracket, "expected ']' after array elements")?;
                return Some(Expr {
                    kind: ExprKind::Array(elements),
                    span: span.merge(end),
                });
            }
            other => {
                self.error(format!("unexpected token {other:?}"), span.start);
                return None;
            }
        };
        Some(Expr { kind, span })
    }

    // ── Token helpers ────────────────────────────────────────────────────────

    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_span(&self) -> Span {
        self.tokens[self.pos.min(self.tokens.len() - 1)].span
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Option<Token> {
        if self.check(&kind) {
            Some(self.advance())
        } else {
            self.error(message, self.peek_span().start);
            None
        }
    }

    fn expect_semicolon(&mut self) -> Option<()> {
        self.expect(TokenKind::Semicolon, "expected ';'").map(|_| ())
    }

    fn expect_ident(&mut self) -> Option<String> {
        if let TokenKind::Ident(name) = self.peek_kind() {
            let name = name.clone();
            self.advance();
            Some(name)
        } else {
            self.error("expected identifier", self.peek_span().start);
            None
        }
    }

    fn error(&mut self, message: impl Into<String>, offset: usize) {
        self.diagnostics.push(Diagnostic::error(message, offset));
    }

    /// Skip to the next statement boundary after a syntax error
    fn recover(&mut self) {
        while !self.at_eof() {
            if matches!(self.peek_kind(), TokenKind::Semicolon | TokenKind::RBrace) {
                self.advance();
                return;
            }
            self.advance();
        }
    }

    fn stmt(&self, kind: StmtKind, start: Span) -> Stmt {
        // The statement span starts at its first token; the end position is
        // the last consumed token's end.
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Stmt {
            kind,
            span: start.merge(end),
        }
    }
}

/// Operator and precedence for a binary token kind (higher binds tighter)
fn binary_op(kind: &TokenKind) -> Option<(BinaryOp, u8)> {
    let entry = match kind {
        TokenKind::OrOr => (BinaryOp::Or, 1),
        TokenKind::AndAnd => (BinaryOp::And, 2),
        TokenKind::Eq => (BinaryOp::Eq, 3),
        TokenKind::Ne => (BinaryOp::Ne, 3),
        TokenKind::Lt => (BinaryOp::Lt, 4),
        TokenKind::Le => (BinaryOp::Le, 4),
        TokenKind::Gt => (BinaryOp::Gt, 4),
        TokenKind::Ge => (BinaryOp::Ge, 4),
        TokenKind::Plus => (BinaryOp::Add, 5),
        TokenKind::Minus => (BinaryOp::Sub, 5),
        TokenKind::Star => (BinaryOp::Mul, 6),
        TokenKind::Slash => (BinaryOp::Div, 6),
        TokenKind::Percent => (BinaryOp::Mod, 6),
        _ => return None,
    };
    Some(entry)
}
