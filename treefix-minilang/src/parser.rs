//! Recursive-descent parser producing a lossless [`SyntaxTree`].
//!
//! Grammar:
//!
//! ```text
//! program  := stmt*
//! stmt     := "let" IDENT "=" expr ";"
//!           | "fn" IDENT "(" (IDENT ("," IDENT)*)? ")" block
//!           | "if" "(" expr ")" block ("else" (block | if))?
//!           | "return" expr? ";"
//!           | block
//!           | expr ";"
//! block    := "{" stmt* "}"
//! expr     := binary, lowest to highest: || , && , == != , < <= > >= , + - , * /
//! unary    := ("!" | "-") unary | call
//! call     := primary ("(" (expr ("," expr)*)? ")")*
//! primary  := IDENT | NUMBER | STRING | "true" | "false" | "(" expr ")"
//! ```
//!
//! The parentheses around an `if` condition belong to the statement, not to a `ParenExpr`.

use crate::lexer::{Tok, Token, lex};
use treefix_domain::ParseError;
use treefix_types::span::Span;
use treefix_types::tree::{NodeKind, SyntaxNode, SyntaxTree};

const MAX_DEPTH: usize = 256;

/// Binary operator levels, lowest binding first.
const LEVELS: &[&[Tok]] = &[
    &[Tok::OrOr],
    &[Tok::AndAnd],
    &[Tok::EqEq, Tok::NotEq],
    &[Tok::Lt, Tok::LtEq, Tok::Gt, Tok::GtEq],
    &[Tok::Plus, Tok::Minus],
    &[Tok::Star, Tok::Slash],
];

pub fn parse(source: &str) -> Result<SyntaxTree, ParseError> {
    let tokens = lex(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        eof: source.len(),
    };

    let mut stmts = Vec::new();
    while !parser.at_end() {
        stmts.push(parser.stmt()?);
    }

    let root = SyntaxNode::new(NodeKind::Root, Span::new(0, source.len()), stmts);
    Ok(SyntaxTree::new(source, root))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    eof: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<Tok> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn peek_is(&self, kind: Tok) -> bool {
        self.peek() == Some(kind)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.eof, |t| t.span.start)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).copied()?;
        self.pos += 1;
        Some(tok)
    }

    fn eat(&mut self, kind: Tok) -> Option<Token> {
        if self.peek_is(kind) { self.bump() } else { None }
    }

    fn expect(&mut self, kind: Tok) -> Result<Token, ParseError> {
        self.eat(kind).ok_or_else(|| self.error_expected(kind.describe()))
    }

    fn error_expected(&self, what: &str) -> ParseError {
        let found = self.peek().map_or("end of input", Tok::describe);
        ParseError::new(format!("expected {what}, found {found}"), self.offset())
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::new("nesting too deep", self.offset()));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn stmt(&mut self) -> Result<SyntaxNode, ParseError> {
        self.enter()?;
        let node = match self.peek() {
            Some(Tok::Let) => self.let_stmt(),
            Some(Tok::Fn) => self.fn_decl(),
            Some(Tok::If) => self.if_stmt(),
            Some(Tok::Return) => self.return_stmt(),
            Some(Tok::LBrace) => self.block(),
            _ => self.expr_stmt(),
        };
        self.leave();
        node
    }

    fn let_stmt(&mut self) -> Result<SyntaxNode, ParseError> {
        let kw = self.expect(Tok::Let)?;
        let name = self.expect(Tok::Ident)?;
        self.expect(Tok::Assign)?;
        let init = self.expr()?;
        let semi = self.expect(Tok::Semi)?;
        Ok(SyntaxNode::new(
            NodeKind::LetStmt,
            Span::from_range(kw.span.start, semi.span.end()),
            vec![SyntaxNode::leaf(NodeKind::Ident, name.span), init],
        ))
    }

    fn fn_decl(&mut self) -> Result<SyntaxNode, ParseError> {
        let kw = self.expect(Tok::Fn)?;
        let name = self.expect(Tok::Ident)?;
        let open = self.expect(Tok::LParen)?;

        let mut params = Vec::new();
        if !self.peek_is(Tok::RParen) {
            loop {
                let p = self.expect(Tok::Ident)?;
                params.push(SyntaxNode::leaf(NodeKind::Ident, p.span));
                if self.eat(Tok::Comma).is_none() {
                    break;
                }
            }
        }
        let close = self.expect(Tok::RParen)?;
        let body = self.block()?;

        let param_list = SyntaxNode::new(
            NodeKind::ParamList,
            Span::from_range(open.span.start, close.span.end()),
            params,
        );
        Ok(SyntaxNode::new(
            NodeKind::FnDecl,
            Span::from_range(kw.span.start, body.span.end()),
            vec![SyntaxNode::leaf(NodeKind::Ident, name.span), param_list, body],
        ))
    }

    fn if_stmt(&mut self) -> Result<SyntaxNode, ParseError> {
        let kw = self.expect(Tok::If)?;
        self.expect(Tok::LParen)?;
        let cond = self.expr()?;
        self.expect(Tok::RParen)?;
        let then_block = self.block()?;
        let mut end = then_block.span.end();
        let mut children = vec![cond, then_block];

        if self.eat(Tok::Else).is_some() {
            self.enter()?;
            let alt = match self.peek() {
                Some(Tok::If) => self.if_stmt(),
                Some(Tok::LBrace) => self.block(),
                _ => Err(self.error_expected("`{` or `if` after `else`")),
            };
            self.leave();
            let alt = alt?;
            end = alt.span.end();
            children.push(alt);
        }

        Ok(SyntaxNode::new(
            NodeKind::IfStmt,
            Span::from_range(kw.span.start, end),
            children,
        ))
    }

    fn return_stmt(&mut self) -> Result<SyntaxNode, ParseError> {
        let kw = self.expect(Tok::Return)?;
        let mut children = Vec::new();
        if !self.peek_is(Tok::Semi) {
            children.push(self.expr()?);
        }
        let semi = self.expect(Tok::Semi)?;
        Ok(SyntaxNode::new(
            NodeKind::ReturnStmt,
            Span::from_range(kw.span.start, semi.span.end()),
            children,
        ))
    }

    fn block(&mut self) -> Result<SyntaxNode, ParseError> {
        let open = self.expect(Tok::LBrace)?;
        let mut stmts = Vec::new();
        while !self.peek_is(Tok::RBrace) {
            if self.at_end() {
                return Err(self.error_expected("`}`"));
            }
            stmts.push(self.stmt()?);
        }
        let close = self.expect(Tok::RBrace)?;
        Ok(SyntaxNode::new(
            NodeKind::Block,
            Span::from_range(open.span.start, close.span.end()),
            stmts,
        ))
    }

    fn expr_stmt(&mut self) -> Result<SyntaxNode, ParseError> {
        let expr = self.expr()?;
        let semi = self.expect(Tok::Semi)?;
        Ok(SyntaxNode::new(
            NodeKind::ExprStmt,
            Span::from_range(expr.span.start, semi.span.end()),
            vec![expr],
        ))
    }

    fn expr(&mut self) -> Result<SyntaxNode, ParseError> {
        self.enter()?;
        let expr = self.binary(0);
        self.leave();
        expr
    }

    fn binary(&mut self, level: usize) -> Result<SyntaxNode, ParseError> {
        let Some(ops) = LEVELS.get(level) else {
            return self.unary();
        };

        let mut lhs = self.binary(level + 1)?;
        while self.peek().is_some_and(|k| ops.contains(&k)) {
            self.bump();
            let rhs = self.binary(level + 1)?;
            lhs = SyntaxNode::new(
                NodeKind::BinaryExpr,
                Span::from_range(lhs.span.start, rhs.span.end()),
                vec![lhs, rhs],
            );
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<SyntaxNode, ParseError> {
        if let Some(op) = self.eat(Tok::Bang).or_else(|| self.eat(Tok::Minus)) {
            self.enter()?;
            let operand = self.unary();
            self.leave();
            let operand = operand?;
            return Ok(SyntaxNode::new(
                NodeKind::UnaryExpr,
                Span::from_range(op.span.start, operand.span.end()),
                vec![operand],
            ));
        }
        self.call()
    }

    fn call(&mut self) -> Result<SyntaxNode, ParseError> {
        let mut callee = self.primary()?;
        while let Some(open) = self.eat(Tok::LParen) {
            let mut args = Vec::new();
            if !self.peek_is(Tok::RParen) {
                loop {
                    args.push(self.expr()?);
                    if self.eat(Tok::Comma).is_none() {
                        break;
                    }
                }
            }
            let close = self.expect(Tok::RParen)?;
            let arg_list = SyntaxNode::new(
                NodeKind::ArgList,
                Span::from_range(open.span.start, close.span.end()),
                args,
            );
            callee = SyntaxNode::new(
                NodeKind::CallExpr,
                Span::from_range(callee.span.start, close.span.end()),
                vec![callee, arg_list],
            );
        }
        Ok(callee)
    }

    fn primary(&mut self) -> Result<SyntaxNode, ParseError> {
        match self.peek() {
            Some(Tok::Ident) => {
                let tok = self.expect(Tok::Ident)?;
                Ok(SyntaxNode::leaf(NodeKind::Ident, tok.span))
            }
            Some(Tok::Number | Tok::Str | Tok::True | Tok::False) => {
                let tok = self.bump().ok_or_else(|| self.error_expected("literal"))?;
                Ok(SyntaxNode::leaf(NodeKind::Literal, tok.span))
            }
            Some(Tok::LParen) => {
                let open = self.expect(Tok::LParen)?;
                let inner = self.expr()?;
                let close = self.expect(Tok::RParen)?;
                Ok(SyntaxNode::new(
                    NodeKind::ParenExpr,
                    Span::from_range(open.span.start, close.span.end()),
                    vec![inner],
                ))
            }
            _ => Err(self.error_expected("expression")),
        }
    }
}
