//! Name resolution: lexical scopes over the syntax tree.
//!
//! Functions are visible in their whole enclosing block (declared before its statements run);
//! `let` bindings from the end of their statement on, so `let x = x;` reads the outer `x`.

use std::collections::HashMap;
use treefix_types::symbols::{Symbol, SymbolContext, SymbolKind};
use treefix_types::tree::{NodeKind, SyntaxNode, SyntaxTree};

pub fn resolve(tree: &SyntaxTree) -> SymbolContext {
    let mut resolver = Resolver {
        tree,
        symbols: Vec::new(),
        scopes: vec![HashMap::new()],
    };
    resolver.statements(&tree.root().children);

    let mut symbols = resolver.symbols;
    for sym in &mut symbols {
        sym.references.sort();
    }
    symbols.sort_by_key(|s| s.decl);
    SymbolContext::new(symbols)
}

struct Resolver<'a> {
    tree: &'a SyntaxTree,
    symbols: Vec<Symbol>,
    scopes: Vec<HashMap<&'a str, usize>>,
}

impl<'a> Resolver<'a> {
    fn declare(&mut self, ident: &SyntaxNode, kind: SymbolKind) {
        let tree = self.tree;
        let name = tree.slice(ident.span);
        let idx = self.symbols.len();
        self.symbols.push(Symbol {
            name: name.to_string(),
            kind,
            decl: ident.span,
            references: Vec::new(),
        });
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, idx);
        }
    }

    fn reference(&mut self, ident: &SyntaxNode) {
        let tree = self.tree;
        let name = tree.slice(ident.span);
        let found = self.scopes.iter().rev().find_map(|s| s.get(name).copied());
        match found {
            Some(idx) => self.symbols[idx].references.push(ident.span),
            None => tracing::trace!(name, span = %ident.span, "unresolved name"),
        }
    }

    fn statements(&mut self, stmts: &'a [SyntaxNode]) {
        for stmt in stmts {
            if stmt.kind == NodeKind::FnDecl
                && let Some(name) = stmt.child(0)
            {
                self.declare(name, SymbolKind::Function);
            }
        }
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn scoped(&mut self, f: impl FnOnce(&mut Self)) {
        self.scopes.push(HashMap::new());
        f(self);
        self.scopes.pop();
    }

    fn stmt(&mut self, node: &'a SyntaxNode) {
        match node.kind {
            NodeKind::LetStmt => {
                if let Some(init) = node.child(1) {
                    self.expr(init);
                }
                if let Some(name) = node.child(0) {
                    self.declare(name, SymbolKind::Variable);
                }
            }
            NodeKind::FnDecl => {
                let params = node.child(1);
                let body = node.child(2);
                self.scoped(|r| {
                    for p in params.map(|p| p.children.as_slice()).unwrap_or_default() {
                        r.declare(p, SymbolKind::Parameter);
                    }
                    if let Some(body) = body {
                        r.stmt(body);
                    }
                });
            }
            NodeKind::Block => self.scoped(|r| r.statements(&node.children)),
            NodeKind::IfStmt => {
                for child in &node.children {
                    if child.kind == NodeKind::Block || child.kind == NodeKind::IfStmt {
                        self.stmt(child);
                    } else {
                        self.expr(child);
                    }
                }
            }
            _ => {
                for child in &node.children {
                    self.expr(child);
                }
            }
        }
    }

    fn expr(&mut self, node: &'a SyntaxNode) {
        if node.kind == NodeKind::Ident {
            self.reference(node);
            return;
        }
        for child in &node.children {
            self.expr(child);
        }
    }
}
