//! Immutable syntax tree over a source text.
//!
//! Nodes only carry a kind, a span and their children; the text itself lives once in
//! the [`SyntaxTree`]. Serializing a tree is therefore lossless: it is the text.

use crate::span::Span;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// Every node kind a rule can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    FnDecl,
    ParamList,
    Block,
    LetStmt,
    IfStmt,
    ReturnStmt,
    ExprStmt,
    BinaryExpr,
    UnaryExpr,
    CallExpr,
    ArgList,
    ParenExpr,
    Ident,
    Literal,
}

impl NodeKind {
    pub const COUNT: usize = 15;

    pub const ALL: [NodeKind; Self::COUNT] = [
        NodeKind::Root,
        NodeKind::FnDecl,
        NodeKind::ParamList,
        NodeKind::Block,
        NodeKind::LetStmt,
        NodeKind::IfStmt,
        NodeKind::ReturnStmt,
        NodeKind::ExprStmt,
        NodeKind::BinaryExpr,
        NodeKind::UnaryExpr,
        NodeKind::CallExpr,
        NodeKind::ArgList,
        NodeKind::ParenExpr,
        NodeKind::Ident,
        NodeKind::Literal,
    ];

    /// Dense index used by dispatch tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Kinds whose children form a statement list.
    pub const fn holds_statements(self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Block)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::FnDecl => "fn_decl",
            NodeKind::ParamList => "param_list",
            NodeKind::Block => "block",
            NodeKind::LetStmt => "let_stmt",
            NodeKind::IfStmt => "if_stmt",
            NodeKind::ReturnStmt => "return_stmt",
            NodeKind::ExprStmt => "expr_stmt",
            NodeKind::BinaryExpr => "binary_expr",
            NodeKind::UnaryExpr => "unary_expr",
            NodeKind::CallExpr => "call_expr",
            NodeKind::ArgList => "arg_list",
            NodeKind::ParenExpr => "paren_expr",
            NodeKind::Ident => "ident",
            NodeKind::Literal => "literal",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind, span: Span, children: Vec<SyntaxNode>) -> Self {
        Self {
            kind,
            span,
            children,
        }
    }

    pub fn leaf(kind: NodeKind, span: Span) -> Self {
        Self::new(kind, span, Vec::new())
    }

    pub fn child(&self, idx: usize) -> Option<&SyntaxNode> {
        self.children.get(idx)
    }

    /// Preorder traversal, starting with `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Outermost node in this subtree whose span is exactly `span`.
    pub fn find_exact(&self, span: Span) -> Option<&SyntaxNode> {
        if self.span == span {
            return Some(self);
        }
        if !self.span.contains(span) {
            return None;
        }
        self.children.iter().find_map(|c| c.find_exact(span))
    }

    /// Node in this subtree whose span is exactly `span` and whose kind is `kind`.
    ///
    /// Nested nodes may share a span (a document that is one statement); this picks
    /// the one of the requested kind rather than the outermost.
    pub fn find_kind(&self, span: Span, kind: NodeKind) -> Option<&SyntaxNode> {
        if !self.span.contains(span) {
            return None;
        }
        if self.span == span && self.kind == kind {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_kind(span, kind))
    }

    fn find_parent(&self, span: Span) -> Option<&SyntaxNode> {
        if !self.span.contains(span) {
            return None;
        }
        for child in &self.children {
            if child.span == span {
                return Some(self);
            }
            if let Some(found) = child.find_parent(span) {
                return Some(found);
            }
        }
        None
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Monotonic version of a document's tree within one batch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TreeVersion(pub u64);

impl TreeVersion {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TreeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A parsed document: text, root node, version and content fingerprint.
///
/// Cloning is cheap for the text (shared); the node tree is cloned.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    text: Arc<str>,
    root: SyntaxNode,
    version: TreeVersion,
    fingerprint: String,
}

impl SyntaxTree {
    pub fn new(text: impl Into<Arc<str>>, root: SyntaxNode) -> Self {
        let text = text.into();
        let fingerprint = fingerprint(&text);
        Self {
            text,
            root,
            version: TreeVersion::default(),
            fingerprint,
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: TreeVersion) -> Self {
        self.version = version;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    pub fn version(&self) -> TreeVersion {
        self.version
    }

    /// sha256 (hex) of the text.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Serialize the tree back to source text.
    pub fn serialize(&self) -> String {
        self.text.to_string()
    }

    pub fn nodes(&self) -> Descendants<'_> {
        self.root.descendants()
    }

    pub fn node_at(&self, span: Span) -> Option<&SyntaxNode> {
        self.root.find_exact(span)
    }

    pub fn node_at_kind(&self, span: Span, kind: NodeKind) -> Option<&SyntaxNode> {
        self.root.find_kind(span, kind)
    }

    pub fn parent_of(&self, span: Span) -> Option<&SyntaxNode> {
        self.root.find_parent(span)
    }

    /// Source text covered by `span`, or `""` if the span is out of range.
    pub fn slice(&self, span: Span) -> &str {
        self.text.get(span.as_range()).unwrap_or("")
    }

    pub fn node_text(&self, node: &SyntaxNode) -> &str {
        self.slice(node.span)
    }

    /// Leading whitespace of the line that contains `offset`.
    pub fn line_indent(&self, offset: usize) -> &str {
        let bytes = self.text.as_bytes();
        let end = offset.min(bytes.len());
        let line_start = bytes[..end]
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |p| p + 1);
        let indent_len = bytes[line_start..end]
            .iter()
            .take_while(|b| **b == b' ' || **b == b'\t')
            .count();
        &self.text[line_start..line_start + indent_len]
    }
}

pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
