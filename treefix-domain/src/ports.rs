use thiserror::Error;
use treefix_types::symbols::SymbolContext;
use treefix_types::tree::SyntaxTree;

/// Language front end: parsing and symbol resolution.
///
/// The engine never parses on its own; the applicator re-parses every committed text through
/// this port, which makes it the correctness gate for fixes.
pub trait FrontEnd: Send + Sync {
    fn language(&self) -> &str;

    /// Parse `text` into a tree at version 0.
    fn parse(&self, text: &str) -> Result<SyntaxTree, ParseError>;

    fn resolve(&self, tree: &SyntaxTree) -> SymbolContext;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at byte {offset}: {message}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}
