//! Reference front end for treefix.
//!
//! A small brace language with `let`, `fn`, `if`/`else`, `return`, blocks, calls and
//! unary/binary operators. It exists so the engine can be driven end to end; nothing in the
//! engine depends on it.

mod lexer;
mod parser;
mod resolve;

pub use parser::parse;
pub use resolve::resolve;

use treefix_domain::{FrontEnd, ParseError};
use treefix_types::symbols::SymbolContext;
use treefix_types::tree::SyntaxTree;

/// File extension conventionally used for minilang sources.
pub const EXTENSION: &str = "ml";

#[derive(Debug, Clone, Copy, Default)]
pub struct MiniLang;

impl FrontEnd for MiniLang {
    fn language(&self) -> &str {
        "minilang"
    }

    fn parse(&self, text: &str) -> Result<SyntaxTree, ParseError> {
        parser::parse(text)
    }

    fn resolve(&self, tree: &SyntaxTree) -> SymbolContext {
        resolve::resolve(tree)
    }
}
