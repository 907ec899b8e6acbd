use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
}

impl SymbolKind {
    pub const COUNT: usize = 3;

    pub const ALL: [SymbolKind; Self::COUNT] =
        [SymbolKind::Variable, SymbolKind::Parameter, SymbolKind::Function];

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Variable => write!(f, "variable"),
            SymbolKind::Parameter => write!(f, "parameter"),
            SymbolKind::Function => write!(f, "function"),
        }
    }
}

/// A declared name and every resolved use of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Span of the declaring identifier.
    pub decl: Span,
    #[serde(default)]
    pub references: Vec<Span>,
}

impl Symbol {
    pub fn is_unused(&self) -> bool {
        self.references.is_empty()
    }
}

/// Read-only resolution results for one tree version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolContext {
    symbols: Vec<Symbol>,
}

impl SymbolContext {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self { symbols }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn of_kind(&self, kind: SymbolKind) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(move |s| s.kind == kind)
    }

    pub fn declared_at(&self, decl: Span) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.decl == decl)
    }

    /// The symbol a use-site resolves to, if any.
    pub fn resolve_reference(&self, use_site: Span) -> Option<&Symbol> {
        self.symbols
            .iter()
            .find(|s| s.references.contains(&use_site))
    }
}
