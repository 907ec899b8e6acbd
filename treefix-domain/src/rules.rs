use crate::error::{FixStrategyError, RuleError};
use treefix_types::edit::CandidateEdit;
use treefix_types::finding::{Finding, Severity};
use treefix_types::span::Span;
use treefix_types::symbols::{Symbol, SymbolContext, SymbolKind};
use treefix_types::tree::{NodeKind, SyntaxNode, SyntaxTree};

/// What a rule wants to be called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subscription {
    Node(NodeKind),
    Symbol(SymbolKind),
}

/// One dispatch unit handed to [`Rule::evaluate`].
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Node(&'a SyntaxNode),
    Symbol(&'a Symbol),
}

/// Read-only state shared by every rule and fix strategy during one pass.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub tree: &'a SyntaxTree,
    pub symbols: &'a SymbolContext,
    /// Effective severity for the rule being evaluated.
    pub severity: Severity,
}

impl<'a> RuleContext<'a> {
    pub fn new(tree: &'a SyntaxTree, symbols: &'a SymbolContext) -> Self {
        Self {
            tree,
            symbols,
            severity: Severity::Warning,
        }
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Start a finding at the effective severity.
    pub fn finding(&self, rule_id: &str, span: Span) -> Finding {
        Finding::new(rule_id, span, self.severity)
    }

    pub fn text(&self, node: &SyntaxNode) -> &'a str {
        self.tree.slice(node.span)
    }
}

/// A pure predicate over syntax nodes or resolved symbols.
///
/// `evaluate` must only depend on its target and the context; collection calls it from many
/// threads at once and in no particular order.
pub trait Rule: Send + Sync {
    /// Stable identifier, lowercase snake case.
    fn id(&self) -> &str;

    fn description(&self) -> &str;

    fn subscriptions(&self) -> &[Subscription];

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn evaluate(&self, target: Target<'_>, cx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError>;

    /// `None` makes the rule report-only.
    fn fix_strategy(&self) -> Option<&dyn FixStrategy> {
        None
    }
}

/// Maps one finding to a local edit of the tree the finding was computed against.
pub trait FixStrategy: Send + Sync {
    /// `Ok(None)` means the finding is real but has no safe automatic fix.
    fn fix(
        &self,
        finding: &Finding,
        cx: &RuleContext<'_>,
    ) -> Result<Option<CandidateEdit>, FixStrategyError>;
}
