use treefix_domain::{
    FixStrategy, FixStrategyError, Rule, RuleContext, RuleError, Subscription, Target,
};
use treefix_types::edit::{CandidateEdit, ReplacementNode};
use treefix_types::finding::Finding;
use treefix_types::tree::{NodeKind, SyntaxNode};

/// Parentheses around an atom (identifier, literal or another parenthesized expression).
pub struct RedundantParens;

impl RedundantParens {
    const ID: &'static str = "redundant_parens";

    fn atom(node: &SyntaxNode) -> Option<&SyntaxNode> {
        if node.kind != NodeKind::ParenExpr {
            return None;
        }
        let inner = node.child(0)?;
        matches!(
            inner.kind,
            NodeKind::Ident | NodeKind::Literal | NodeKind::ParenExpr
        )
        .then_some(inner)
    }
}

impl Rule for RedundantParens {
    fn id(&self) -> &str {
        Self::ID
    }

    fn description(&self) -> &str {
        "Parentheses around a single identifier, literal or parenthesized expression"
    }

    fn subscriptions(&self) -> &[Subscription] {
        &[Subscription::Node(NodeKind::ParenExpr)]
    }

    fn evaluate(&self, target: Target<'_>, cx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        let Target::Node(node) = target else {
            return Ok(vec![]);
        };
        if Self::atom(node).is_none() {
            return Ok(vec![]);
        }
        Ok(vec![cx.finding(Self::ID, node.span).with_message("unnecessary parentheses")])
    }

    fn fix_strategy(&self) -> Option<&dyn FixStrategy> {
        Some(self)
    }
}

impl FixStrategy for RedundantParens {
    fn fix(
        &self,
        finding: &Finding,
        cx: &RuleContext<'_>,
    ) -> Result<Option<CandidateEdit>, FixStrategyError> {
        let node = cx
            .tree
            .node_at_kind(finding.span, NodeKind::ParenExpr)
            .ok_or(FixStrategyError::SpanMismatch(finding.span))?;
        let inner = Self::atom(node)
            .ok_or_else(|| FixStrategyError::failed("parentheses are not around an atom"))?;

        let text = crate::unglued(cx, node.span, cx.text(inner));

        Ok(Some(
            CandidateEdit::new(
                finding,
                node.span,
                ReplacementNode::node(inner.kind, text),
                cx.tree.version(),
            )
            .with_label("Remove parentheses"),
        ))
    }
}
