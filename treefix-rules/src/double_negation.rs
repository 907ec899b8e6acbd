use treefix_domain::{
    FixStrategy, FixStrategyError, Rule, RuleContext, RuleError, Subscription, Target,
};
use treefix_types::edit::{CandidateEdit, ReplacementNode};
use treefix_types::finding::Finding;
use treefix_types::tree::{NodeKind, SyntaxNode};

/// `!!e` is `e`.
pub struct DoubleNegation;

impl DoubleNegation {
    const ID: &'static str = "double_negation";

    /// The operand under two `!`, if `node` is `!!operand`.
    fn operand<'n>(node: &'n SyntaxNode, cx: &RuleContext<'_>) -> Option<&'n SyntaxNode> {
        if node.kind != NodeKind::UnaryExpr || !cx.text(node).starts_with('!') {
            return None;
        }
        let inner = node.child(0)?;
        if inner.kind != NodeKind::UnaryExpr || !cx.text(inner).starts_with('!') {
            return None;
        }
        inner.child(0)
    }
}

impl Rule for DoubleNegation {
    fn id(&self) -> &str {
        Self::ID
    }

    fn description(&self) -> &str {
        "Double logical negation `!!e` can be replaced by `e`"
    }

    fn subscriptions(&self) -> &[Subscription] {
        &[Subscription::Node(NodeKind::UnaryExpr)]
    }

    fn evaluate(&self, target: Target<'_>, cx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        let Target::Node(node) = target else {
            return Ok(vec![]);
        };
        let Some(operand) = Self::operand(node, cx) else {
            return Ok(vec![]);
        };
        Ok(vec![
            cx.finding(Self::ID, node.span)
                .with_message(format!("`{}` is negated twice", cx.text(operand))),
        ])
    }

    fn fix_strategy(&self) -> Option<&dyn FixStrategy> {
        Some(self)
    }
}

impl FixStrategy for DoubleNegation {
    fn fix(
        &self,
        finding: &Finding,
        cx: &RuleContext<'_>,
    ) -> Result<Option<CandidateEdit>, FixStrategyError> {
        let node = cx
            .tree
            .node_at_kind(finding.span, NodeKind::UnaryExpr)
            .ok_or(FixStrategyError::SpanMismatch(finding.span))?;
        let operand = Self::operand(node, cx)
            .ok_or_else(|| FixStrategyError::failed("not a double negation"))?;

        Ok(Some(
            CandidateEdit::new(
                finding,
                node.span,
                ReplacementNode::node(
                    operand.kind,
                    crate::unglued(cx, node.span, cx.text(operand)),
                ),
                cx.tree.version(),
            )
            .with_label("Remove double negation"),
        ))
    }
}
