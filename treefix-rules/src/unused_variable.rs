use treefix_domain::{
    FixStrategy, FixStrategyError, Rule, RuleContext, RuleError, Subscription, Target,
};
use treefix_types::edit::{CandidateEdit, ReplacementNode};
use treefix_types::finding::Finding;
use treefix_types::symbols::SymbolKind;
use treefix_types::tree::NodeKind;

/// A `let` binding that is never read.
///
/// The fix drops the whole statement, but only when the initializer cannot have side
/// effects (no calls); otherwise the finding stays and the strategy answers "no fix".
pub struct UnusedVariable;

impl UnusedVariable {
    const ID: &'static str = "unused_variable";
}

impl Rule for UnusedVariable {
    fn id(&self) -> &str {
        Self::ID
    }

    fn description(&self) -> &str {
        "Variables that are declared but never used"
    }

    fn subscriptions(&self) -> &[Subscription] {
        &[Subscription::Symbol(SymbolKind::Variable)]
    }

    fn evaluate(&self, target: Target<'_>, cx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        let Target::Symbol(symbol) = target else {
            return Ok(vec![]);
        };
        if !symbol.is_unused() || symbol.name.starts_with('_') {
            return Ok(vec![]);
        }

        let stmt = cx
            .tree
            .parent_of(symbol.decl)
            .filter(|p| p.kind == NodeKind::LetStmt)
            .ok_or_else(|| {
                RuleError::failed(format!("variable `{}` is not declared by a `let`", symbol.name))
            })?;
        let removable = stmt
            .child(1)
            .is_some_and(|init| !init.descendants().any(|n| n.kind == NodeKind::CallExpr));

        Ok(vec![
            cx.finding(Self::ID, stmt.span)
                .with_message(format!("variable `{}` is never used", symbol.name))
                .with_context("name", symbol.name.as_str())
                .with_context("removable", removable),
        ])
    }

    fn fix_strategy(&self) -> Option<&dyn FixStrategy> {
        Some(self)
    }
}

impl FixStrategy for UnusedVariable {
    fn fix(
        &self,
        finding: &Finding,
        cx: &RuleContext<'_>,
    ) -> Result<Option<CandidateEdit>, FixStrategyError> {
        let removable = finding
            .context
            .get("removable")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !removable {
            return Ok(None);
        }

        Ok(Some(
            CandidateEdit::new(finding, finding.span, ReplacementNode::Remove, cx.tree.version())
                .with_label("Remove unused variable"),
        ))
    }
}
