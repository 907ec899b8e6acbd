use treefix_domain::{
    FixStrategy, FixStrategyError, Rule, RuleContext, RuleError, Subscription, Target,
};
use treefix_types::edit::{CandidateEdit, ReplacementNode};
use treefix_types::finding::Finding;
use treefix_types::span::Span;
use treefix_types::tree::{NodeKind, SyntaxNode, SyntaxTree};

/// An `else` block that adds nothing.
///
/// Two shapes:
/// - `if (c) { } else { body }` becomes `if (!c) { body }`;
/// - `if (c) { ...; return x; } else { body }` in a statement list becomes
///   `if (c) { ...; return x; }` followed by `body`.
pub struct RedundantElse;

const SHAPE: &str = "shape";
const EMPTY_THEN: &str = "empty_then";
const EARLY_RETURN: &str = "early_return";

struct IfParts<'n> {
    cond: &'n SyntaxNode,
    then_block: &'n SyntaxNode,
    else_block: &'n SyntaxNode,
}

impl RedundantElse {
    const ID: &'static str = "redundant_else";

    fn parts(node: &SyntaxNode) -> Option<IfParts<'_>> {
        if node.kind != NodeKind::IfStmt {
            return None;
        }
        let else_block = node.child(2).filter(|n| n.kind == NodeKind::Block)?;
        Some(IfParts {
            cond: node.child(0)?,
            then_block: node.child(1)?,
            else_block,
        })
    }

    fn shape(node: &SyntaxNode, tree: &SyntaxTree) -> Option<&'static str> {
        let parts = Self::parts(node)?;
        if parts.then_block.children.is_empty() {
            return Some(EMPTY_THEN);
        }
        let ends_in_return = parts
            .then_block
            .children
            .last()
            .is_some_and(|s| s.kind == NodeKind::ReturnStmt);
        let in_statement_list = tree
            .parent_of(node.span)
            .is_some_and(|p| p.kind.holds_statements());
        (ends_in_return && in_statement_list).then_some(EARLY_RETURN)
    }
}

impl Rule for RedundantElse {
    fn id(&self) -> &str {
        Self::ID
    }

    fn description(&self) -> &str {
        "`else` after an empty `then` block or after an early return"
    }

    fn subscriptions(&self) -> &[Subscription] {
        &[Subscription::Node(NodeKind::IfStmt)]
    }

    fn evaluate(&self, target: Target<'_>, cx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        let Target::Node(node) = target else {
            return Ok(vec![]);
        };
        let Some(shape) = Self::shape(node, cx.tree) else {
            return Ok(vec![]);
        };
        let message = if shape == EMPTY_THEN {
            "empty `if` block with an `else`; negate the condition instead"
        } else {
            "`else` after `return` is unnecessary"
        };
        Ok(vec![
            cx.finding(Self::ID, node.span)
                .with_message(message)
                .with_context(SHAPE, shape),
        ])
    }

    fn fix_strategy(&self) -> Option<&dyn FixStrategy> {
        Some(self)
    }
}

impl FixStrategy for RedundantElse {
    fn fix(
        &self,
        finding: &Finding,
        cx: &RuleContext<'_>,
    ) -> Result<Option<CandidateEdit>, FixStrategyError> {
        let node = cx
            .tree
            .node_at_kind(finding.span, NodeKind::IfStmt)
            .ok_or(FixStrategyError::SpanMismatch(finding.span))?;
        let parts = Self::parts(node)
            .ok_or_else(|| FixStrategyError::failed("not an if/else with a block"))?;

        let (text, label) = match finding.context_str(SHAPE) {
            Some(EMPTY_THEN) => (
                format!(
                    "if ({}) {}",
                    negate(cx.tree, parts.cond),
                    cx.text(parts.else_block)
                ),
                "Negate condition and drop empty block",
            ),
            Some(EARLY_RETURN) => {
                if hoist_shadows_later_names(cx.tree, node, &parts) {
                    return Ok(None);
                }
                (hoist_else(cx.tree, node, &parts), "Unwrap `else` block")
            }
            other => {
                return Err(FixStrategyError::failed(format!(
                    "unknown shape {other:?}"
                )));
            }
        };

        Ok(Some(
            CandidateEdit::new(
                finding,
                node.span,
                ReplacementNode::node(NodeKind::IfStmt, text),
                cx.tree.version(),
            )
            .with_label(label),
        ))
    }
}

/// Source text of the logical negation of `cond`.
fn negate(tree: &SyntaxTree, cond: &SyntaxNode) -> String {
    let text = tree.node_text(cond);
    match cond.kind {
        NodeKind::UnaryExpr if text.starts_with('!') => match cond.child(0) {
            Some(inner) if inner.kind == NodeKind::ParenExpr => inner
                .child(0)
                .map_or_else(|| tree.node_text(inner).to_string(), |e| tree.node_text(e).to_string()),
            Some(inner) => tree.node_text(inner).to_string(),
            None => format!("!({text})"),
        },
        NodeKind::BinaryExpr => format!("!({text})"),
        _ => format!("!{text}"),
    }
}

/// Whether a `let` in the `else` block binds a name that a later statement of the
/// enclosing list declares or reads. Hoisting would then rebind it for those statements.
fn hoist_shadows_later_names(tree: &SyntaxTree, node: &SyntaxNode, parts: &IfParts<'_>) -> bool {
    let declared: Vec<&str> = parts
        .else_block
        .children
        .iter()
        .filter(|s| s.kind == NodeKind::LetStmt)
        .filter_map(|s| s.child(0))
        .map(|name| tree.node_text(name))
        .collect();
    if declared.is_empty() {
        return false;
    }
    let Some(list) = tree.parent_of(node.span) else {
        return false;
    };
    list.children
        .iter()
        .filter(|s| s.span.start >= node.span.end())
        .flat_map(SyntaxNode::descendants)
        .filter(|n| n.kind == NodeKind::Ident)
        .any(|n| declared.contains(&tree.node_text(n)))
}

/// `if (c) then` followed by the `else` statements, re-indented to the `if`'s line.
fn hoist_else(tree: &SyntaxTree, node: &SyntaxNode, parts: &IfParts<'_>) -> String {
    let head = tree.slice(Span::from_range(node.span.start, parts.then_block.span.end()));
    let (Some(first), Some(last)) = (
        parts.else_block.children.first(),
        parts.else_block.children.last(),
    ) else {
        return head.to_string();
    };

    let indent = tree.line_indent(node.span.start);
    let inner_indent = tree.line_indent(first.span.start);
    let body = tree.slice(Span::from_range(first.span.start, last.span.end()));

    let mut out = String::with_capacity(head.len() + body.len() + 16);
    out.push_str(head);
    for (i, line) in body.lines().enumerate() {
        out.push('\n');
        let line = if i == 0 {
            line
        } else {
            line.strip_prefix(inner_indent).unwrap_or(line.trim_start())
        };
        if !line.is_empty() {
            out.push_str(indent);
            out.push_str(line);
        }
    }
    out
}
