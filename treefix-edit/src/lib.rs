//! Fix applicator for treefix plans.
//!
//! Responsibilities:
//! - Check that a plan still matches the tree it is applied to (version + sha256).
//! - Splice accepted edits into the text, rightmost first, and repair statement lists.
//! - Re-parse the result through the front end; a failure is tree corruption.
//! - Render a unified diff preview.

mod error;

pub use error::{ApplyError, ApplyResult};

use diffy::PatchFormatter;
use serde::Serialize;
use treefix_domain::FrontEnd;
use treefix_types::edit::ReplacementNode;
use treefix_types::plan::{EditPlan, PlannedEdit};
use treefix_types::span::Span;
use treefix_types::tree::SyntaxTree;

/// One edit as it landed: where it was, and where its replacement sits in the new text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedEdit {
    pub id: String,
    pub rule_id: String,
    pub old_span: Span,
    /// Empty for removals.
    pub new_span: Span,
}

#[derive(Debug, Clone)]
pub struct AppliedPlan {
    /// Re-parsed tree at `version + 1`.
    pub tree: SyntaxTree,
    /// In plan order (ascending old span).
    pub edits: Vec<AppliedEdit>,
}

/// Commit `plan` against `tree`, producing exactly one new tree.
///
/// The input tree is never touched. Any failure leaves the caller with the original.
pub fn apply_plan(
    front_end: &dyn FrontEnd,
    tree: &SyntaxTree,
    plan: &EditPlan,
) -> ApplyResult<AppliedPlan> {
    if plan.tree_version != tree.version() || plan.tree_fingerprint != tree.fingerprint() {
        return Err(ApplyError::StalePlan {
            plan_version: plan.tree_version,
            plan_fingerprint: plan.tree_fingerprint.clone(),
            tree_version: tree.version(),
            tree_fingerprint: tree.fingerprint().to_string(),
        });
    }

    let mut prev_end = 0usize;
    for planned in &plan.edits {
        let span = planned.edit.target_span;
        if span.start < prev_end || tree.node_at(span).is_none() {
            return Err(ApplyError::SpanMismatch {
                id: planned.id.clone(),
                span,
            });
        }
        prev_end = span.end();
    }

    let text = tree.text();
    let ranges = effective_ranges(text, &plan.edits);

    // Rightmost first keeps every remaining offset valid.
    let mut out = text.to_string();
    for (planned, range) in plan.edits.iter().zip(&ranges).rev() {
        out.replace_range(range.as_range(), planned.edit.replacement.text());
    }

    let mut edits = Vec::with_capacity(plan.edits.len());
    let mut delta: isize = 0;
    for (planned, range) in plan.edits.iter().zip(&ranges) {
        let inserted = planned.edit.replacement.text().len();
        let new_start = offset(range.start, delta);
        edits.push(AppliedEdit {
            id: planned.id.clone(),
            rule_id: planned.edit.rule_id.clone(),
            old_span: planned.edit.target_span,
            new_span: Span::new(new_start, inserted),
        });
        delta += inserted as isize - range.len as isize;
    }

    let new_tree = front_end.parse(&out).map_err(|err| {
        tracing::error!(
            version = %tree.version(),
            error = %err,
            "applied plan does not re-parse"
        );
        ApplyError::TreeCorruption(err)
    })?;
    let new_tree = new_tree.with_version(tree.version().next());

    tracing::debug!(
        from = %tree.version(),
        to = %new_tree.version(),
        edits = edits.len(),
        "applied plan"
    );
    Ok(AppliedPlan {
        tree: new_tree,
        edits,
    })
}

fn offset(pos: usize, delta: isize) -> usize {
    pos.saturating_add_signed(delta)
}

/// The byte range each edit actually replaces.
///
/// Node replacements replace exactly their target. A removal takes its whole line when the
/// node is alone on it, otherwise the node plus the blanks that follow it on the same line;
/// neither ever reaches into a neighbouring edit.
fn effective_ranges(text: &str, edits: &[PlannedEdit]) -> Vec<Span> {
    let mut ranges: Vec<Span> = Vec::with_capacity(edits.len());
    for (i, planned) in edits.iter().enumerate() {
        let span = planned.edit.target_span;
        if !matches!(planned.edit.replacement, ReplacementNode::Remove) {
            ranges.push(span);
            continue;
        }

        let lower = ranges.last().map_or(0, |r| r.end());
        let upper = edits
            .get(i + 1)
            .map_or(text.len(), |next| next.edit.target_span.start);
        ranges.push(removal_range(text, span, lower, upper));
    }
    ranges
}

fn removal_range(text: &str, span: Span, lower: usize, upper: usize) -> Span {
    let bytes = text.as_bytes();
    let is_blank = |b: &u8| *b == b' ' || *b == b'\t' || *b == b'\r';

    let line_start = bytes[..span.start]
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |p| p + 1);
    let line_end = bytes[span.end()..]
        .iter()
        .position(|b| *b == b'\n')
        .map_or(bytes.len(), |p| span.end() + p + 1);

    let alone_before = bytes[line_start..span.start].iter().all(is_blank);
    let alone_after = bytes[span.end()..line_end]
        .iter()
        .all(|b| is_blank(b) || *b == b'\n');

    if alone_before && alone_after && line_start >= lower && line_end <= upper {
        return Span::from_range(line_start, line_end);
    }

    let trailing = bytes[span.end()..upper.max(span.end())]
        .iter()
        .take_while(|b| is_blank(b))
        .count();
    Span::new(span.start, span.len + trailing)
}

/// Render a unified diff of one document, git style.
pub fn render_patch(path: &str, before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }

    let formatter = PatchFormatter::new();
    let mut out = String::new();
    out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
    out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path));

    let patch = diffy::create_patch(before, after);
    let body = formatter.fmt_patch(&patch).to_string();
    // diffy repeats its own ---/+++ header; keep ours.
    for line in body.lines().skip_while(|l| l.starts_with("---") || l.starts_with("+++")) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use treefix_domain::ParseError;
    use treefix_types::edit::CandidateEdit;
    use treefix_types::finding::{Finding, Severity};
    use treefix_types::symbols::SymbolContext;
    use treefix_types::tree::{NodeKind, SyntaxNode};

    /// One `ExprStmt` per `;`-terminated run of non-blank text; `#` is a syntax error.
    struct Statements;

    impl FrontEnd for Statements {
        fn language(&self) -> &str {
            "statements"
        }

        fn parse(&self, text: &str) -> Result<SyntaxTree, ParseError> {
            if let Some(pos) = text.find('#') {
                return Err(ParseError::new("unexpected `#`", pos));
            }
            let mut children = Vec::new();
            let mut start: Option<usize> = None;
            for (i, b) in text.bytes().enumerate() {
                if start.is_none() && !b.is_ascii_whitespace() {
                    start = Some(i);
                }
                if b == b';'
                    && let Some(s) = start.take()
                {
                    children.push(SyntaxNode::leaf(NodeKind::ExprStmt, Span::from_range(s, i + 1)));
                }
            }
            Ok(SyntaxTree::new(
                text,
                SyntaxNode::new(NodeKind::Root, Span::new(0, text.len()), children),
            ))
        }

        fn resolve(&self, _tree: &SyntaxTree) -> SymbolContext {
            SymbolContext::default()
        }
    }

    fn planned(tree: &SyntaxTree, span: Span, replacement: ReplacementNode) -> PlannedEdit {
        let finding = Finding::new("test_rule", span, Severity::Warning);
        PlannedEdit {
            id: format!("edit-{}", span.start),
            edit: CandidateEdit::new(&finding, span, replacement, tree.version()),
        }
    }

    fn plan_of(tree: &SyntaxTree, edits: Vec<PlannedEdit>) -> EditPlan {
        let mut plan = EditPlan::new(tree.version(), tree.fingerprint());
        plan.edits = edits;
        plan
    }

    fn stmt(text: &str) -> ReplacementNode {
        ReplacementNode::node(NodeKind::ExprStmt, text)
    }

    #[test]
    fn replacements_splice_rightmost_first_and_report_new_spans() {
        let tree = Statements.parse("a; bb; c;\n").expect("parse");
        let plan = plan_of(
            &tree,
            vec![
                planned(&tree, Span::new(0, 2), stmt("xxxx;")),
                planned(&tree, Span::new(7, 2), stmt("y;")),
            ],
        );

        let applied = apply_plan(&Statements, &tree, &plan).expect("apply");
        assert_eq!(applied.tree.text(), "xxxx; bb; y;\n");
        assert_eq!(applied.tree.version(), tree.version().next());
        assert_eq!(applied.edits[0].new_span, Span::new(0, 5));
        assert_eq!(applied.edits[1].new_span, Span::new(10, 2));
        assert_eq!(applied.tree.slice(applied.edits[1].new_span), "y;");
        assert_eq!(tree.text(), "a; bb; c;\n");
    }

    #[test]
    fn removal_takes_the_whole_line_when_alone() {
        let tree = Statements.parse("a;\n    b;\nc;\n").expect("parse");
        let plan = plan_of(&tree, vec![planned(&tree, Span::new(7, 2), ReplacementNode::Remove)]);

        let applied = apply_plan(&Statements, &tree, &plan).expect("apply");
        assert_eq!(applied.tree.text(), "a;\nc;\n");
        assert_eq!(applied.edits[0].new_span, Span::at(3));
    }

    #[test]
    fn removal_inside_a_line_eats_following_blanks() {
        let tree = Statements.parse("a; b; c;\n").expect("parse");
        let plan = plan_of(&tree, vec![planned(&tree, Span::new(3, 2), ReplacementNode::Remove)]);

        let applied = apply_plan(&Statements, &tree, &plan).expect("apply");
        assert_eq!(applied.tree.text(), "a; c;\n");
    }

    #[test]
    fn adjacent_removals_do_not_eat_each_other() {
        let tree = Statements.parse("a;\nb;\nc;\n").expect("parse");
        let plan = plan_of(
            &tree,
            vec![
                planned(&tree, Span::new(0, 2), ReplacementNode::Remove),
                planned(&tree, Span::new(3, 2), ReplacementNode::Remove),
            ],
        );

        let applied = apply_plan(&Statements, &tree, &plan).expect("apply");
        assert_eq!(applied.tree.text(), "c;\n");
    }

    #[test]
    fn stale_plan_is_refused() {
        let tree = Statements.parse("a;\n").expect("parse");
        let mut plan = plan_of(&tree, vec![]);
        plan.tree_fingerprint = "0".repeat(64);
        assert!(matches!(
            apply_plan(&Statements, &tree, &plan),
            Err(ApplyError::StalePlan { .. })
        ));

        let bumped = tree.clone().with_version(tree.version().next());
        let plan = plan_of(&tree, vec![]);
        assert!(matches!(
            apply_plan(&Statements, &bumped, &plan),
            Err(ApplyError::StalePlan { .. })
        ));
    }

    #[test]
    fn edit_off_node_boundaries_is_a_span_mismatch() {
        let tree = Statements.parse("a; b;\n").expect("parse");
        let plan = plan_of(&tree, vec![planned(&tree, Span::new(1, 3), stmt("z;"))]);
        assert!(matches!(
            apply_plan(&Statements, &tree, &plan),
            Err(ApplyError::SpanMismatch { span, .. }) if span == Span::new(1, 3)
        ));
    }

    #[test]
    fn unparseable_result_is_tree_corruption() {
        let tree = Statements.parse("a; b;\n").expect("parse");
        let plan = plan_of(&tree, vec![planned(&tree, Span::new(3, 2), stmt("#;"))]);
        assert!(matches!(
            apply_plan(&Statements, &tree, &plan),
            Err(ApplyError::TreeCorruption(_))
        ));
    }

    #[test]
    fn render_patch_is_empty_for_identical_text() {
        assert_eq!(render_patch("a.ml", "x;\n", "x;\n"), "");
        let patch = render_patch("a.ml", "x;\ny;\n", "x;\n");
        assert!(patch.starts_with("diff --git a/a.ml b/a.ml\n--- a/a.ml\n+++ b/a.ml\n"));
        assert!(patch.contains("-y;"));
        assert_eq!(patch.matches("+++").count(), 1);
    }
}
