use crate::error::{FixStrategyError, panic_message};
use crate::registry::RuleRegistry;
use crate::rules::RuleContext;
use sha2::{Digest, Sha256};
use std::panic::{AssertUnwindSafe, catch_unwind};
use treefix_types::edit::{CandidateEdit, ReplacementNode};
use treefix_types::finding::Finding;
use treefix_types::outcome::Issue;
use treefix_types::plan::{EditPlan, PlannedEdit, RejectReason, RejectedEdit};
use treefix_types::tree::SyntaxTree;
use uuid::Uuid;

/// Fix strategy output for one pass.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    pub edits: Vec<CandidateEdit>,
    /// Findings whose rule has a fix strategy.
    pub fixable: u64,
    /// Strategies that answered "no fix".
    pub no_fix: u64,
    pub issues: Vec<Issue>,
}

/// Ask each finding's fix strategy for an edit and keep the local ones.
///
/// Findings of report-only or unknown rules are skipped. A strategy that fails, panics, or
/// returns an edit that is stale, non-local or not aligned to a node costs exactly that
/// one edit.
pub fn build_candidates(
    registry: &RuleRegistry,
    findings: &[Finding],
    cx: &RuleContext<'_>,
) -> Candidates {
    let mut out = Candidates::default();

    for finding in findings {
        let Some(strategy) = registry
            .get(&finding.rule_id)
            .and_then(|rule| rule.fix_strategy())
        else {
            continue;
        };
        out.fixable += 1;

        let result = catch_unwind(AssertUnwindSafe(|| strategy.fix(finding, cx)))
            .unwrap_or_else(|payload| {
                Err(FixStrategyError::Panicked(panic_message(&*payload)))
            })
            .and_then(|edit| match edit {
                Some(edit) => validate_locality(&edit, finding, cx.tree).map(|()| Some(edit)),
                None => Ok(None),
            });

        match result {
            Ok(Some(edit)) => out.edits.push(edit),
            Ok(None) => out.no_fix += 1,
            Err(err) => {
                tracing::warn!(
                    rule = %finding.rule_id,
                    span = %finding.span,
                    error = %err,
                    "fix strategy failed; edit dropped"
                );
                out.issues.push(Issue::fix_strategy(
                    finding.rule_id.clone(),
                    finding.span,
                    err.to_string(),
                ));
            }
        }
    }

    out
}

fn validate_locality(
    edit: &CandidateEdit,
    finding: &Finding,
    tree: &SyntaxTree,
) -> Result<(), FixStrategyError> {
    if edit.tree_version != tree.version() {
        return Err(FixStrategyError::StaleTree {
            expected: tree.version(),
            found: edit.tree_version,
        });
    }
    if !finding.span.contains(edit.target_span) {
        return Err(FixStrategyError::NotLocal {
            target: edit.target_span,
            finding: finding.span,
        });
    }
    if tree.node_at(edit.target_span).is_none() {
        return Err(FixStrategyError::SpanMismatch(edit.target_span));
    }
    Ok(())
}

/// Resolve candidates against `tree` into one conflict-free plan.
///
/// Candidates are sorted by span start, narrowest first, then rule id, so the outcome does
/// not depend on input order. Walking that order against the last accepted edit:
/// - disjoint (starts at or after its end): accepted;
/// - same span: rejected as overlap, the smaller rule id already won;
/// - same start, strictly wider: the outer edit wins and the accepted edits it encloses are
///   moved to `rejected` as superseded;
/// - enclosed by it: rejected as nested;
/// - anything else: rejected as overlap.
///
/// Rejected candidates are not retried in this pass; their locations are re-analyzed on the
/// next tree.
pub fn plan(tree: &SyntaxTree, candidates: Vec<CandidateEdit>) -> EditPlan {
    let mut plan = EditPlan::new(tree.version(), tree.fingerprint());

    let (mut current, mut stale): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|c| c.tree_version == tree.version());

    stale.sort_by(|a, b| a.stable_cmp(b).then(a.tree_version.cmp(&b.tree_version)));
    for edit in stale {
        plan.rejected.push(RejectedEdit {
            edit,
            reason: RejectReason::Stale,
            conflicts_with: None,
        });
    }

    current.sort_by(CandidateEdit::stable_cmp);

    let mut accepted: Vec<PlannedEdit> = Vec::with_capacity(current.len());
    // Identical candidates sort next to each other.
    let mut previous: Option<(CandidateEdit, Option<String>)> = None;

    for cand in current {
        if let Some((prev, prev_id)) = &previous
            && *prev == cand
        {
            plan.rejected.push(RejectedEdit {
                edit: cand,
                reason: RejectReason::Duplicate,
                conflicts_with: prev_id.clone(),
            });
            continue;
        }

        let outcome = place(&mut accepted, &mut plan.rejected, &cand);
        let accepted_id = match outcome {
            Placement::Accepted(id) => Some(id),
            Placement::Rejected { reason, against } => {
                plan.rejected.push(RejectedEdit {
                    edit: cand.clone(),
                    reason,
                    conflicts_with: Some(against),
                });
                None
            }
        };
        previous = Some((cand, accepted_id));
    }

    plan.edits = accepted;

    let summary = plan.summary();
    tracing::debug!(
        version = %plan.tree_version,
        accepted = summary.accepted,
        nested = summary.nested,
        overlap = summary.overlap,
        duplicate = summary.duplicate,
        stale = summary.stale,
        "planned edits"
    );
    plan
}

enum Placement {
    Accepted(String),
    Rejected { reason: RejectReason, against: String },
}

fn place(
    accepted: &mut Vec<PlannedEdit>,
    rejected: &mut Vec<RejectedEdit>,
    cand: &CandidateEdit,
) -> Placement {
    let span = cand.target_span;
    let Some(last) = accepted.last() else {
        return accept(accepted, cand);
    };
    let last_span = last.edit.target_span;

    if span.start >= last_span.end() {
        return accept(accepted, cand);
    }

    if span == last_span {
        return Placement::Rejected {
            reason: RejectReason::Overlap,
            against: last.id.clone(),
        };
    }

    if span.start == last_span.start && span.len > last_span.len {
        let keep = accepted
            .iter()
            .rposition(|p| !span.encloses(p.edit.target_span))
            .map_or(0, |i| i + 1);
        // Whatever stays must still end before the outer edit starts.
        if let Some(blocker) = accepted[..keep]
            .last()
            .filter(|p| p.edit.target_span.end() > span.start)
        {
            return Placement::Rejected {
                reason: RejectReason::Overlap,
                against: blocker.id.clone(),
            };
        }

        let id = deterministic_edit_id(cand).to_string();
        for inner in accepted.drain(keep..) {
            rejected.push(RejectedEdit {
                edit: inner.edit,
                reason: RejectReason::Superseded,
                conflicts_with: Some(id.clone()),
            });
        }
        accepted.push(PlannedEdit {
            id: id.clone(),
            edit: cand.clone(),
        });
        return Placement::Accepted(id);
    }

    if last_span.encloses(span) {
        return Placement::Rejected {
            reason: RejectReason::Nested,
            against: last.id.clone(),
        };
    }

    Placement::Rejected {
        reason: RejectReason::Overlap,
        against: last.id.clone(),
    }
}

fn accept(accepted: &mut Vec<PlannedEdit>, cand: &CandidateEdit) -> Placement {
    let id = deterministic_edit_id(cand).to_string();
    accepted.push(PlannedEdit {
        id: id.clone(),
        edit: cand.clone(),
    });
    Placement::Accepted(id)
}

/// Content-derived id: v5(namespace, rule|start|len|replacement fingerprint).
pub fn deterministic_edit_id(edit: &CandidateEdit) -> Uuid {
    const NAMESPACE: Uuid = Uuid::from_bytes([
        0x7a, 0x1c, 0x52, 0x0e, 0x93, 0x4f, 0x4d, 0x2b, 0xa1, 0x66, 0x3e, 0x0d, 0x5c, 0x28, 0xb7,
        0x41,
    ]);

    let stable_key = format!(
        "{}|{}|{}|{}",
        edit.rule_id,
        edit.target_span.start,
        edit.target_span.len,
        replacement_fingerprint(&edit.replacement)
    );
    Uuid::new_v5(&NAMESPACE, stable_key.as_bytes())
}

fn replacement_fingerprint(replacement: &ReplacementNode) -> String {
    let ReplacementNode::Node { kind, text } = replacement else {
        return "remove".to_string();
    };
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
