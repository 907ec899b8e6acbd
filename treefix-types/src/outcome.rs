use crate::span::Span;
use crate::tree::TreeVersion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal state of one fix batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixStatus {
    /// A pass produced no accepted edits.
    Done,
    /// The iteration bound (or a repeated tree) stopped the batch with edits still pending.
    Incomplete,
    /// An applied plan failed the re-parse gate; the input was returned unchanged.
    Aborted,
    /// Cancelled at a state transition; the last committed tree was returned.
    Cancelled,
}

impl FixStatus {
    pub fn is_done(self) -> bool {
        matches!(self, FixStatus::Done)
    }
}

impl fmt::Display for FixStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FixStatus::Done => "done",
            FixStatus::Incomplete => "incomplete",
            FixStatus::Aborted => "aborted",
            FixStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A rule predicate failed; its findings were dropped for that pass.
    RuleEvaluation,
    /// A fix strategy failed for one finding; that edit was dropped.
    FixStrategy,
    /// The applied result did not re-parse or the plan no longer matched the tree.
    TreeCorruption,
}

/// An isolated failure. Never a user-facing finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,

    pub message: String,
}

impl Issue {
    pub fn rule_evaluation(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: IssueKind::RuleEvaluation,
            rule_id: Some(rule_id.into()),
            span: None,
            message: message.into(),
        }
    }

    pub fn fix_strategy(rule_id: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind: IssueKind::FixStrategy,
            rule_id: Some(rule_id.into()),
            span: Some(span),
            message: message.into(),
        }
    }

    pub fn tree_corruption(message: impl Into<String>) -> Self {
        Self {
            kind: IssueKind::TreeCorruption,
            rule_id: None,
            span: None,
            message: message.into(),
        }
    }
}

/// What one Collect → Plan → Apply → Verify pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationReport {
    pub iteration: u32,
    pub tree_version: TreeVersion,
    /// Findings in scope for this pass.
    pub findings: u64,
    /// Findings whose rule has a fix strategy.
    pub fixable: u64,
    pub candidates: u64,
    pub no_fix: u64,
    pub accepted: u64,
    pub rejected: u64,
    /// Applied edits whose finding was re-derived at the same (mapped) location.
    pub persisted: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixSummary {
    pub status: FixStatus,
    pub applied: u64,
    /// Fixable findings in scope that remain in the returned tree. A batch cancelled
    /// after an apply never analyzes that tree, so this is 0 there and says nothing.
    pub skipped: u64,
    pub iterations: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Issue>,
}

impl FixSummary {
    pub fn new(status: FixStatus) -> Self {
        Self {
            status,
            applied: 0,
            skipped: 0,
            iterations: 0,
            issues: vec![],
        }
    }

    pub fn has_internal_failure(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.kind == IssueKind::TreeCorruption)
    }
}
