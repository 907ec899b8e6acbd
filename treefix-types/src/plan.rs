use crate::edit::CandidateEdit;
use crate::span::Span;
use crate::tree::TreeVersion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Conflict-free, ordered set of edits for one tree version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPlan {
    pub tree_version: TreeVersion,
    pub tree_fingerprint: String,

    /// Accepted edits, ascending by span start.
    #[serde(default)]
    pub edits: Vec<PlannedEdit>,

    /// Candidates held back this pass. Their locations are re-analyzed next pass.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedEdit>,
}

impl EditPlan {
    pub fn new(tree_version: TreeVersion, tree_fingerprint: impl Into<String>) -> Self {
        Self {
            tree_version,
            tree_fingerprint: tree_fingerprint.into(),
            edits: vec![],
            rejected: vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn spans(&self) -> impl Iterator<Item = Span> + '_ {
        self.edits.iter().map(|e| e.edit.target_span)
    }

    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary {
            accepted: self.edits.len() as u64,
            ..PlanSummary::default()
        };
        for r in &self.rejected {
            match r.reason {
                RejectReason::Stale => summary.stale += 1,
                RejectReason::Duplicate => summary.duplicate += 1,
                RejectReason::Nested | RejectReason::Superseded => summary.nested += 1,
                RejectReason::Overlap => summary.overlap += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedEdit {
    /// Deterministic id derived from the edit's content.
    pub id: String,
    pub edit: CandidateEdit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedEdit {
    pub edit: CandidateEdit,
    pub reason: RejectReason,

    /// Id of the accepted edit this candidate lost against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicts_with: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Computed against another tree version.
    Stale,
    /// Identical to an edit already considered.
    Duplicate,
    /// Lies inside an accepted edit.
    Nested,
    /// Partially overlaps an accepted edit, or targets the same span.
    Overlap,
    /// Was accepted, then displaced by an enclosing edit at the same start.
    Superseded,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::Stale => "stale",
            RejectReason::Duplicate => "duplicate",
            RejectReason::Nested => "nested",
            RejectReason::Overlap => "overlap",
            RejectReason::Superseded => "superseded",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub accepted: u64,
    pub nested: u64,
    pub overlap: u64,
    pub duplicate: u64,
    pub stale: u64,
}

impl PlanSummary {
    pub fn rejected(&self) -> u64 {
        self.nested + self.overlap + self.duplicate + self.stale
    }
}
