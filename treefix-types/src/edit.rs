use crate::finding::Finding;
use crate::span::Span;
use crate::tree::{NodeKind, TreeVersion};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// What replaces the node at an edit's target span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplacementNode {
    /// A newly constructed subtree, already serialized to source text.
    Node { kind: NodeKind, text: String },
    /// Drop the node; the applicator repairs the enclosing statement list.
    Remove,
}

impl ReplacementNode {
    pub fn node(kind: NodeKind, text: impl Into<String>) -> Self {
        Self::Node {
            kind,
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Node { text, .. } => text,
            Self::Remove => "",
        }
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, Self::Remove)
    }

    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            Self::Node { kind, .. } => Some(*kind),
            Self::Remove => None,
        }
    }
}

/// A proposed replacement of one subtree, derived from one finding.
///
/// Only valid against `tree_version`: offsets mean nothing once an ancestor or an
/// earlier sibling has been edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEdit {
    pub rule_id: String,
    pub finding_span: Span,
    pub target_span: Span,
    pub replacement: ReplacementNode,
    pub tree_version: TreeVersion,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
}

impl CandidateEdit {
    pub fn new(
        finding: &Finding,
        target_span: Span,
        replacement: ReplacementNode,
        tree_version: TreeVersion,
    ) -> Self {
        Self {
            rule_id: finding.rule_id.clone(),
            finding_span: finding.span,
            target_span,
            replacement,
            tree_version,
            label: String::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Planner order: span start, span length (narrow first), rule id, finding span,
    /// replacement, label. Total over every field except `tree_version`.
    pub fn stable_cmp(&self, other: &Self) -> Ordering {
        self.target_span
            .start
            .cmp(&other.target_span.start)
            .then(self.target_span.len.cmp(&other.target_span.len))
            .then_with(|| self.rule_id.cmp(&other.rule_id))
            .then_with(|| self.finding_span.cmp(&other.finding_span))
            .then_with(|| self.replacement.is_remove().cmp(&other.replacement.is_remove()))
            .then_with(|| self.replacement.kind().cmp(&other.replacement.kind()))
            .then_with(|| self.replacement.text().cmp(other.replacement.text()))
            .then_with(|| self.label.cmp(&other.label))
    }
}
