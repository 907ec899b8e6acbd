use crate::finding::{Finding, FindingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which findings one fix batch targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum FixScope {
    /// Exactly one finding of the current tree version.
    Finding(FindingKey),
    /// Every finding of one rule in the document.
    Rule { rule_id: String },
    /// Every fixable finding in the document.
    AllFixable,
}

impl FixScope {
    pub fn rule(rule_id: impl Into<String>) -> Self {
        Self::Rule {
            rule_id: rule_id.into(),
        }
    }

    pub fn includes(&self, finding: &Finding) -> bool {
        match self {
            FixScope::Finding(key) => key.matches(finding),
            FixScope::Rule { rule_id } => &finding.rule_id == rule_id,
            FixScope::AllFixable => true,
        }
    }

    /// A single-finding batch never iterates: the key is only valid for one version.
    pub fn is_single(&self) -> bool {
        matches!(self, FixScope::Finding(_))
    }
}

impl fmt::Display for FixScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixScope::Finding(key) => write!(f, "finding {key}"),
            FixScope::Rule { rule_id } => write!(f, "rule {rule_id}"),
            FixScope::AllFixable => write!(f, "all fixable"),
        }
    }
}
