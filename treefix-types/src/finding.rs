use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Severity attached to a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warning" | "warn" => Some(Self::Warning),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A located rule violation.
///
/// Identity is `(rule_id, span)`, and only for the tree version the finding was
/// computed against. Findings are never patched in place after an edit; they are
/// recomputed from the new tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub span: Span,
    pub severity: Severity,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// Rule-specific data handed from the predicate to its fix strategy.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, serde_json::Value>,
}

impl Finding {
    pub fn new(rule_id: impl Into<String>, span: Span, severity: Severity) -> Self {
        Self {
            rule_id: rule_id.into(),
            span,
            severity,
            message: String::new(),
            context: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context.get(key).and_then(|v| v.as_str())
    }

    pub fn key(&self) -> FindingKey {
        FindingKey {
            rule_id: self.rule_id.clone(),
            span: self.span,
        }
    }

    /// Deterministic order: span start, span length, rule id, then message.
    pub fn stable_cmp(&self, other: &Self) -> Ordering {
        self.span
            .start
            .cmp(&other.span.start)
            .then(self.span.len.cmp(&other.span.len))
            .then_with(|| self.rule_id.cmp(&other.rule_id))
            .then_with(|| self.message.cmp(&other.message))
    }
}

/// Identity of a finding within one tree version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FindingKey {
    pub rule_id: String,
    pub span: Span,
}

impl FindingKey {
    pub fn new(rule_id: impl Into<String>, span: Span) -> Self {
        Self {
            rule_id: rule_id.into(),
            span,
        }
    }

    pub fn matches(&self, finding: &Finding) -> bool {
        finding.rule_id == self.rule_id && finding.span == self.span
    }
}

impl fmt::Display for FindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.rule_id, self.span)
    }
}

/// Sort findings into their deterministic order, independent of production order.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(Finding::stable_cmp);
}
