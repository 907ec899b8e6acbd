//! Error types for treefix-domain.
//!
//! None of these abort a batch: rule and strategy failures are isolated to one rule or one
//! finding and surface as issues.

use thiserror::Error;
use treefix_types::span::Span;
use treefix_types::tree::TreeVersion;

/// A rule predicate could not produce its findings for one target.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("{0}")]
    Failed(String),

    #[error("panicked: {0}")]
    Panicked(String),
}

impl RuleError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// A fix strategy could not produce a usable edit for one finding.
#[derive(Debug, Error)]
pub enum FixStrategyError {
    #[error("{0}")]
    Failed(String),

    #[error("edit target {target} is outside finding {finding}")]
    NotLocal { target: Span, finding: Span },

    #[error("edit target {0} does not match any node")]
    SpanMismatch(Span),

    #[error("edit built for tree {found}, current tree is {expected}")]
    StaleTree {
        expected: TreeVersion,
        found: TreeVersion,
    },

    #[error("panicked: {0}")]
    Panicked(String),
}

impl FixStrategyError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("rule `{0}` is already registered")]
    DuplicateRule(String),

    #[error("invalid rule id `{0}`: expected lowercase ascii, digits and `_`")]
    InvalidId(String),
}

/// Render a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
