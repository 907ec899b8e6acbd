//! Error types for treefix-edit.
//!
//! Every variant is an internal consistency failure: the orchestrator aborts the batch and
//! hands back the unmodified input. None of them is a user-facing finding.

use thiserror::Error;
use treefix_domain::ParseError;
use treefix_types::span::Span;
use treefix_types::tree::TreeVersion;

#[derive(Debug, Error)]
pub enum ApplyError {
    /// The plan was built against another tree (version or content differs).
    #[error("stale plan: built for {plan_version} ({plan_fingerprint:.12}), tree is {tree_version} ({tree_fingerprint:.12})")]
    StalePlan {
        plan_version: TreeVersion,
        plan_fingerprint: String,
        tree_version: TreeVersion,
        tree_fingerprint: String,
    },

    /// An accepted edit no longer lines up with a node, or collides with another edit.
    #[error("edit {id} target {span} does not match the tree")]
    SpanMismatch { id: String, span: Span },

    /// The spliced text failed to re-parse.
    #[error("tree corruption: {0}")]
    TreeCorruption(#[from] ParseError),
}

/// Result type alias using ApplyError.
pub type ApplyResult<T> = Result<T, ApplyError>;

#[cfg(test)]
mod tests {
    use super::ApplyError;
    use treefix_domain::ParseError;

    #[test]
    fn parse_errors_convert_to_tree_corruption() {
        let err = ApplyError::from(ParseError::new("expected `;`", 7));
        assert!(matches!(err, ApplyError::TreeCorruption(_)));
        assert_eq!(
            err.to_string(),
            "tree corruption: parse error at byte 7: expected `;`"
        );
    }

    #[test]
    fn stale_plan_message_truncates_fingerprints() {
        let err = ApplyError::StalePlan {
            plan_version: treefix_types::tree::TreeVersion(1),
            plan_fingerprint: "a".repeat(64),
            tree_version: treefix_types::tree::TreeVersion(2),
            tree_fingerprint: "b".repeat(64),
        };
        let msg = err.to_string();
        assert!(msg.contains("v1 (aaaaaaaaaaaa)"), "{msg}");
        assert!(msg.contains("v2 (bbbbbbbbbbbb)"), "{msg}");
    }
}
