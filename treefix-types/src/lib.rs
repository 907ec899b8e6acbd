//! Shared DTOs for the treefix workspace.
//!
//! # Design constraints
//! - Trees and symbol tables are immutable once built; edits always produce a new tree.
//! - Findings, plans and summaries are serializable so hosts can persist or diff them.
//! - Ordering-sensitive types expose explicit sort keys instead of relying on input order.

pub mod edit;
pub mod finding;
pub mod outcome;
pub mod plan;
pub mod report;
pub mod scope;
pub mod span;
pub mod symbols;
pub mod tree;

/// Schema identifiers.
pub mod schema {
    pub const TREEFIX_REPORT_V1: &str = "treefix.report.v1";
}
