//! Property-based tests for the edit planner.
//!
//! These tests verify that:
//! - Accepted edits never overlap or nest
//! - Every candidate ends up either accepted or rejected
//! - The plan is identical regardless of input order or calling thread

use proptest::prelude::*;
use treefix_domain::plan;
use treefix_types::edit::{CandidateEdit, ReplacementNode};
use treefix_types::finding::{Finding, Severity};
use treefix_types::span::Span;
use treefix_types::tree::{NodeKind, SyntaxNode, SyntaxTree, TreeVersion};

fn tree() -> SyntaxTree {
    SyntaxTree::new("x".repeat(64), SyntaxNode::leaf(NodeKind::Root, Span::new(0, 64)))
}

fn arb_candidate() -> impl Strategy<Value = CandidateEdit> {
    (
        0usize..40,
        0usize..12,
        prop::sample::select(vec!["alpha", "beta", "gamma"]),
        prop::option::of(prop::sample::select(vec!["x", "y", "(z)"])),
        0u64..3,
    )
        .prop_map(|(start, len, rule, text, version)| {
            let finding = Finding::new(rule, Span::new(start, len), Severity::Warning);
            let replacement = match text {
                Some(t) => ReplacementNode::node(NodeKind::Ident, t),
                None => ReplacementNode::Remove,
            };
            // Mostly current-version candidates, with some stale ones mixed in.
            let version = if version == 2 { TreeVersion(7) } else { TreeVersion(0) };
            CandidateEdit::new(&finding, Span::new(start, len), replacement, version)
        })
}

fn arb_candidates() -> impl Strategy<Value = Vec<CandidateEdit>> {
    prop::collection::vec(arb_candidate(), 0..24)
}

proptest! {
    /// Accepted spans are ordered and pairwise disjoint.
    #[test]
    fn accepted_edits_never_overlap(cands in arb_candidates()) {
        let plan = plan(&tree(), cands);
        let spans: Vec<Span> = plan.spans().collect();
        for pair in spans.windows(2) {
            prop_assert!(pair[0].end() <= pair[1].start, "{} then {}", pair[0], pair[1]);
            prop_assert!(!pair[0].overlaps(pair[1]));
        }
    }

    /// Nothing is silently dropped.
    #[test]
    fn every_candidate_is_accounted_for(cands in arb_candidates()) {
        let total = cands.len();
        let plan = plan(&tree(), cands);
        prop_assert_eq!(plan.edits.len() + plan.rejected.len(), total);
        prop_assert!(plan.edits.iter().all(|e| e.edit.tree_version == TreeVersion(0)));
    }

    /// Shuffling the input yields a byte-identical plan.
    #[test]
    fn plan_is_independent_of_input_order(
        (cands, shuffled) in arb_candidates().prop_flat_map(|c| {
            let s = Just(c.clone()).prop_shuffle();
            (Just(c), s)
        })
    ) {
        let t = tree();
        let a = serde_json::to_string(&plan(&t, cands)).unwrap();
        let b = serde_json::to_string(&plan(&t, shuffled)).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Planning concurrently on several threads agrees with planning once.
    #[test]
    fn plan_is_identical_across_threads(cands in arb_candidates()) {
        let t = tree();
        let expected = plan(&t, cands.clone());
        let plans: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let mut input = cands.clone();
                    let mid = if input.is_empty() { 0 } else { i % input.len() };
                    input.rotate_left(mid);
                    let t = &t;
                    scope.spawn(move || plan(t, input))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for p in plans {
            prop_assert_eq!(&p, &expected);
        }
    }
}
