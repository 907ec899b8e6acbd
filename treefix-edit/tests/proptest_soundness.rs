//! Applying a plan of well-formed replacements always yields a tree that re-parses.

use proptest::prelude::*;
use treefix_domain::{FrontEnd, plan};
use treefix_minilang::MiniLang;
use treefix_types::edit::{CandidateEdit, ReplacementNode};
use treefix_types::finding::{Finding, Severity};
use treefix_types::tree::NodeKind;

const STATEMENTS: &[&str] = &[
    "let a = 1;",
    "let b = f(a, 2);",
    "f(!!x);",
    "if (x) { } else { y(); }",
    "fn g(p) { return (p); }",
    "    let c = \"s\";",
    "h((1 + 2) * 3);",
    "if (a) {\n    b();\n} else if (c) {\n    d();\n}",
];

fn program() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(STATEMENTS), 1..8)
        .prop_map(|stmts| stmts.join("\n") + "\n")
}

proptest! {
    #[test]
    fn well_formed_edits_always_reparse(
        src in program(),
        picks in prop::collection::vec(any::<bool>(), 64),
        remove in any::<bool>(),
    ) {
        let tree = MiniLang.parse(&src).expect("parse");

        let mut candidates = Vec::new();
        for (i, node) in tree.nodes().enumerate() {
            if !picks[i % picks.len()] {
                continue;
            }
            let replacement = match node.kind {
                NodeKind::Ident
                | NodeKind::Literal
                | NodeKind::ParenExpr
                | NodeKind::CallExpr
                | NodeKind::BinaryExpr
                | NodeKind::UnaryExpr => ReplacementNode::node(NodeKind::Ident, "zz"),
                NodeKind::LetStmt | NodeKind::ExprStmt if remove => ReplacementNode::Remove,
                _ => continue,
            };
            let finding = Finding::new("soundness", node.span, Severity::Warning);
            candidates.push(CandidateEdit::new(&finding, node.span, replacement, tree.version()));
        }

        let plan = plan(&tree, candidates);
        let applied = treefix_edit::apply_plan(&MiniLang, &tree, &plan)
            .map_err(|e| TestCaseError::fail(format!("{e}\n{src}")))?;

        prop_assert_eq!(applied.tree.version(), tree.version().next());
        prop_assert_eq!(applied.edits.len(), plan.edits.len());
        prop_assert!(MiniLang.parse(applied.tree.text()).is_ok());
    }
}
