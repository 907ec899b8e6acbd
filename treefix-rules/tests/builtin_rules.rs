use pretty_assertions::assert_eq;
use treefix_domain::{
    FrontEnd, Rule, RuleContext, RuleRegistry, RuleSelection, build_candidates, collect_findings,
    plan,
};
use treefix_minilang::MiniLang;
use treefix_rules::{
    DoubleNegation, RedundantElse, RedundantParens, SnakeCaseNames, UnusedVariable,
    builtin_registry,
};
use treefix_types::finding::{Finding, Severity};
use treefix_types::tree::NodeKind;

fn registry_of(rule: Box<dyn Rule>) -> RuleRegistry {
    RuleRegistry::with_rules(vec![rule]).expect("registry")
}

fn findings(registry: &RuleRegistry, src: &str) -> Vec<Finding> {
    let tree = MiniLang.parse(src).expect("parse");
    let symbols = MiniLang.resolve(&tree);
    let collection = collect_findings(registry, &tree, &symbols, &RuleSelection::all());
    assert!(collection.issues.is_empty(), "{:?}", collection.issues);
    collection.findings
}

/// One Collect → Plan → Apply pass; returns the new text.
fn fix_once(registry: &RuleRegistry, src: &str) -> String {
    let tree = MiniLang.parse(src).expect("parse");
    let symbols = MiniLang.resolve(&tree);
    let collection = collect_findings(registry, &tree, &symbols, &RuleSelection::all());
    let cx = RuleContext::new(&tree, &symbols);
    let candidates = build_candidates(registry, &collection.findings, &cx);
    assert!(candidates.issues.is_empty(), "{:?}", candidates.issues);
    let plan = plan(&tree, candidates.edits);
    let applied = treefix_edit::apply_plan(&MiniLang, &tree, &plan).expect("apply");
    applied.tree.serialize()
}

#[test]
fn builtin_catalog_lists_every_rule_once() {
    let registry = builtin_registry().expect("registry");
    let infos = registry.infos();
    let ids: Vec<&str> = infos.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "double_negation",
            "redundant_else",
            "redundant_parens",
            "snake_case_names",
            "unused_variable"
        ]
    );
    let report_only: Vec<&str> = infos
        .iter()
        .filter(|i| !i.fixable)
        .map(|i| i.id.as_str())
        .collect();
    assert_eq!(report_only, vec!["snake_case_names"]);
}

#[test]
fn redundant_else_negates_condition_of_empty_then() {
    let registry = registry_of(Box::new(RedundantElse));
    let src = "if (x) { } else { y(); }\n";
    assert_eq!(fix_once(&registry, src), "if (!x) { y(); }\n");
    assert_eq!(fix_once(&registry, "if (a == b) { } else { y(); }\n"), "if (!(a == b)) { y(); }\n");
    assert!(findings(&registry, "if (!x) { y(); }\n").is_empty());
}

#[test]
fn redundant_else_fixes_a_document_that_is_one_if_statement() {
    // No surrounding trivia: the root and the `if` share a span.
    let src = "if (x) { } else { y(); }";
    let registry = builtin_registry().expect("registry");
    assert_eq!(fix_once(&registry, src), "if (!x) { y(); }");
    assert_eq!(
        fix_once(&registry_of(Box::new(RedundantElse)), src),
        "if (!x) { y(); }"
    );
}

#[test]
fn redundant_else_keeps_else_whose_binding_is_read_after_the_if() {
    let registry = registry_of(Box::new(RedundantElse));
    let src = "fn f(c) { let y = 1; if (c) { return 0; } else { let y = 2; g(y); } return y; }";
    assert_eq!(findings(&registry, src).len(), 1);
    assert_eq!(fix_once(&registry, src), src);

    let unrelated = "fn f(c) { if (c) { return 0; } else { let z = 2; g(z); } return 1; }";
    assert_eq!(
        fix_once(&registry, unrelated),
        "fn f(c) { if (c) { return 0; }\nlet z = 2; g(z); return 1; }"
    );
}

#[test]
fn redundant_else_unwraps_after_early_return() {
    let registry = registry_of(Box::new(RedundantElse));
    let src = "\
fn f(x) {
    if (x) {
        return 1;
    } else {
        g();
        // keep me
        h();
    }
}
";
    let expected = "\
fn f(x) {
    if (x) {
        return 1;
    }
    g();
    // keep me
    h();
}
";
    assert_eq!(fix_once(&registry, src), expected);
    assert!(findings(&registry, expected).is_empty());
}

#[test]
fn double_negation_is_removed_and_triple_converges() {
    let registry = registry_of(Box::new(DoubleNegation));
    assert_eq!(fix_once(&registry, "f(!!x);"), "f(x);");

    let once = fix_once(&registry, "f(!!!x);");
    assert_eq!(once, "f(!x);");
    assert!(findings(&registry, &once).is_empty());
}

#[test]
fn double_negation_after_keyword_keeps_the_return() {
    let registry = registry_of(Box::new(DoubleNegation));
    let fixed = fix_once(&registry, "fn f(x) { return!!x; }");
    assert_eq!(fixed, "fn f(x) { return x; }");

    let tree = MiniLang.parse(&fixed).expect("parse");
    assert!(tree.nodes().any(|n| n.kind == NodeKind::ReturnStmt));
}

#[test]
fn redundant_parens_keeps_tokens_apart() {
    let registry = registry_of(Box::new(RedundantParens));
    assert_eq!(fix_once(&registry, "f((a), (1 + 2));"), "f(a, (1 + 2));");
    assert_eq!(
        fix_once(&registry, "fn g(x) { return(x); }"),
        "fn g(x) { return x; }"
    );
    // The outer pair wins this pass; the inner one goes next pass.
    assert_eq!(fix_once(&registry, "f(((a)));"), "f((a));");
}

#[test]
fn unused_variable_removes_pure_lets_only() {
    let registry = registry_of(Box::new(UnusedVariable));
    let src = "let a = 1;\nlet b = g();\nlet _c = 2;\nprint(0);\n";

    let found = findings(&registry, src);
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].context_str("name"), Some("a"));
    assert_eq!(found[1].context_str("name"), Some("b"));

    assert_eq!(fix_once(&registry, src), "let b = g();\nlet _c = 2;\nprint(0);\n");
}

#[test]
fn snake_case_names_reports_without_fixing() {
    let registry = registry_of(Box::new(SnakeCaseNames));
    let src = "fn doThing(badParam) { return badParam; }";
    let found = findings(&registry, src);
    let names: Vec<(&str, Severity)> = found
        .iter()
        .map(|f| (f.context_str("suggestion").unwrap_or(""), f.severity))
        .collect();
    assert_eq!(
        names,
        vec![("do_thing", Severity::Info), ("bad_param", Severity::Info)]
    );
    assert_eq!(fix_once(&registry, src), src);
}
