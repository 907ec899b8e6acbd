use crate::error::{RuleError, panic_message};
use crate::registry::RuleRegistry;
use crate::rules::{RuleContext, Target};
use crate::selection::RuleSelection;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use treefix_types::finding::{Finding, Severity, sort_findings};
use treefix_types::outcome::Issue;
use treefix_types::symbols::SymbolContext;
use treefix_types::tree::SyntaxTree;

/// Sorted findings for one tree version, plus the rules that failed to evaluate.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub findings: Vec<Finding>,
    pub issues: Vec<Issue>,
}

/// Run every enabled rule over `tree` and `symbols`.
///
/// Dispatch units (one per node or symbol with subscribers) are evaluated in parallel. A rule
/// that fails or panics on any unit loses all its findings for this pass; the other rules are
/// unaffected. The result order is independent of scheduling.
pub fn collect_findings(
    registry: &RuleRegistry,
    tree: &SyntaxTree,
    symbols: &SymbolContext,
    selection: &RuleSelection,
) -> Collection {
    let severities: Vec<Option<Severity>> = registry
        .rules()
        .map(|r| {
            selection
                .is_enabled(r.id())
                .then(|| selection.severity_for(r.id(), r.default_severity()))
        })
        .collect();

    let mut units: Vec<Target<'_>> = tree
        .nodes()
        .filter(|n| !registry.for_node(n.kind).is_empty())
        .map(Target::Node)
        .collect();
    units.extend(
        symbols
            .symbols()
            .iter()
            .filter(|s| !registry.for_symbol(s.kind).is_empty())
            .map(Target::Symbol),
    );

    let severities = &severities;
    let results: Vec<(usize, Result<Vec<Finding>, RuleError>)> = units
        .par_iter()
        .flat_map_iter(|unit| {
            let subscribers = match unit {
                Target::Node(n) => registry.for_node(n.kind),
                Target::Symbol(s) => registry.for_symbol(s.kind),
            };
            subscribers.iter().filter_map(move |&idx| {
                let severity = severities[idx]?;
                let rule = registry.rule(idx)?;
                let cx = RuleContext::new(tree, symbols).with_severity(severity);
                let outcome = catch_unwind(AssertUnwindSafe(|| rule.evaluate(*unit, &cx)))
                    .unwrap_or_else(|payload| Err(RuleError::Panicked(panic_message(&*payload))));
                Some((idx, outcome))
            })
        })
        .collect();

    let mut failed: BTreeMap<usize, RuleError> = BTreeMap::new();
    let mut findings = Vec::new();
    for (idx, outcome) in results {
        match outcome {
            Ok(found) => findings.extend(found.into_iter().map(|f| (idx, f))),
            Err(err) => {
                failed.entry(idx).or_insert(err);
            }
        }
    }

    let mut findings: Vec<Finding> = findings
        .into_iter()
        .filter(|(idx, _)| !failed.contains_key(idx))
        .map(|(_, f)| f)
        .collect();
    sort_findings(&mut findings);
    findings.dedup();

    let issues = failed
        .into_iter()
        .filter_map(|(idx, err)| {
            let rule = registry.rule(idx)?;
            tracing::warn!(rule = rule.id(), error = %err, "rule evaluation failed; findings dropped");
            Some(Issue::rule_evaluation(rule.id(), err.to_string()))
        })
        .collect();

    tracing::debug!(
        version = %tree.version(),
        findings = findings.len(),
        "collected findings"
    );
    Collection { findings, issues }
}

/// Lazy view over the findings of one tree version.
///
/// Nothing runs until the first item is pulled; calling [`analyze`] again starts over.
pub struct Analysis<'a> {
    registry: &'a RuleRegistry,
    tree: &'a SyntaxTree,
    symbols: &'a SymbolContext,
    selection: &'a RuleSelection,
    pending: Option<std::vec::IntoIter<Finding>>,
    issues: Vec<Issue>,
}

pub fn analyze<'a>(
    registry: &'a RuleRegistry,
    tree: &'a SyntaxTree,
    symbols: &'a SymbolContext,
    selection: &'a RuleSelection,
) -> Analysis<'a> {
    Analysis {
        registry,
        tree,
        symbols,
        selection,
        pending: None,
        issues: Vec::new(),
    }
}

impl Analysis<'_> {
    /// True once the rules have actually run.
    pub fn is_started(&self) -> bool {
        self.pending.is_some()
    }

    /// Rule failures seen so far. Empty until the first pull.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    fn start(&mut self) -> &mut std::vec::IntoIter<Finding> {
        self.pending.get_or_insert_with(|| {
            let collection =
                collect_findings(self.registry, self.tree, self.symbols, self.selection);
            self.issues = collection.issues;
            collection.findings.into_iter()
        })
    }
}

impl Iterator for Analysis<'_> {
    type Item = Finding;

    fn next(&mut self) -> Option<Finding> {
        self.start().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Rule, Subscription};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use treefix_types::span::Span;
    use treefix_types::symbols::{Symbol, SymbolKind};
    use treefix_types::tree::{NodeKind, SyntaxNode};

    // "a; b;" as Root > [ExprStmt > Ident, ExprStmt > Ident]
    fn tree() -> SyntaxTree {
        let a = SyntaxNode::leaf(NodeKind::Ident, Span::new(0, 1));
        let b = SyntaxNode::leaf(NodeKind::Ident, Span::new(3, 1));
        let s1 = SyntaxNode::new(NodeKind::ExprStmt, Span::new(0, 2), vec![a]);
        let s2 = SyntaxNode::new(NodeKind::ExprStmt, Span::new(3, 2), vec![b]);
        SyntaxTree::new("a; b;", SyntaxNode::new(NodeKind::Root, Span::new(0, 5), vec![s1, s2]))
    }

    struct FlagIdents;

    impl Rule for FlagIdents {
        fn id(&self) -> &str {
            "flag_idents"
        }

        fn description(&self) -> &str {
            "flags every identifier"
        }

        fn subscriptions(&self) -> &[Subscription] {
            &[Subscription::Node(NodeKind::Ident)]
        }

        fn evaluate(&self, target: Target<'_>, cx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
            let Target::Node(node) = target else {
                return Ok(vec![]);
            };
            Ok(vec![cx.finding(self.id(), node.span).with_message(cx.text(node))])
        }
    }

    struct FailsOnB;

    impl Rule for FailsOnB {
        fn id(&self) -> &str {
            "fails_on_b"
        }

        fn description(&self) -> &str {
            "fails on `b`"
        }

        fn subscriptions(&self) -> &[Subscription] {
            &[Subscription::Node(NodeKind::Ident)]
        }

        fn evaluate(&self, target: Target<'_>, cx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
            let Target::Node(node) = target else {
                return Ok(vec![]);
            };
            if cx.text(node) == "b" {
                panic!("cannot handle b");
            }
            Ok(vec![cx.finding(self.id(), node.span)])
        }
    }

    struct CountSymbols(Arc<AtomicUsize>);

    impl Rule for CountSymbols {
        fn id(&self) -> &str {
            "count_symbols"
        }

        fn description(&self) -> &str {
            "counts calls"
        }

        fn subscriptions(&self) -> &[Subscription] {
            &[Subscription::Symbol(SymbolKind::Variable)]
        }

        fn evaluate(&self, target: Target<'_>, cx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            let Target::Symbol(sym) = target else {
                return Err(RuleError::failed("expected a symbol"));
            };
            Ok(vec![cx.finding(self.id(), sym.decl)])
        }
    }

    #[test]
    fn findings_are_sorted_and_failing_rule_is_isolated() {
        let registry =
            RuleRegistry::with_rules(vec![Box::new(FailsOnB), Box::new(FlagIdents)]).expect("registry");
        let tree = tree();
        let collection =
            collect_findings(&registry, &tree, &SymbolContext::default(), &RuleSelection::all());

        let got: Vec<(&str, usize)> = collection
            .findings
            .iter()
            .map(|f| (f.rule_id.as_str(), f.span.start))
            .collect();
        assert_eq!(got, vec![("flag_idents", 0), ("flag_idents", 3)]);
        assert_eq!(collection.issues.len(), 1);
        assert_eq!(collection.issues[0].rule_id.as_deref(), Some("fails_on_b"));
        assert!(collection.issues[0].message.contains("cannot handle b"));
    }

    #[test]
    fn selection_disables_rules_and_overrides_severity() {
        let registry =
            RuleRegistry::with_rules(vec![Box::new(FailsOnB), Box::new(FlagIdents)]).expect("registry");
        let tree = tree();
        let mut selection = RuleSelection::only(["flag_*"]);
        selection
            .severity
            .insert("flag_idents".to_string(), Severity::Error);

        let collection = collect_findings(&registry, &tree, &SymbolContext::default(), &selection);
        assert!(collection.issues.is_empty());
        assert_eq!(collection.findings.len(), 2);
        assert!(collection.findings.iter().all(|f| f.severity == Severity::Error));
    }

    #[test]
    fn analysis_defers_work_until_pulled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = RuleRegistry::with_rules(vec![Box::new(CountSymbols(calls.clone()))])
            .expect("registry");
        let tree = tree();
        let symbols = SymbolContext::new(vec![Symbol {
            name: "a".to_string(),
            kind: SymbolKind::Variable,
            decl: Span::new(0, 1),
            references: vec![],
        }]);
        let selection = RuleSelection::all();

        let mut analysis = analyze(&registry, &tree, &symbols, &selection);
        assert!(!analysis.is_started());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let first = analysis.next().expect("one finding");
        assert!(analysis.is_started());
        assert_eq!(first.span, Span::new(0, 1));
        assert!(analysis.next().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let again: Vec<Finding> = analyze(&registry, &tree, &symbols, &selection).collect();
        assert_eq!(again.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
