//! Per-document fix batches: Collecting → Planning → Applying → Verifying, until a pass
//! plans nothing.

use crate::cancel::CancellationToken;
use crate::settings::FixSettings;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, error, warn};
use treefix_domain::{
    Collection, FrontEnd, RuleContext, RuleRegistry, build_candidates, collect_findings, plan,
};
use treefix_edit::{AppliedEdit, apply_plan};
use treefix_types::finding::Finding;
use treefix_types::outcome::{FixStatus, FixSummary, Issue, IterationReport};
use treefix_types::scope::FixScope;
use treefix_types::symbols::SymbolContext;
use treefix_types::tree::SyntaxTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Collecting,
    Planning,
    Applying,
    Verifying,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Collecting => "collecting",
            Phase::Planning => "planning",
            Phase::Applying => "applying",
            Phase::Verifying => "verifying",
        };
        f.write_str(s)
    }
}

/// Result of one fix batch.
#[derive(Debug, Clone)]
pub struct FixOutcome {
    /// The returned tree: the last committed one, or the input on abort.
    pub tree: SyntaxTree,
    pub summary: FixSummary,
    /// One entry per Planning pass, including the final one that planned nothing.
    pub iterations: Vec<IterationReport>,
    /// Findings of the returned tree as of its last Collecting. Empty if the batch was
    /// cancelled before the returned tree was analyzed; `summary.skipped` is then 0 too.
    pub findings: Vec<Finding>,
}

impl FixOutcome {
    pub fn new_text(&self) -> String {
        self.tree.serialize()
    }

    pub fn status(&self) -> FixStatus {
        self.summary.status
    }
}

/// Drives fix batches for one registry, front end and settings.
///
/// Holds only shared references, so one orchestrator can serve many documents
/// concurrently; each call owns its own tree version and findings.
#[derive(Clone, Copy)]
pub struct BatchOrchestrator<'a> {
    registry: &'a RuleRegistry,
    front_end: &'a dyn FrontEnd,
    settings: &'a FixSettings,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(
        registry: &'a RuleRegistry,
        front_end: &'a dyn FrontEnd,
        settings: &'a FixSettings,
    ) -> Self {
        Self {
            registry,
            front_end,
            settings,
        }
    }

    /// Findings of `tree` for the enabled rules, without fixing anything.
    pub fn check(&self, tree: &SyntaxTree) -> Collection {
        let symbols = self.front_end.resolve(tree);
        self.collect(tree, &symbols)
    }

    /// Fix the findings selected by `scope` until a pass plans nothing, the iteration bound
    /// is reached, a tree repeats, or `cancel` fires.
    ///
    /// The input tree is never modified. On `Aborted` the returned tree is the input.
    pub fn apply_fix(
        &self,
        tree: &SyntaxTree,
        scope: &FixScope,
        cancel: &CancellationToken,
    ) -> FixOutcome {
        let mut summary = FixSummary::new(FixStatus::Done);
        let mut reports: Vec<IterationReport> = Vec::new();

        if !enter(Phase::Collecting, 0, cancel) {
            return self.finish(tree.clone(), vec![], FixStatus::Cancelled, summary, reports, scope);
        }
        let mut current = tree.clone();
        let mut symbols = self.front_end.resolve(&current);
        let collection = self.collect(&current, &symbols);
        summary.issues.extend(collection.issues);
        let initial = collection.findings;
        let mut findings = initial.clone();
        let mut seen: HashSet<String> = HashSet::from([current.fingerprint().to_string()]);

        let status = loop {
            let iteration = reports.len() as u32 + 1;
            if !enter(Phase::Planning, iteration, cancel) {
                break FixStatus::Cancelled;
            }

            let in_scope: Vec<Finding> = findings
                .iter()
                .filter(|f| scope.includes(f))
                .cloned()
                .collect();
            let cx = RuleContext::new(&current, &symbols);
            let candidates = build_candidates(self.registry, &in_scope, &cx);
            summary.issues.extend(candidates.issues);
            let candidate_count = candidates.edits.len() as u64;
            let edit_plan = plan(&current, candidates.edits);

            let mut report = IterationReport {
                iteration,
                tree_version: current.version(),
                findings: in_scope.len() as u64,
                fixable: candidates.fixable,
                candidates: candidate_count,
                no_fix: candidates.no_fix,
                accepted: edit_plan.edits.len() as u64,
                rejected: edit_plan.rejected.len() as u64,
                persisted: 0,
            };

            if edit_plan.is_empty() {
                reports.push(report);
                break FixStatus::Done;
            }
            if iteration > self.settings.max_iterations {
                warn!(
                    max_iterations = self.settings.max_iterations,
                    pending = edit_plan.edits.len(),
                    "iteration bound reached with edits pending"
                );
                reports.push(report);
                break FixStatus::Incomplete;
            }

            if !enter(Phase::Applying, iteration, cancel) {
                reports.push(report);
                break FixStatus::Cancelled;
            }
            let applied = match apply_plan(self.front_end, &current, &edit_plan) {
                Ok(applied) => applied,
                Err(err) => {
                    error!(
                        version = %current.version(),
                        error = %err,
                        "applied plan failed verification; batch aborted"
                    );
                    summary.issues.push(Issue::tree_corruption(err.to_string()));
                    reports.push(report);
                    summary.applied = 0;
                    return self.finish(
                        tree.clone(),
                        initial,
                        FixStatus::Aborted,
                        summary,
                        reports,
                        scope,
                    );
                }
            };
            summary.applied += applied.edits.len() as u64;
            current = applied.tree;
            findings = Vec::new();

            if !enter(Phase::Verifying, iteration, cancel) {
                reports.push(report);
                break FixStatus::Cancelled;
            }
            symbols = self.front_end.resolve(&current);
            let verified = self.collect(&current, &symbols);
            summary.issues.extend(verified.issues);
            report.persisted = count_persisted(&applied.edits, &verified.findings);
            reports.push(report);
            findings = verified.findings;

            if scope.is_single() {
                break FixStatus::Done;
            }
            if !seen.insert(current.fingerprint().to_string()) {
                warn!(
                    version = %current.version(),
                    "tree repeated an earlier state; stopping"
                );
                break FixStatus::Incomplete;
            }
        };

        self.finish(current, findings, status, summary, reports, scope)
    }

    fn collect(&self, tree: &SyntaxTree, symbols: &SymbolContext) -> Collection {
        collect_findings(self.registry, tree, symbols, &self.settings.selection)
    }

    fn is_fixable(&self, finding: &Finding) -> bool {
        self.registry
            .get(&finding.rule_id)
            .is_some_and(|rule| rule.fix_strategy().is_some())
    }

    fn finish(
        &self,
        tree: SyntaxTree,
        findings: Vec<Finding>,
        status: FixStatus,
        mut summary: FixSummary,
        iterations: Vec<IterationReport>,
        scope: &FixScope,
    ) -> FixOutcome {
        summary.status = status;
        summary.iterations = iterations.len() as u32;
        summary.skipped = findings
            .iter()
            .filter(|f| scope.includes(f) && self.is_fixable(f))
            .count() as u64;
        debug!(
            status = %status,
            applied = summary.applied,
            skipped = summary.skipped,
            iterations = summary.iterations,
            version = %tree.version(),
            "fix batch finished"
        );
        FixOutcome {
            tree,
            summary,
            iterations,
            findings,
        }
    }
}

fn enter(phase: Phase, iteration: u32, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        debug!(%phase, iteration, "cancelled");
        return false;
    }
    debug!(%phase, iteration, "enter");
    true
}

/// Applied edits whose own rule flags the replacement at exactly its new span.
fn count_persisted(edits: &[AppliedEdit], findings: &[Finding]) -> u64 {
    let mut persisted = 0;
    for edit in edits {
        let back = findings
            .iter()
            .any(|f| f.rule_id == edit.rule_id && f.span == edit.new_span);
        if back {
            warn!(
                rule = %edit.rule_id,
                span = %edit.new_span,
                "finding persisted after its fix"
            );
            persisted += 1;
        }
    }
    persisted
}
