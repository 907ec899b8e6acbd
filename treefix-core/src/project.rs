//! Project driver: one batch per document, in parallel, folded into a `ProjectReport`.

use crate::cancel::CancellationToken;
use crate::orchestrator::BatchOrchestrator;
use crate::ports::{DocumentSource, WritePort};
use crate::settings::FixSettings;
use anyhow::{Context, anyhow};
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info};
use treefix_domain::{FrontEnd, RuleRegistry};
use treefix_edit::render_patch;
use treefix_types::outcome::IssueKind;
use treefix_types::report::{
    DocumentReport, ProjectReport, ReportMode, ReportRunInfo, ReportToolInfo, ReportTotals,
};
use treefix_types::scope::FixScope;
use treefix_types::schema;

/// Error type for run verdicts. Exit code 2 = findings remain, 3 = internal consistency
/// failure, 1 = tool error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("findings remain")]
    FindingsRemain,
    #[error("internal consistency failure in {0} document(s)")]
    Consistency(u64),
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::FindingsRemain => 2,
            ToolError::Consistency(_) => 3,
            ToolError::Internal(_) => 1,
        }
    }
}

/// Outcome of `fix_project`.
#[derive(Debug, Clone)]
pub struct ProjectOutcome {
    pub report: ProjectReport,
    /// Unified diff of every changed document, in document order.
    pub patch: String,
}

/// Analyze every document without fixing anything.
pub fn check_project(
    source: &dyn DocumentSource,
    registry: &RuleRegistry,
    front_end: &dyn FrontEnd,
    settings: &FixSettings,
) -> anyhow::Result<ProjectReport> {
    let started = Utc::now();
    let documents = load_documents(source)?;
    let orchestrator = BatchOrchestrator::new(registry, front_end, settings);

    let reports: Vec<DocumentReport> = documents
        .par_iter()
        .map(|(path, text)| {
            let text = match text {
                Ok(text) => text,
                Err(err) => return DocumentReport::failed(path.clone(), format!("{err:#}")),
            };
            let tree = match front_end.parse(text) {
                Ok(tree) => tree,
                Err(err) => return DocumentReport::failed(path.clone(), err.to_string()),
            };
            let collection = orchestrator.check(&tree);
            DocumentReport {
                findings: collection.findings,
                issues: collection.issues,
                ..DocumentReport::new(path.clone())
            }
        })
        .collect();

    Ok(build_report(ReportMode::Check, started, reports))
}

/// Fix every document with `scope`; write changed documents through `writer` when given.
///
/// Documents are fixed in parallel and written sequentially, in document order. An aborted
/// document keeps its original text.
pub fn fix_project(
    source: &dyn DocumentSource,
    writer: Option<&dyn WritePort>,
    registry: &RuleRegistry,
    front_end: &dyn FrontEnd,
    settings: &FixSettings,
    scope: &FixScope,
    cancel: &CancellationToken,
) -> anyhow::Result<ProjectOutcome> {
    let started = Utc::now();
    let documents = load_documents(source)?;
    let orchestrator = BatchOrchestrator::new(registry, front_end, settings);

    let results: Vec<(DocumentReport, Option<String>)> = documents
        .par_iter()
        .map(|(path, text)| {
            let text = match text {
                Ok(text) => text,
                Err(err) => {
                    return (DocumentReport::failed(path.clone(), format!("{err:#}")), None);
                }
            };
            let tree = match front_end.parse(text) {
                Ok(tree) => tree,
                Err(err) => return (DocumentReport::failed(path.clone(), err.to_string()), None),
            };

            let outcome = orchestrator.apply_fix(&tree, scope, cancel);
            let new_text = outcome.new_text();
            let mut summary = outcome.summary;
            let issues = std::mem::take(&mut summary.issues);
            let changed = new_text != *text;
            let report = DocumentReport {
                findings: outcome.findings,
                fix: Some(summary),
                iterations: outcome.iterations,
                issues,
                changed,
                ..DocumentReport::new(path.clone())
            };
            (report, changed.then_some(new_text))
        })
        .collect();

    let mut patch = String::new();
    let mut reports = Vec::with_capacity(results.len());
    for ((report, new_text), (_, before)) in results.into_iter().zip(&documents) {
        if let (Some(after), Ok(before)) = (&new_text, before) {
            patch.push_str(&render_patch(report.path.as_str(), before, after));
            if let Some(writer) = writer {
                writer
                    .write_file(&report.path, after.as_bytes())
                    .with_context(|| format!("write fixed {}", report.path))?;
                info!(path = %report.path, "wrote fixed document");
            }
        }
        reports.push(report);
    }

    Ok(ProjectOutcome {
        report: build_report(ReportMode::Fix, started, reports),
        patch,
    })
}

/// Map a finished run to its exit verdict.
pub fn verdict(report: &ProjectReport) -> Result<(), ToolError> {
    let corrupted = report
        .documents
        .iter()
        .filter(|d| d.issues.iter().any(|i| i.kind == IssueKind::TreeCorruption))
        .count() as u64;
    if corrupted > 0 {
        return Err(ToolError::Consistency(corrupted));
    }

    let totals = &report.totals;
    if totals.failed > 0 {
        return Err(ToolError::Internal(anyhow!(
            "{} document(s) could not be loaded or parsed",
            totals.failed
        )));
    }

    let remaining = match report.mode {
        ReportMode::Check => report.has_findings(),
        ReportMode::Fix => totals.incomplete > 0 || totals.skipped > 0,
    };
    if remaining {
        return Err(ToolError::FindingsRemain);
    }
    Ok(())
}

type LoadedDocument = (Utf8PathBuf, anyhow::Result<String>);

fn load_documents(source: &dyn DocumentSource) -> anyhow::Result<Vec<LoadedDocument>> {
    let paths = source.list_documents().context("list documents")?;
    debug!(documents = paths.len(), "loading documents");
    Ok(paths
        .into_iter()
        .map(|path| {
            let text = source.read_document(&path);
            (path, text)
        })
        .collect())
}

fn build_report(
    mode: ReportMode,
    started: DateTime<Utc>,
    documents: Vec<DocumentReport>,
) -> ProjectReport {
    let ended = Utc::now();
    let duration_ms = (ended - started).num_milliseconds().max(0) as u64;
    let mut report = ProjectReport {
        schema: schema::TREEFIX_REPORT_V1.to_string(),
        tool: ReportToolInfo {
            name: "treefix".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        run: ReportRunInfo {
            started_at: started.to_rfc3339(),
            ended_at: Some(ended.to_rfc3339()),
            duration_ms: Some(duration_ms),
        },
        mode,
        documents,
        totals: ReportTotals::default(),
    };
    report.recompute_totals();
    report
}
