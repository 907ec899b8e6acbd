use crate::finding::{Finding, Severity};
use crate::outcome::{FixStatus, FixSummary, Issue, IterationReport};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Project-wide report, schema `treefix.report.v1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectReport {
    pub schema: String,
    pub tool: ReportToolInfo,
    pub run: ReportRunInfo,
    pub mode: ReportMode,

    #[serde(default)]
    pub documents: Vec<DocumentReport>,

    pub totals: ReportTotals,
}

impl ProjectReport {
    pub fn recompute_totals(&mut self) {
        let mut totals = ReportTotals {
            documents: self.documents.len() as u64,
            ..ReportTotals::default()
        };
        for doc in &self.documents {
            for f in &doc.findings {
                match f.severity {
                    Severity::Error => totals.error += 1,
                    Severity::Warning => totals.warn += 1,
                    Severity::Info => totals.info += 1,
                }
            }
            if let Some(fix) = &doc.fix {
                totals.applied += fix.applied;
                totals.skipped += fix.skipped;
                if fix.status != FixStatus::Done {
                    totals.incomplete += 1;
                }
            }
            totals.issues += doc.issues.len() as u64;
            if doc.error.is_some() {
                totals.failed += 1;
            }
        }
        self.totals = totals;
    }

    pub fn has_findings(&self) -> bool {
        self.documents.iter().any(|d| !d.findings.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRunInfo {
    pub started_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    Check,
    Fix,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub path: Utf8PathBuf,

    /// Findings on the returned text (after fixing, in fix mode).
    #[serde(default)]
    pub findings: Vec<Finding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<FixSummary>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub iterations: Vec<IterationReport>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Issue>,

    /// Whether the document text changed.
    #[serde(default)]
    pub changed: bool,

    /// Load or parse failure; the document was not analyzed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentReport {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            findings: vec![],
            fix: None,
            iterations: vec![],
            issues: vec![],
            changed: false,
            error: None,
        }
    }

    pub fn failed(path: impl Into<Utf8PathBuf>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(path)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTotals {
    pub documents: u64,
    pub failed: u64,
    pub info: u64,
    pub warn: u64,
    pub error: u64,
    pub applied: u64,
    pub skipped: u64,
    pub incomplete: u64,
    pub issues: u64,
}
