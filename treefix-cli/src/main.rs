mod config;

use anyhow::{Context, bail};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use config::{CliOverrides, ConfigMerger, MergedConfig};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use treefix_core::adapters::{FsDocumentSource, FsWritePort};
use treefix_core::ports::WritePort;
use treefix_core::{
    CancellationToken, FixScope, ToolError, check_project, fix_project, verdict,
};
use treefix_domain::RuleRegistry;
use treefix_minilang::MiniLang;
use treefix_rules::builtin_registry;
use treefix_types::report::ProjectReport;

#[derive(Debug, Parser)]
#[command(
    name = "treefix",
    version,
    about = "Rule-driven analysis and batched autofix for minilang sources."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report findings without changing anything.
    Check(CheckArgs),
    /// Fix findings (default: dry-run, prints a diff).
    Fix(FixArgs),
    /// List the available rules.
    ListRules(ListRulesArgs),
}

#[derive(Debug, clap::Args)]
struct CommonArgs {
    /// Files or directories to analyze (default: the project root).
    paths: Vec<Utf8PathBuf>,

    /// Project root holding treefix.toml (default: current directory).
    #[arg(long, default_value = ".")]
    root: Utf8PathBuf,

    /// Allowlist patterns for rule ids (extends treefix.toml).
    #[arg(long)]
    allow: Vec<String>,

    /// Denylist patterns for rule ids (extends treefix.toml).
    #[arg(long)]
    deny: Vec<String>,

    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Parser)]
struct CheckArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Parser)]
struct FixArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Only run and fix these rules (exact ids).
    #[arg(long = "rule")]
    rules: Vec<String>,

    /// Write fixed documents back to disk.
    #[arg(long, default_value_t = false)]
    write: bool,

    /// Upper bound on fix passes per document.
    #[arg(long)]
    max_iterations: Option<u32>,
}

#[derive(Debug, Parser)]
struct ListRulesArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.cmd {
        Command::Check(args) => cmd_check(args),
        Command::Fix(args) => cmd_fix(args),
        Command::ListRules(args) => cmd_list_rules(args).map_err(ToolError::from),
    };

    match result {
        Ok(()) => ExitCode::from(0),
        Err(ToolError::FindingsRemain) => ExitCode::from(2),
        Err(e) => {
            error!("{:?}", e);
            eprintln!("treefix: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn cmd_check(args: CheckArgs) -> Result<(), ToolError> {
    let registry = registry()?;
    let merged = load_merged(&args.common, CliOverrides::default(), &registry)?;
    let source = document_source(&args.common, &merged);

    let report = check_project(&source, &registry, &MiniLang, &merged.settings)?;
    match args.common.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print_findings(&report),
    }
    verdict(&report)
}

fn cmd_fix(args: FixArgs) -> Result<(), ToolError> {
    let registry = registry()?;
    let overrides = CliOverrides {
        rules: args.rules.clone(),
        max_iterations: args.max_iterations,
        ..CliOverrides::default()
    };
    let merged = load_merged(&args.common, overrides, &registry)?;
    let source = document_source(&args.common, &merged);

    let writer = FsWritePort;
    let writer: Option<&dyn WritePort> = args.write.then_some(&writer as &dyn WritePort);
    let outcome = fix_project(
        &source,
        writer,
        &registry,
        &MiniLang,
        &merged.settings,
        &FixScope::AllFixable,
        &CancellationToken::new(),
    )?;

    match args.common.format {
        OutputFormat::Json => print_json(&outcome.report)?,
        OutputFormat::Text => {
            if !args.write {
                print!("{}", outcome.patch);
            }
            print_fix_summary(&outcome.report);
        }
    }
    if args.write {
        info!(
            documents = outcome.report.documents.iter().filter(|d| d.changed).count(),
            "wrote fixed documents"
        );
    }
    verdict(&outcome.report)
}

fn cmd_list_rules(args: ListRulesArgs) -> anyhow::Result<()> {
    let registry = registry()?;
    let infos = registry.infos();
    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&infos)?);
        }
        OutputFormat::Text => {
            for info in infos {
                let kind = if info.fixable { "fixable" } else { "report-only" };
                println!(
                    "{:<20} {:<8} {:<12} {}",
                    info.id,
                    info.default_severity.to_string(),
                    kind,
                    info.description
                );
            }
        }
    }
    Ok(())
}

fn registry() -> anyhow::Result<RuleRegistry> {
    builtin_registry().context("build rule registry")
}

fn load_merged(
    common: &CommonArgs,
    mut overrides: CliOverrides,
    registry: &RuleRegistry,
) -> anyhow::Result<MergedConfig> {
    for id in &overrides.rules {
        if registry.get(id).is_none() {
            bail!("unknown rule '{}' (see `treefix list-rules`)", id);
        }
    }
    overrides.allow = common.allow.clone();
    overrides.deny = common.deny.clone();

    let file_config =
        config::load_or_default(&common.root).context("load treefix.toml config")?;
    let merged = ConfigMerger::new(file_config).merge(&overrides)?;
    debug!(
        "merged config: allow={:?}, deny={:?}, max_iterations={}, include={:?}",
        merged.settings.selection.allow,
        merged.settings.selection.deny,
        merged.settings.max_iterations,
        merged.include
    );
    Ok(merged)
}

fn document_source(common: &CommonArgs, merged: &MergedConfig) -> FsDocumentSource {
    FsDocumentSource::new(common.root.clone(), merged.include.clone())
        .with_paths(common.paths.clone())
}

fn print_json(report: &ProjectReport) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(report).context("serialize report")?
    );
    Ok(())
}

fn print_findings(report: &ProjectReport) {
    for doc in &report.documents {
        if let Some(err) = &doc.error {
            println!("{}: error: {}", doc.path, err);
            continue;
        }
        for f in &doc.findings {
            println!(
                "{}:{}: {}[{}] {}",
                doc.path, f.span, f.severity, f.rule_id, f.message
            );
        }
    }
    let t = &report.totals;
    println!(
        "{} finding(s) in {} document(s): {} error, {} warning, {} info",
        t.error + t.warn + t.info,
        t.documents,
        t.error,
        t.warn,
        t.info
    );
}

fn print_fix_summary(report: &ProjectReport) {
    for doc in &report.documents {
        if let Some(err) = &doc.error {
            println!("{}: error: {}", doc.path, err);
            continue;
        }
        if let Some(fix) = &doc.fix
            && (doc.changed || !fix.status.is_done() || fix.skipped > 0)
        {
            println!(
                "{}: {} (applied {}, skipped {}, {} pass(es))",
                doc.path, fix.status, fix.applied, fix.skipped, fix.iterations
            );
        }
    }
    let t = &report.totals;
    println!(
        "applied {} edit(s) across {} document(s); {} skipped, {} incomplete",
        t.applied, t.documents, t.skipped, t.incomplete
    );
}
