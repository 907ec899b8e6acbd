//! Configuration file loading for treefix.
//!
//! Discovers and loads `treefix.toml` from the project root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::{Context, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;
use treefix_core::FixSettings;
use treefix_core::settings::DEFAULT_MAX_ITERATIONS;
use treefix_domain::RuleSelection;
use treefix_types::finding::Severity;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "treefix.toml";

/// Top-level configuration from treefix.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TreefixConfig {
    pub rules: RulesConfig,
    pub fix: FixConfig,
}

/// `[rules]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Glob patterns over rule ids. If non-empty, only matching rules run.
    pub allow: Vec<String>,

    /// Glob patterns over rule ids. Deny wins over allow.
    pub deny: Vec<String>,

    /// Severity overrides by rule id (`error`, `warning`/`warn`, `info`).
    pub severity: BTreeMap<String, String>,
}

/// `[fix]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FixConfig {
    /// Upper bound on committed plans per document.
    pub max_iterations: Option<u32>,

    /// Globs selecting documents under the project root.
    pub include: Vec<String>,
}

/// Discover the treefix.toml config file.
///
/// Returns `None` if no config file is found.
pub fn discover_config(root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a treefix.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<TreefixConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<TreefixConfig> {
    let config: TreefixConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the project root, or return default if not found.
pub fn load_or_default(root: &Utf8Path) -> anyhow::Result<TreefixConfig> {
    match discover_config(root) {
        Some(path) => load_config(&path),
        None => Ok(TreefixConfig::default()),
    }
}

/// Merged configuration combining config file and CLI arguments.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub settings: FixSettings,
    pub include: Vec<String>,
}

/// CLI arguments that take part in the merge.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub allow: Vec<String>,
    pub deny: Vec<String>,
    /// Exact rule ids; replaces the allow list when non-empty.
    pub rules: Vec<String>,
    pub max_iterations: Option<u32>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: TreefixConfig,
}

impl ConfigMerger {
    pub fn new(config: TreefixConfig) -> Self {
        Self { config }
    }

    /// CLI `allow` and `deny` lists extend the config file lists; `--rule` replaces the
    /// allow list; `--max-iterations` overrides the file.
    pub fn merge(self, cli: &CliOverrides) -> anyhow::Result<MergedConfig> {
        let mut allow = self.config.rules.allow;
        let mut deny = self.config.rules.deny;

        for pattern in &cli.allow {
            if !allow.contains(pattern) {
                allow.push(pattern.clone());
            }
        }
        for pattern in &cli.deny {
            if !deny.contains(pattern) {
                deny.push(pattern.clone());
            }
        }
        if !cli.rules.is_empty() {
            allow = cli.rules.clone();
        }

        let mut severity = BTreeMap::new();
        for (rule_id, level) in &self.config.rules.severity {
            let parsed = Severity::parse(level)
                .ok_or_else(|| anyhow!("invalid severity '{}' for rule {}", level, rule_id))?;
            severity.insert(rule_id.clone(), parsed);
        }

        let max_iterations = cli
            .max_iterations
            .or(self.config.fix.max_iterations)
            .unwrap_or(DEFAULT_MAX_ITERATIONS);

        Ok(MergedConfig {
            settings: FixSettings {
                max_iterations,
                selection: RuleSelection {
                    allow,
                    deny,
                    severity,
                },
            },
            include: self.config.fix.include,
        })
    }
}
