//! Clap-free settings for the fix pipeline.

use treefix_domain::RuleSelection;

pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// Settings shared by every document of one run.
#[derive(Debug, Clone)]
pub struct FixSettings {
    /// Upper bound on committed plans per batch.
    pub max_iterations: u32,
    pub selection: RuleSelection,
}

impl Default for FixSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            selection: RuleSelection::all(),
        }
    }
}
