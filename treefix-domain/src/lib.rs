//! Domain logic: run rules over a syntax tree and turn their fixes into one conflict-free plan.
//!
//! This crate owns *what* should change and in which order. It does not own *how* a plan is
//! spliced into text; that's the `treefix-edit` crate.

mod collect;
mod error;
mod planner;
mod ports;
mod registry;
mod rules;
mod selection;

pub use collect::{Analysis, Collection, analyze, collect_findings};
pub use error::{FixStrategyError, RegistryError, RuleError};
pub use planner::{Candidates, build_candidates, deterministic_edit_id, plan};
pub use ports::{FrontEnd, ParseError};
pub use registry::{RuleInfo, RuleRegistry};
pub use rules::{FixStrategy, Rule, RuleContext, Subscription, Target};
pub use selection::{RuleSelection, glob_match};
