//! Embeddable core library for treefix.
//!
//! Provides a clap-free, I/O-abstracted entry point suitable for linking
//! into an editor host, a CI runner or the `treefix` binary.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`DocumentSource`](ports::DocumentSource): list and read source documents
//! - [`WritePort`](ports::WritePort): write fixed documents back
//!
//! The [`adapters`] module provides filesystem-backed and in-memory implementations.
//!
//! # Entry points
//!
//! - [`BatchOrchestrator::apply_fix`](orchestrator::BatchOrchestrator::apply_fix): fix one tree
//! - [`check_project`](project::check_project): report findings for every document
//! - [`fix_project`](project::fix_project): fix every document, optionally writing back

pub mod adapters;
pub mod cancel;
pub mod orchestrator;
pub mod ports;
pub mod project;
pub mod settings;

pub use cancel::CancellationToken;
pub use orchestrator::{BatchOrchestrator, FixOutcome};
pub use project::{ProjectOutcome, ToolError, check_project, fix_project, verdict};
pub use settings::FixSettings;

// Re-exported so embedders can drive a batch without depending on the inner crates.
pub use treefix_domain::{FrontEnd, RuleRegistry, RuleSelection};
pub use treefix_types::scope::FixScope;
