//! Builtin rule catalog.
//!
//! Each rule is a short predicate over one node or symbol kind. Rules with a fix implement
//! [`FixStrategy`](treefix_domain::FixStrategy) themselves and return `Some(self)`.

mod double_negation;
mod redundant_else;
mod redundant_parens;
mod snake_case_names;
mod unused_variable;

pub use double_negation::DoubleNegation;
pub use redundant_else::RedundantElse;
pub use redundant_parens::RedundantParens;
pub use snake_case_names::SnakeCaseNames;
pub use unused_variable::UnusedVariable;

use treefix_domain::{RegistryError, Rule, RuleContext, RuleRegistry};
use treefix_types::span::Span;

pub fn builtin_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(RedundantElse),
        Box::new(DoubleNegation),
        Box::new(RedundantParens),
        Box::new(UnusedVariable),
        Box::new(SnakeCaseNames),
    ]
}

pub fn builtin_registry() -> Result<RuleRegistry, RegistryError> {
    RuleRegistry::with_rules(builtin_rules())
}

/// `text` as a replacement for `span`, with a leading space when the byte before
/// `span` would otherwise glue onto it (`return(x)` must not become `returnx`).
pub(crate) fn unglued(cx: &RuleContext<'_>, span: Span, text: &str) -> String {
    let glued = span.start > 0
        && cx
            .tree
            .text()
            .as_bytes()
            .get(span.start - 1)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_');
    if glued {
        format!(" {text}")
    } else {
        text.to_string()
    }
}
