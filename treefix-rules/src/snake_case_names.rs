use treefix_domain::{Rule, RuleContext, RuleError, Subscription, Target};
use treefix_types::finding::{Finding, Severity};
use treefix_types::symbols::SymbolKind;

/// Declared names should be `snake_case`. Report-only: renaming touches every use site.
pub struct SnakeCaseNames;

impl SnakeCaseNames {
    const ID: &'static str = "snake_case_names";
}

impl Rule for SnakeCaseNames {
    fn id(&self) -> &str {
        Self::ID
    }

    fn description(&self) -> &str {
        "Variable, parameter and function names should be snake_case"
    }

    fn subscriptions(&self) -> &[Subscription] {
        &[
            Subscription::Symbol(SymbolKind::Variable),
            Subscription::Symbol(SymbolKind::Parameter),
            Subscription::Symbol(SymbolKind::Function),
        ]
    }

    fn default_severity(&self) -> Severity {
        Severity::Info
    }

    fn evaluate(&self, target: Target<'_>, cx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
        let Target::Symbol(symbol) = target else {
            return Ok(vec![]);
        };
        if is_snake_case(&symbol.name) {
            return Ok(vec![]);
        }
        Ok(vec![
            cx.finding(Self::ID, symbol.decl)
                .with_message(format!("{} `{}` is not snake_case", symbol.kind, symbol.name))
                .with_context("suggestion", to_snake_case(&symbol.name)),
        ])
    }
}

fn is_snake_case(name: &str) -> bool {
    name.trim_start_matches('_')
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_detection() {
        assert!(is_snake_case("answer_42"));
        assert!(is_snake_case("_private"));
        assert!(!is_snake_case("camelCase"));
        assert!(!is_snake_case("SHOUT"));
    }

    #[test]
    fn suggestion_splits_on_case_changes() {
        assert_eq!(to_snake_case("camelCase"), "camel_case");
        assert_eq!(to_snake_case("parseHTTP2Url"), "parse_http2_url");
        assert_eq!(to_snake_case("X"), "x");
    }
}
