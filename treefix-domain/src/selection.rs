use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use treefix_types::finding::Severity;

/// Which rules run and at which severity.
///
/// An empty allow list enables every rule; deny always wins over allow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSelection {
    /// Glob patterns (`*`, `?`) over rule ids.
    #[serde(default)]
    pub allow: Vec<String>,

    #[serde(default)]
    pub deny: Vec<String>,

    /// Per-rule severity overrides.
    #[serde(default)]
    pub severity: BTreeMap<String, Severity>,
}

impl RuleSelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn is_enabled(&self, rule_id: &str) -> bool {
        if self.deny.iter().any(|pat| glob_match(pat, rule_id)) {
            return false;
        }
        self.allow.is_empty() || self.allow.iter().any(|pat| glob_match(pat, rule_id))
    }

    pub fn severity_for(&self, rule_id: &str, default: Severity) -> Severity {
        self.severity.get(rule_id).copied().unwrap_or(default)
    }
}

/// Match `text` against a pattern where `*` is any run and `?` any single byte.
pub fn glob_match(pat: &str, text: &str) -> bool {
    let p = pat.as_bytes();
    let t = text.as_bytes();
    let mut dp = vec![vec![false; t.len() + 1]; p.len() + 1];
    dp[0][0] = true;

    for i in 1..=p.len() {
        if p[i - 1] == b'*' {
            dp[i][0] = dp[i - 1][0];
        }
    }

    for i in 1..=p.len() {
        for j in 1..=t.len() {
            dp[i][j] = match p[i - 1] {
                b'*' => dp[i - 1][j] || dp[i][j - 1],
                b'?' => dp[i - 1][j - 1],
                c => dp[i - 1][j - 1] && c == t[j - 1],
            };
        }
    }

    dp[p.len()][t.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_match_handles_star_and_question() {
        assert!(glob_match("redundant_*", "redundant_else"));
        assert!(glob_match("*", "anything"));
        assert!(!glob_match("a?b", "ab"));
        assert!(glob_match("a?b", "acb"));
        assert!(!glob_match("redundant_*", "double_negation"));
    }

    #[test]
    fn deny_wins_over_allow() {
        let sel = RuleSelection {
            allow: vec!["redundant_*".to_string()],
            deny: vec!["redundant_parens".to_string()],
            severity: BTreeMap::new(),
        };
        assert!(sel.is_enabled("redundant_else"));
        assert!(!sel.is_enabled("redundant_parens"));
        assert!(!sel.is_enabled("double_negation"));
    }

    #[test]
    fn empty_allow_enables_everything() {
        let sel = RuleSelection::all();
        assert!(sel.is_enabled("snake_case_names"));
        assert_eq!(sel.severity_for("x", Severity::Info), Severity::Info);
    }

    #[test]
    fn severity_override_applies_per_rule() {
        let mut sel = RuleSelection::only(["unused_variable"]);
        sel.severity
            .insert("unused_variable".to_string(), Severity::Error);
        assert_eq!(
            sel.severity_for("unused_variable", Severity::Warning),
            Severity::Error
        );
        assert!(!sel.is_enabled("double_negation"));
    }
}
