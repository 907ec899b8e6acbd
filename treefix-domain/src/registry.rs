use crate::error::RegistryError;
use crate::rules::{Rule, Subscription};
use serde::Serialize;
use treefix_types::finding::Severity;
use treefix_types::symbols::SymbolKind;
use treefix_types::tree::NodeKind;

/// Rules plus kind-indexed dispatch tables.
///
/// Collection never asks every rule about every node: it looks the node's kind up in
/// `by_node` and only calls the rules that subscribed to it.
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
    by_node: [Vec<usize>; NodeKind::COUNT],
    by_symbol: [Vec<usize>; SymbolKind::COUNT],
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.rules.iter().map(|r| r.id()).collect::<Vec<_>>())
            .finish()
    }
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            by_node: std::array::from_fn(|_| Vec::new()),
            by_symbol: std::array::from_fn(|_| Vec::new()),
        }
    }

    pub fn with_rules(rules: Vec<Box<dyn Rule>>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for rule in rules {
            registry.register(rule)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, rule: Box<dyn Rule>) -> Result<(), RegistryError> {
        let id = rule.id();
        if !is_valid_rule_id(id) {
            return Err(RegistryError::InvalidId(id.to_string()));
        }
        if self.index_of(id).is_some() {
            return Err(RegistryError::DuplicateRule(id.to_string()));
        }

        let idx = self.rules.len();
        for sub in rule.subscriptions() {
            let slot = match *sub {
                Subscription::Node(kind) => &mut self.by_node[kind.index()],
                Subscription::Symbol(kind) => &mut self.by_symbol[kind.index()],
            };
            if !slot.contains(&idx) {
                slot.push(idx);
            }
        }
        tracing::debug!(rule = id, "registered rule");
        self.rules.push(rule);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn rule(&self, idx: usize) -> Option<&dyn Rule> {
        self.rules.get(idx).map(|r| r.as_ref())
    }

    pub fn get(&self, id: &str) -> Option<&dyn Rule> {
        self.index_of(id).and_then(|idx| self.rule(idx))
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.id() == id)
    }

    /// Indices of the rules subscribed to `kind`, in registration order.
    pub fn for_node(&self, kind: NodeKind) -> &[usize] {
        &self.by_node[kind.index()]
    }

    pub fn for_symbol(&self, kind: SymbolKind) -> &[usize] {
        &self.by_symbol[kind.index()]
    }

    /// Catalog listing, sorted by id.
    pub fn infos(&self) -> Vec<RuleInfo> {
        let mut out: Vec<RuleInfo> = self
            .rules
            .iter()
            .map(|r| RuleInfo {
                id: r.id().to_string(),
                description: r.description().to_string(),
                default_severity: r.default_severity(),
                fixable: r.fix_strategy().is_some(),
            })
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleInfo {
    pub id: String,
    pub description: String,
    pub default_severity: Severity,
    pub fixable: bool,
}

fn is_valid_rule_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleError;
    use crate::rules::{RuleContext, Target};
    use treefix_types::finding::Finding;

    struct StubRule {
        id: &'static str,
        subs: Vec<Subscription>,
    }

    impl Rule for StubRule {
        fn id(&self) -> &str {
            self.id
        }

        fn description(&self) -> &str {
            "stub rule"
        }

        fn subscriptions(&self) -> &[Subscription] {
            &self.subs
        }

        fn evaluate(&self, _: Target<'_>, _: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
            Ok(vec![])
        }
    }

    fn stub_rule(id: &'static str, subs: Vec<Subscription>) -> Box<dyn Rule> {
        Box::new(StubRule { id, subs })
    }

    #[test]
    fn dispatch_tables_index_by_kind() {
        let registry = RuleRegistry::with_rules(vec![
            stub_rule("a", vec![Subscription::Node(NodeKind::IfStmt)]),
            stub_rule(
                "b",
                vec![
                    Subscription::Node(NodeKind::IfStmt),
                    Subscription::Node(NodeKind::IfStmt),
                    Subscription::Symbol(SymbolKind::Variable),
                ],
            ),
        ])
        .expect("registry");

        assert_eq!(registry.for_node(NodeKind::IfStmt), &[0, 1]);
        assert!(registry.for_node(NodeKind::Block).is_empty());
        assert_eq!(registry.for_symbol(SymbolKind::Variable), &[1]);
        assert_eq!(registry.get("b").map(|r| r.id()), Some("b"));
    }

    #[test]
    fn duplicate_and_invalid_ids_are_rejected() {
        let mut registry = RuleRegistry::new();
        registry.register(stub_rule("a", vec![])).expect("first");
        assert!(matches!(
            registry.register(stub_rule("a", vec![])),
            Err(RegistryError::DuplicateRule(id)) if id == "a"
        ));
        assert!(matches!(
            registry.register(stub_rule("Bad-Id", vec![])),
            Err(RegistryError::InvalidId(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn infos_are_sorted_by_id() {
        let registry =
            RuleRegistry::with_rules(vec![stub_rule("zeta", vec![]), stub_rule("alpha", vec![])])
                .expect("registry");
        let ids: Vec<String> = registry.infos().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["alpha".to_string(), "zeta".to_string()]);
        assert!(!registry.infos()[0].fixable);
    }
}
