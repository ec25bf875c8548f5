//! [`RuleRegistry`]: an ordered set of rules, registration order preserved.

use crate::rule::Rule;

/// Holds registered rules in the order they were added. Iteration order
/// is the evaluation order the evaluator fans out over — the registry
/// itself never reorders or deduplicates.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn register(&mut self, rule: Box<dyn Rule>) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn get(&self, index: usize) -> Option<&dyn Rule> {
        self.rules.get(index).map(|r| r.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{RuleError, RuleInput};
    use mirror_types::violation::Violation;

    struct Noop(&'static str);
    impl Rule for Noop {
        fn id(&self) -> &str {
            self.0
        }
        fn version(&self) -> &str {
            "1"
        }
        fn evaluate(&self, _input: &RuleInput) -> Result<Vec<Violation>, RuleError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn preserves_registration_order() {
        let mut registry = RuleRegistry::new();
        registry.register(Box::new(Noop("A"))).register(Box::new(Noop("B")));
        let ids: Vec<&str> = registry.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }
}
