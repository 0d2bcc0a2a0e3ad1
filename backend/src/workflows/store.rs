// Rule Store - Authoritative in-memory rule configuration
//
// Rules are kept in insertion order behind a read-write lock. Readers get
// cloned snapshots, so dispatch never holds the lock while handlers run and
// never observes a rule halfway through an update.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tally_shared::{EntityType, Rule, RuleFilter, RulePatch};
use tracing::{info, warn};

use crate::error::{AutomationError, AutomationResult};

#[derive(Debug, Default)]
pub struct RuleStore {
    rules: RwLock<Vec<Rule>>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from a rule set, rejecting duplicate ids
    pub fn from_rules(rules: Vec<Rule>) -> AutomationResult<Self> {
        let store = Self::new();
        for rule in rules {
            store.add(rule)?;
        }
        Ok(store)
    }

    fn read(&self) -> AutomationResult<RwLockReadGuard<'_, Vec<Rule>>> {
        self.rules
            .read()
            .map_err(|_| AutomationError::unavailable("rule store"))
    }

    fn write(&self) -> AutomationResult<RwLockWriteGuard<'_, Vec<Rule>>> {
        self.rules
            .write()
            .map_err(|_| AutomationError::unavailable("rule store"))
    }

    pub fn add(&self, rule: Rule) -> AutomationResult<()> {
        warn_malformed(&rule);

        let mut rules = self.write()?;
        if rules.iter().any(|r| r.id == rule.id) {
            return Err(AutomationError::DuplicateRuleId(rule.id));
        }

        info!(rule_id = %rule.id, name = %rule.name, priority = rule.priority, "Rule added");
        rules.push(rule);
        Ok(())
    }

    /// Merge `patch` into the rule, keeping its id and position
    pub fn update(&self, id: &str, patch: RulePatch) -> AutomationResult<Rule> {
        let mut rules = self.write()?;
        let rule = rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AutomationError::RuleNotFound(id.to_string()))?;

        // Build the merged rule first so the stored one is replaced in one step
        let mut updated = rule.clone();
        updated.apply(patch);
        warn_malformed(&updated);
        *rule = updated.clone();

        info!(rule_id = %id, "Rule updated");
        Ok(updated)
    }

    pub fn remove(&self, id: &str) -> AutomationResult<Rule> {
        let mut rules = self.write()?;
        let index = rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AutomationError::RuleNotFound(id.to_string()))?;

        info!(rule_id = %id, "Rule removed");
        Ok(rules.remove(index))
    }

    pub fn get(&self, id: &str) -> AutomationResult<Rule> {
        self.read()?
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| AutomationError::RuleNotFound(id.to_string()))
    }

    /// Rules matching `filter`, by ascending priority then insertion order
    pub fn list(&self, filter: &RuleFilter) -> AutomationResult<Vec<Rule>> {
        let mut selected: Vec<Rule> = self
            .read()?
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        selected.sort_by_key(|r| r.priority);
        Ok(selected)
    }

    /// Active rules with a condition naming `entity_type`, by ascending
    /// priority then insertion order
    pub fn applicable_rules(&self, entity_type: EntityType) -> AutomationResult<Vec<Rule>> {
        let mut selected: Vec<Rule> = self
            .read()?
            .iter()
            .filter(|r| r.is_active && r.applies_to(entity_type))
            .cloned()
            .collect();
        // sort_by_key is stable, which keeps insertion order for equal priorities
        selected.sort_by_key(|r| r.priority);
        Ok(selected)
    }

    pub fn len(&self) -> AutomationResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> AutomationResult<bool> {
        Ok(self.read()?.is_empty())
    }
}

fn warn_malformed(rule: &Rule) {
    for condition in rule.conditions.iter().filter(|c| c.is_malformed()) {
        warn!(
            rule_id = %rule.id,
            field = %condition.field,
            operator = condition.operator.as_str(),
            "Condition value is not a list; condition will never match"
        );
    }
}
