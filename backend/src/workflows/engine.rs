// Workflow Engine - Host-facing facade over rules, handlers and dispatch

use std::sync::Arc;
use std::time::Duration;
use tally_shared::{ExecutionReport, Rule, RuleFilter, RulePatch, Trigger};
use tracing::info;

use super::actions::{ActionHandler, HandlerRegistry};
use super::dispatcher::TriggerDispatcher;
use super::executor::ActionExecutor;
use super::store::RuleStore;
use crate::error::AutomationResult;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound per handler invocation; `None` waits for the handler
    pub action_timeout: Option<Duration>,
    /// Render `{{path}}` placeholders in action payloads before execution
    pub render_templates: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            action_timeout: None,
            render_templates: true,
        }
    }
}

/// The automation engine as seen by the host application.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct WorkflowEngine {
    store: Arc<RuleStore>,
    registry: Arc<HandlerRegistry>,
    dispatcher: TriggerDispatcher,
}

impl WorkflowEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_store(Arc::new(RuleStore::new()), config)
    }

    /// Build an engine around an existing (possibly pre-seeded) rule store
    pub fn with_store(store: Arc<RuleStore>, config: EngineConfig) -> Self {
        let registry = Arc::new(HandlerRegistry::new());
        let executor = ActionExecutor::new(Arc::clone(&registry), config);
        let dispatcher = TriggerDispatcher::new(Arc::clone(&store), executor);

        Self {
            store,
            registry,
            dispatcher,
        }
    }

    pub async fn process_trigger(&self, trigger: &Trigger) -> AutomationResult<ExecutionReport> {
        self.dispatcher.process(trigger).await
    }

    pub fn register_action_handler(
        &self,
        action_type: &str,
        handler: Arc<dyn ActionHandler>,
    ) -> AutomationResult<()> {
        self.registry.register(action_type, handler)
    }

    pub fn unregister_action_handler(&self, action_type: &str) -> AutomationResult<bool> {
        self.registry.unregister(action_type)
    }

    pub fn action_types(&self) -> AutomationResult<Vec<String>> {
        self.registry.action_types()
    }

    pub fn add_rule(&self, rule: Rule) -> AutomationResult<()> {
        self.store.add(rule)
    }

    /// Add every rule, stopping at the first duplicate id
    pub fn add_rules(&self, rules: impl IntoIterator<Item = Rule>) -> AutomationResult<usize> {
        let mut added = 0;
        for rule in rules {
            self.store.add(rule)?;
            added += 1;
        }
        info!(added, "Rules loaded");
        Ok(added)
    }

    pub fn update_rule(&self, id: &str, patch: RulePatch) -> AutomationResult<Rule> {
        self.store.update(id, patch)
    }

    pub fn remove_rule(&self, id: &str) -> AutomationResult<Rule> {
        self.store.remove(id)
    }

    pub fn get_rule(&self, id: &str) -> AutomationResult<Rule> {
        self.store.get(id)
    }

    pub fn list_rules(&self, filter: &RuleFilter) -> AutomationResult<Vec<Rule>> {
        self.store.list(filter)
    }
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AutomationError;
    use crate::workflows::actions::LoggingHandler;
    use rust_decimal::Decimal;
    use serde_json::json;
    use tally_shared::{Action, Condition, EntityType};

    fn large_credit_rule() -> Rule {
        Rule::new("Invoice large credits")
            .with_id("large-credit")
            .with_condition(Condition::entity_type(EntityType::Transaction))
            .with_condition(Condition::greater_than("amount", 1000.0))
            .with_action(Action::create_invoice(json!({"amount": "{{amount}}"})))
    }

    #[test]
    fn test_rule_crud_through_engine() {
        let engine = WorkflowEngine::default();
        engine.add_rule(large_credit_rule()).unwrap();
        assert!(matches!(
            engine.add_rule(large_credit_rule()),
            Err(AutomationError::DuplicateRuleId(_))
        ));

        let updated = engine
            .update_rule("large-credit", RulePatch::default().active(false))
            .unwrap();
        assert!(!updated.is_active);
        assert!(!engine.get_rule("large-credit").unwrap().is_active);

        let inactive = RuleFilter {
            active: Some(false),
            ..Default::default()
        };
        assert_eq!(engine.list_rules(&inactive).unwrap().len(), 1);

        engine.remove_rule("large-credit").unwrap();
        assert!(engine.list_rules(&RuleFilter::default()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handler_registration_affects_next_trigger() {
        let engine = WorkflowEngine::default();
        engine.add_rule(large_credit_rule()).unwrap();
        let trigger = Trigger::transaction_created("tx-1", Decimal::new(2500, 0), "CREDIT");

        let report = engine.process_trigger(&trigger).await.unwrap();
        assert_eq!(report.actions_failed(), 1);

        engine
            .register_action_handler("create_invoice", Arc::new(LoggingHandler))
            .unwrap();
        let report = engine.process_trigger(&trigger).await.unwrap();
        assert!(report.is_clean());
        assert_eq!(report.actions_executed(), 1);

        assert!(engine.unregister_action_handler("create_invoice").unwrap());
        assert!(engine.action_types().unwrap().is_empty());
    }

    #[test]
    fn test_add_rules_stops_at_duplicate() {
        let engine = WorkflowEngine::default();
        let result = engine.add_rules(vec![
            large_credit_rule(),
            Rule::new("other").with_id("other"),
            large_credit_rule(),
        ]);

        assert!(matches!(result, Err(AutomationError::DuplicateRuleId(_))));
        assert_eq!(engine.list_rules(&RuleFilter::default()).unwrap().len(), 2);
    }
}
