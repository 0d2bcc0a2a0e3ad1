// Trigger Dispatcher - Matches a trigger against the rule set and runs actions

use std::sync::Arc;
use std::time::Instant;
use tally_shared::{ExecutionReport, RuleExecution, Trigger};
use tracing::{Instrument, debug, info, info_span, warn};

use super::actions::ExecutionContext;
use super::conditions::ConditionEvaluator;
use super::executor::ActionExecutor;
use super::store::RuleStore;
use crate::error::AutomationResult;

pub struct TriggerDispatcher {
    store: Arc<RuleStore>,
    executor: ActionExecutor,
}

impl TriggerDispatcher {
    pub fn new(store: Arc<RuleStore>, executor: ActionExecutor) -> Self {
        Self { store, executor }
    }

    /// Evaluate every applicable rule in priority order and execute the
    /// actions of those that match.
    ///
    /// Action failures are recorded in the report. Only an unusable rule
    /// store or handler registry fails the call.
    pub async fn process(&self, trigger: &Trigger) -> AutomationResult<ExecutionReport> {
        let span = info_span!(
            "process_trigger",
            entity_type = %trigger.entity_type,
            entity_id = %trigger.entity_id,
            event = %trigger.event,
        );
        self.dispatch(trigger).instrument(span).await
    }

    async fn dispatch(&self, trigger: &Trigger) -> AutomationResult<ExecutionReport> {
        let start = Instant::now();
        let mut report = ExecutionReport::new(trigger);

        // Snapshot; rule edits made while handlers run apply to the next trigger
        let rules = self.store.applicable_rules(trigger.entity_type)?;
        let document = trigger.evaluation_document();
        let evaluator = ConditionEvaluator::default();

        debug!(candidates = rules.len(), "Evaluating rules");

        for rule in rules {
            if !evaluator.matches(&rule.conditions, &document) {
                debug!(rule_id = %rule.id, "Rule did not match");
                report.rules.push(RuleExecution {
                    rule_id: rule.id,
                    rule_name: rule.name,
                    matched: false,
                    action_results: Vec::new(),
                });
                continue;
            }

            info!(rule_id = %rule.id, rule_name = %rule.name, actions = rule.actions.len(), "Rule matched");

            let context = ExecutionContext {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                entity_type: trigger.entity_type,
                entity_id: trigger.entity_id.clone(),
                event: trigger.event,
                trigger_data: document.clone(),
            };
            let action_results = self.executor.run(&rule.actions, &context).await?;

            let failed = action_results.iter().filter(|r| !r.ok).count();
            if failed > 0 {
                warn!(rule_id = %rule.id, failed, "Rule finished with failed actions");
            }

            report.rules.push(RuleExecution {
                rule_id: rule.id,
                rule_name: rule.name,
                matched: true,
                action_results,
            });
        }

        report.duration_ms = start.elapsed().as_millis() as i64;
        info!(
            matched = report.matched_rules().count(),
            actions = report.actions_executed(),
            failed = report.actions_failed(),
            duration_ms = report.duration_ms,
            "Trigger processed"
        );

        Ok(report)
    }
}
