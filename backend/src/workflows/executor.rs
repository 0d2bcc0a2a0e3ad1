// Workflow Executor - Runs a matched rule's actions against the handler registry
//
// Every action gets its own result. Missing handlers, handler errors, panics
// and timeouts are recorded and execution moves on to the next action.

use futures::FutureExt;
use regex::Regex;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, LazyLock};
use std::time::Instant;
use tally_shared::{Action, ActionError, ActionResult};
use tracing::{debug, warn};

use super::actions::{ExecutionContext, HandlerRegistry};
use super::conditions::resolve_field;
use super::engine::EngineConfig;
use crate::error::AutomationResult;

static TEMPLATE_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^{}\s]+)\s*\}\}").expect("template pattern is valid"));

pub struct ActionExecutor {
    registry: Arc<HandlerRegistry>,
    config: EngineConfig,
}

impl ActionExecutor {
    pub fn new(registry: Arc<HandlerRegistry>, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    /// Execute actions in declared order, one result per action.
    ///
    /// Only fails when the handler registry itself is unusable.
    pub async fn run(
        &self,
        actions: &[Action],
        context: &ExecutionContext,
    ) -> AutomationResult<Vec<ActionResult>> {
        let mut results = Vec::with_capacity(actions.len());

        for action in actions {
            let start = Instant::now();

            let Some(handler) = self.registry.get(&action.action_type)? else {
                warn!(
                    rule_id = %context.rule_id,
                    action_type = %action.action_type,
                    "No handler registered for action type"
                );
                results.push(ActionResult::failure(
                    &action.action_type,
                    ActionError::UnknownActionType {
                        action_type: action.action_type.clone(),
                    },
                    0,
                ));
                continue;
            };

            let payload = if self.config.render_templates {
                process_templates(&action.data, &context.trigger_data)
            } else {
                action.data.clone()
            };

            debug!(
                rule_id = %context.rule_id,
                action_type = %action.action_type,
                "Executing action"
            );

            let invocation = AssertUnwindSafe(handler.execute(&payload, context)).catch_unwind();
            let outcome = match self.config.action_timeout {
                Some(limit) => match tokio::time::timeout(limit, invocation).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        let after_ms = limit.as_millis() as u64;
                        warn!(
                            rule_id = %context.rule_id,
                            action_type = %action.action_type,
                            after_ms,
                            "Action timed out"
                        );
                        results.push(ActionResult::failure(
                            &action.action_type,
                            ActionError::Timeout { after_ms },
                            elapsed_ms(start),
                        ));
                        continue;
                    }
                },
                None => invocation.await,
            };

            let duration = elapsed_ms(start);
            let result = match outcome {
                Ok(Ok(())) => ActionResult::success(&action.action_type, duration),
                Ok(Err(e)) => {
                    warn!(
                        rule_id = %context.rule_id,
                        action_type = %action.action_type,
                        error = %e,
                        "Action failed"
                    );
                    ActionResult::failure(
                        &action.action_type,
                        ActionError::Handler {
                            message: format!("{:#}", e),
                        },
                        duration,
                    )
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    warn!(
                        rule_id = %context.rule_id,
                        action_type = %action.action_type,
                        panic = %message,
                        "Action handler panicked"
                    );
                    ActionResult::failure(
                        &action.action_type,
                        ActionError::Panicked { message },
                        duration,
                    )
                }
            };
            results.push(result);
        }

        Ok(results)
    }
}

fn elapsed_ms(start: Instant) -> i64 {
    start.elapsed().as_millis() as i64
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Render `{{path}}` placeholders in every string of a payload.
///
/// A string that is exactly one placeholder takes the resolved value as-is,
/// keeping its JSON type. Placeholders inside longer strings are replaced by
/// the value's text. Unresolvable placeholders are left untouched.
pub fn process_templates(payload: &Value, data: &Value) -> Value {
    match payload {
        Value::String(s) => render_string(s, data),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), process_templates(v, data)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| process_templates(v, data)).collect())
        }
        other => other.clone(),
    }
}

fn render_string(template: &str, data: &Value) -> Value {
    if let Some(cap) = TEMPLATE_VAR.captures(template) {
        if cap.get(0).is_some_and(|m| m.as_str() == template) {
            if let Some(value) = resolve_field(&cap[1], data) {
                return value.clone();
            }
        }
    }

    let rendered = TEMPLATE_VAR.replace_all(template, |cap: &regex::Captures<'_>| {
        match resolve_field(&cap[1], data) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => cap[0].to_string(),
        }
    });
    Value::String(rendered.into_owned())
}
