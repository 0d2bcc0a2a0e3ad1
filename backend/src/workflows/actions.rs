// Workflow Actions - Handler interface and registry for rule actions
//
// The engine never implements side effects itself. The host application
// registers one handler per action type ("create_invoice", "send_email", ...)
// and the executor looks them up by exact key.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};
use tally_shared::{EntityType, TriggerEvent};
use tracing::{debug, info};

use crate::error::{AutomationError, AutomationResult};

/// What a handler knows about the rule and trigger that requested it
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub rule_id: String,
    pub rule_name: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub event: TriggerEvent,
    /// Trigger data as seen by conditions (includes `entityType`, `entityId`, `event`)
    pub trigger_data: Value,
}

/// Host-supplied implementation of one action type.
///
/// Handlers own their retry and timeout policy. A handler that wants
/// fire-and-forget behavior should spawn its own task and return `Ok(())`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn execute(&self, payload: &Value, context: &ExecutionContext) -> anyhow::Result<()>;
}

type HandlerFn = dyn Fn(Value, ExecutionContext) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync;

/// Adapter that turns an async closure into an [`ActionHandler`]
pub struct FnHandler {
    inner: Box<HandlerFn>,
}

#[async_trait]
impl ActionHandler for FnHandler {
    async fn execute(&self, payload: &Value, context: &ExecutionContext) -> anyhow::Result<()> {
        (self.inner)(payload.clone(), context.clone()).await
    }
}

/// Build a handler from an async closure receiving owned payload and context
pub fn handler_fn<F, Fut>(f: F) -> FnHandler
where
    F: Fn(Value, ExecutionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    FnHandler {
        inner: Box::new(move |payload, context| Box::pin(f(payload, context))),
    }
}

/// Logs the action and succeeds. Useful as a placeholder while wiring up a host.
#[derive(Debug, Default, Clone)]
pub struct LoggingHandler;

#[async_trait]
impl ActionHandler for LoggingHandler {
    async fn execute(&self, payload: &Value, context: &ExecutionContext) -> anyhow::Result<()> {
        info!(
            rule_id = %context.rule_id,
            entity_type = %context.entity_type,
            entity_id = %context.entity_id,
            payload = %payload,
            "Automation action requested"
        );
        Ok(())
    }
}

/// String-keyed handler registry
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn ActionHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous handler for the same type
    pub fn register(
        &self,
        action_type: &str,
        handler: Arc<dyn ActionHandler>,
    ) -> AutomationResult<()> {
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| AutomationError::unavailable("handler registry"))?;
        if handlers.insert(action_type.to_string(), handler).is_some() {
            debug!(action_type, "Replaced action handler");
        } else {
            debug!(action_type, "Registered action handler");
        }
        Ok(())
    }

    /// Returns whether a handler was registered for the type
    pub fn unregister(&self, action_type: &str) -> AutomationResult<bool> {
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| AutomationError::unavailable("handler registry"))?;
        Ok(handlers.remove(action_type).is_some())
    }

    pub fn get(&self, action_type: &str) -> AutomationResult<Option<Arc<dyn ActionHandler>>> {
        let handlers = self
            .handlers
            .read()
            .map_err(|_| AutomationError::unavailable("handler registry"))?;
        Ok(handlers.get(action_type).cloned())
    }

    /// Registered action types, sorted
    pub fn action_types(&self) -> AutomationResult<Vec<String>> {
        let handlers = self
            .handlers
            .read()
            .map_err(|_| AutomationError::unavailable("handler registry"))?;
        let mut types: Vec<String> = handlers.keys().cloned().collect();
        types.sort();
        Ok(types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> ExecutionContext {
        ExecutionContext {
            rule_id: "r1".into(),
            rule_name: "Rule".into(),
            entity_type: EntityType::Client,
            entity_id: "c-1".into(),
            event: TriggerEvent::Created,
            trigger_data: json!({"entityType": "client"}),
        }
    }

    #[test]
    fn test_register_and_unregister() {
        let registry = HandlerRegistry::new();
        registry.register("send_email", Arc::new(LoggingHandler)).unwrap();
        registry.register("create_job", Arc::new(LoggingHandler)).unwrap();

        assert_eq!(registry.action_types().unwrap(), vec!["create_job", "send_email"]);
        assert!(registry.get("send_email").unwrap().is_some());
        assert!(registry.get("SEND_EMAIL").unwrap().is_none());

        assert!(registry.unregister("send_email").unwrap());
        assert!(!registry.unregister("send_email").unwrap());
        assert!(registry.get("send_email").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_handler_fn_receives_payload_and_context() {
        let handler = handler_fn(|payload, ctx| async move {
            anyhow::ensure!(payload["to"] == "ops@acme.test", "wrong recipient");
            anyhow::ensure!(ctx.entity_id == "c-1", "wrong entity");
            Ok(())
        });

        assert!(handler.execute(&json!({"to": "ops@acme.test"}), &context()).await.is_ok());
        assert!(handler.execute(&json!({"to": "nobody"}), &context()).await.is_err());
    }

    #[tokio::test]
    async fn test_logging_handler_succeeds() {
        assert!(LoggingHandler.execute(&json!({}), &context()).await.is_ok());
    }
}
