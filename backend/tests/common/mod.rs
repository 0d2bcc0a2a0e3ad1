// Common test utilities that are shared across integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex, Once};
use tally_backend::workflows::{ActionHandler, ExecutionContext};

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .try_init()
            .ok();
    });
}

/// One handler invocation as seen by a [`RecordingHandler`]
#[derive(Debug, Clone)]
pub struct Invocation {
    pub action_type: String,
    pub rule_id: String,
    pub entity_id: String,
    pub payload: Value,
}

/// Records every call into a shared journal; optionally fails each call
pub struct RecordingHandler {
    action_type: String,
    journal: Arc<Mutex<Vec<Invocation>>>,
    fail_with: Option<String>,
}

impl RecordingHandler {
    pub fn new(action_type: &str, journal: &Arc<Mutex<Vec<Invocation>>>) -> Arc<Self> {
        Arc::new(Self {
            action_type: action_type.to_string(),
            journal: Arc::clone(journal),
            fail_with: None,
        })
    }

    pub fn failing(
        action_type: &str,
        journal: &Arc<Mutex<Vec<Invocation>>>,
        message: &str,
    ) -> Arc<Self> {
        Arc::new(Self {
            action_type: action_type.to_string(),
            journal: Arc::clone(journal),
            fail_with: Some(message.to_string()),
        })
    }
}

#[async_trait]
impl ActionHandler for RecordingHandler {
    async fn execute(&self, payload: &Value, context: &ExecutionContext) -> anyhow::Result<()> {
        self.journal.lock().unwrap().push(Invocation {
            action_type: self.action_type.clone(),
            rule_id: context.rule_id.clone(),
            entity_id: context.entity_id.clone(),
            payload: payload.clone(),
        });
        match &self.fail_with {
            Some(message) => Err(anyhow::anyhow!(message.clone())),
            None => Ok(()),
        }
    }
}

pub fn journal() -> Arc<Mutex<Vec<Invocation>>> {
    Arc::new(Mutex::new(Vec::new()))
}
