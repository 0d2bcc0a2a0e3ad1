//! Shared automation model for Tally.
//!
//! These types describe triggers, rules and execution reports. They are plain
//! serde data so the host application can store, transmit and log them; the
//! engine that evaluates them lives in `tally-backend`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Arbitrary key-value document carried by triggers and action payloads.
pub type Document = Value;

/// Field name under which the trigger's entity type is visible to conditions.
pub const ENTITY_TYPE_FIELD: &str = "entityType";
/// Field name under which the trigger's entity id is visible to conditions.
pub const ENTITY_ID_FIELD: &str = "entityId";
/// Field name under which the trigger's event is visible to conditions.
pub const EVENT_FIELD: &str = "event";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseModelError {
    #[error("unknown entity type: {0}")]
    EntityType(String),
    #[error("unknown trigger event: {0}")]
    TriggerEvent(String),
}

// Triggers

/// Kinds of tracked entities that can raise triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Transaction,
    Invoice,
    Job,
    Client,
    Payment,
    Expense,
    Quote,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::Invoice => "invoice",
            Self::Job => "job",
            Self::Client => "client",
            Self::Payment => "payment",
            Self::Expense => "expense",
            Self::Quote => "quote",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = ParseModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transaction" => Ok(Self::Transaction),
            "invoice" => Ok(Self::Invoice),
            "job" => Ok(Self::Job),
            "client" => Ok(Self::Client),
            "payment" => Ok(Self::Payment),
            "expense" => Ok(Self::Expense),
            "quote" => Ok(Self::Quote),
            other => Err(ParseModelError::EntityType(other.to_string())),
        }
    }
}

/// What happened to the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    Created,
    Updated,
    Completed,
    Overdue,
}

impl TriggerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerEvent {
    type Err = ParseModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            "completed" => Ok(Self::Completed),
            "overdue" => Ok(Self::Overdue),
            other => Err(ParseModelError::TriggerEvent(other.to_string())),
        }
    }
}

/// A domain event and the entity snapshot taken when it happened.
///
/// Built by whatever part of the host application mutated the entity, after
/// its own state change is durable. Never modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub event: TriggerEvent,
    #[serde(default)]
    pub data: Document,
    #[serde(default = "Utc::now")]
    pub occurred_at: DateTime<Utc>,
}

impl Trigger {
    pub fn new(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        event: TriggerEvent,
        data: Document,
    ) -> Self {
        Self {
            entity_type,
            entity_id: entity_id.into(),
            event,
            data,
            occurred_at: Utc::now(),
        }
    }

    /// A bank or ledger transaction was posted
    pub fn transaction_created(
        transaction_id: impl Into<String>,
        amount: Decimal,
        transaction_type: &str,
    ) -> Self {
        Self::new(
            EntityType::Transaction,
            transaction_id,
            TriggerEvent::Created,
            serde_json::json!({
                "amount": decimal_value(amount),
                "type": transaction_type
            }),
        )
    }

    /// An invoice passed its due date without being paid in full
    pub fn invoice_overdue(
        invoice_id: impl Into<String>,
        client_id: impl Into<String>,
        amount: Decimal,
        days_overdue: i32,
    ) -> Self {
        Self::new(
            EntityType::Invoice,
            invoice_id,
            TriggerEvent::Overdue,
            serde_json::json!({
                "clientId": client_id.into(),
                "amount": decimal_value(amount),
                "daysOverdue": days_overdue
            }),
        )
    }

    pub fn job_updated(job_id: impl Into<String>, status: &str, due_date: Option<NaiveDate>) -> Self {
        Self::new(
            EntityType::Job,
            job_id,
            TriggerEvent::Updated,
            serde_json::json!({
                "status": status,
                "dueDate": due_date.map(|d| d.format("%Y-%m-%d").to_string())
            }),
        )
    }

    pub fn job_completed(job_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self::new(
            EntityType::Job,
            job_id,
            TriggerEvent::Completed,
            serde_json::json!({
                "status": "COMPLETED",
                "clientId": client_id.into()
            }),
        )
    }

    pub fn client_created(client_id: impl Into<String>, name: &str, email: &str) -> Self {
        Self::new(
            EntityType::Client,
            client_id,
            TriggerEvent::Created,
            serde_json::json!({
                "name": name,
                "email": email
            }),
        )
    }

    /// Override the event time (mostly useful for replays and tests)
    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    /// The document conditions are evaluated against: the trigger data with
    /// `entityType`, `entityId` and `event` set at the top level.
    ///
    /// Trigger metadata overrides same-named data keys. Non-map data is not
    /// addressable by field paths, so only the metadata keys are present.
    pub fn evaluation_document(&self) -> Document {
        let mut map = match &self.data {
            Value::Object(fields) => fields.clone(),
            _ => Map::new(),
        };
        map.insert(
            ENTITY_TYPE_FIELD.to_string(),
            Value::String(self.entity_type.as_str().to_string()),
        );
        map.insert(ENTITY_ID_FIELD.to_string(), Value::String(self.entity_id.clone()));
        map.insert(
            EVENT_FIELD.to_string(),
            Value::String(self.event.as_str().to_string()),
        );
        Value::Object(map)
    }
}

fn decimal_value(amount: Decimal) -> Value {
    amount
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(amount.to_string()))
}

// Rules

/// Comparison operators available to conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    Contains,
    GreaterThan,
    LessThan,
    In,
    NotIn,
    // Instant comparisons; the value may be the literal "now"
    DateBefore,
    DateAfter,
}

impl ConditionOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Contains => "contains",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::DateBefore => "date_before",
            Self::DateAfter => "date_after",
        }
    }
}

/// One predicate over trigger data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Dot-separated path into the trigger document (e.g. `client.tier`)
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: Value,
}

impl Condition {
    pub fn new(field: &str, operator: ConditionOperator, value: Value) -> Self {
        Self {
            field: field.to_string(),
            operator,
            value,
        }
    }

    pub fn equals(field: &str, value: Value) -> Self {
        Self::new(field, ConditionOperator::Equals, value)
    }

    pub fn contains(field: &str, value: &str) -> Self {
        Self::new(field, ConditionOperator::Contains, Value::String(value.to_string()))
    }

    pub fn greater_than(field: &str, value: f64) -> Self {
        Self::new(field, ConditionOperator::GreaterThan, serde_json::json!(value))
    }

    pub fn less_than(field: &str, value: f64) -> Self {
        Self::new(field, ConditionOperator::LessThan, serde_json::json!(value))
    }

    pub fn in_list(field: &str, values: Vec<Value>) -> Self {
        Self::new(field, ConditionOperator::In, Value::Array(values))
    }

    pub fn not_in_list(field: &str, values: Vec<Value>) -> Self {
        Self::new(field, ConditionOperator::NotIn, Value::Array(values))
    }

    pub fn date_before(field: &str, value: &str) -> Self {
        Self::new(field, ConditionOperator::DateBefore, Value::String(value.to_string()))
    }

    pub fn date_after(field: &str, value: &str) -> Self {
        Self::new(field, ConditionOperator::DateAfter, Value::String(value.to_string()))
    }

    /// Restrict a rule to one entity type
    pub fn entity_type(entity_type: EntityType) -> Self {
        Self::equals(
            ENTITY_TYPE_FIELD,
            Value::String(entity_type.as_str().to_string()),
        )
    }

    pub fn event(event: TriggerEvent) -> Self {
        Self::equals(EVENT_FIELD, Value::String(event.as_str().to_string()))
    }

    /// Whether this condition names `entity_type` through the `entityType` field
    pub fn references_entity_type(&self, entity_type: EntityType) -> bool {
        if self.field != ENTITY_TYPE_FIELD {
            return false;
        }
        let wanted = entity_type.as_str();
        match self.operator {
            ConditionOperator::Equals => self.value.as_str() == Some(wanted),
            ConditionOperator::In => self
                .value
                .as_array()
                .is_some_and(|values| values.iter().any(|v| v.as_str() == Some(wanted))),
            _ => false,
        }
    }

    /// `in`/`not_in` with a non-list value can never match
    pub fn is_malformed(&self) -> bool {
        matches!(self.operator, ConditionOperator::In | ConditionOperator::NotIn)
            && !self.value.is_array()
    }
}

/// A side effect requested by a matched rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Key into the host's handler registry (e.g. `send_email`)
    #[serde(rename = "type")]
    pub action_type: String,
    /// Payload handed to the handler
    #[serde(default)]
    pub data: Document,
}

impl Action {
    pub fn new(action_type: &str, data: Document) -> Self {
        Self {
            action_type: action_type.to_string(),
            data,
        }
    }

    pub fn create_invoice(data: Document) -> Self {
        Self::new("create_invoice", data)
    }

    pub fn send_email(to: &str, subject: &str, body: &str) -> Self {
        Self::new(
            "send_email",
            serde_json::json!({
                "to": to,
                "subject": subject,
                "body": body
            }),
        )
    }

    pub fn send_reminder(urgency: &str, message: &str) -> Self {
        Self::new(
            "send_reminder",
            serde_json::json!({
                "urgency": urgency,
                "message": message
            }),
        )
    }

    pub fn create_job(data: Document) -> Self {
        Self::new("create_job", data)
    }

    pub fn update_status(status: &str) -> Self {
        Self::new("update_status", serde_json::json!({ "status": status }))
    }
}

fn default_active() -> bool {
    true
}

/// A prioritized (conditions → actions) automation entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Lower values are evaluated and executed first
    #[serde(default)]
    pub priority: i32,
}

impl Rule {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: None,
            conditions: Vec::new(),
            actions: Vec::new(),
            is_active: true,
            priority: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn applies_to(&self, entity_type: EntityType) -> bool {
        self.conditions
            .iter()
            .any(|c| c.references_entity_type(entity_type))
    }

    /// Merge a patch into this rule. The id never changes.
    pub fn apply(&mut self, patch: RulePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(conditions) = patch.conditions {
            self.conditions = conditions;
        }
        if let Some(actions) = patch.actions {
            self.actions = actions;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
    }
}

/// Partial rule update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulePatch {
    pub name: Option<String>,
    /// `Some(None)` clears the description; in JSON an explicit `null` does
    /// the same while an absent key leaves it untouched
    #[serde(
        default,
        deserialize_with = "present_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    pub conditions: Option<Vec<Condition>>,
    pub actions: Option<Vec<Action>>,
    pub is_active: Option<bool>,
    pub priority: Option<i32>,
}

/// A key that is present (even as `null`) becomes `Some`
fn present_field<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl RulePatch {
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = Some(conditions);
        self
    }

    pub fn actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Selection criteria for listing rules
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleFilter {
    pub active: Option<bool>,
    pub entity_type: Option<EntityType>,
    /// Case-insensitive substring of the rule name
    pub name_contains: Option<String>,
}

impl RuleFilter {
    pub fn matches(&self, rule: &Rule) -> bool {
        if let Some(active) = self.active {
            if rule.is_active != active {
                return false;
            }
        }
        if let Some(entity_type) = self.entity_type {
            if !rule.applies_to(entity_type) {
                return false;
            }
        }
        if let Some(needle) = &self.name_contains {
            if !rule.name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

// Execution reports

/// Why an action did not complete
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionError {
    #[error("no handler registered for action type '{action_type}'")]
    UnknownActionType { action_type: String },
    #[error("action handler failed: {message}")]
    Handler { message: String },
    #[error("action handler did not finish within {after_ms}ms")]
    Timeout { after_ms: u64 },
    #[error("action handler panicked: {message}")]
    Panicked { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub action_type: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
    pub duration_ms: i64,
}

impl ActionResult {
    pub fn success(action_type: &str, duration_ms: i64) -> Self {
        Self {
            action_type: action_type.to_string(),
            ok: true,
            error: None,
            duration_ms,
        }
    }

    pub fn failure(action_type: &str, error: ActionError, duration_ms: i64) -> Self {
        Self {
            action_type: action_type.to_string(),
            ok: false,
            error: Some(error),
            duration_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleExecution {
    pub rule_id: String,
    pub rule_name: String,
    pub matched: bool,
    #[serde(default)]
    pub action_results: Vec<ActionResult>,
}

/// Per-dispatch record of which rules matched and how their actions went
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub report_id: Uuid,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub event: TriggerEvent,
    pub started_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub rules: Vec<RuleExecution>,
}

impl ExecutionReport {
    pub fn new(trigger: &Trigger) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            entity_type: trigger.entity_type,
            entity_id: trigger.entity_id.clone(),
            event: trigger.event,
            started_at: Utc::now(),
            duration_ms: 0,
            rules: Vec::new(),
        }
    }

    pub fn matched_rules(&self) -> impl Iterator<Item = &RuleExecution> {
        self.rules.iter().filter(|r| r.matched)
    }

    /// All action results across matched rules, in execution order
    pub fn action_results(&self) -> impl Iterator<Item = &ActionResult> {
        self.rules.iter().flat_map(|r| r.action_results.iter())
    }

    pub fn actions_executed(&self) -> usize {
        self.action_results().count()
    }

    pub fn actions_failed(&self) -> usize {
        self.action_results().filter(|a| !a.ok).count()
    }

    pub fn errors(&self) -> Vec<&ActionError> {
        self.action_results()
            .filter_map(|a| a.error.as_ref())
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.actions_failed() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_type_round_trips_through_str() {
        for entity in [EntityType::Transaction, EntityType::Job, EntityType::Quote] {
            assert_eq!(entity.as_str().parse::<EntityType>().unwrap(), entity);
        }
        assert_eq!(
            "ticket".parse::<EntityType>(),
            Err(ParseModelError::EntityType("ticket".to_string()))
        );
    }

    #[test]
    fn test_transaction_created_uses_numeric_amount() {
        let trigger = Trigger::transaction_created("tx-1", Decimal::new(150050, 2), "CREDIT");

        assert_eq!(trigger.entity_type, EntityType::Transaction);
        assert_eq!(trigger.event, TriggerEvent::Created);
        assert_eq!(trigger.data["amount"], json!(1500.5));
        assert_eq!(trigger.data["type"], "CREDIT");
    }

    #[test]
    fn test_evaluation_document_injects_metadata() {
        let trigger = Trigger::new(
            EntityType::Job,
            "job-7",
            TriggerEvent::Updated,
            json!({"status": "IN_PROGRESS", "event": "spoofed"}),
        );

        let doc = trigger.evaluation_document();
        assert_eq!(doc["entityType"], "job");
        assert_eq!(doc["entityId"], "job-7");
        assert_eq!(doc["event"], "updated");
        assert_eq!(doc["status"], "IN_PROGRESS");
    }

    #[test]
    fn test_evaluation_document_for_scalar_data() {
        let trigger = Trigger::new(EntityType::Client, "c-1", TriggerEvent::Created, json!(42));
        let doc = trigger.evaluation_document();

        assert_eq!(doc.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_references_entity_type() {
        assert!(Condition::entity_type(EntityType::Job).references_entity_type(EntityType::Job));
        assert!(!Condition::entity_type(EntityType::Job).references_entity_type(EntityType::Client));

        let any_billing = Condition::in_list("entityType", vec![json!("invoice"), json!("payment")]);
        assert!(any_billing.references_entity_type(EntityType::Payment));
        assert!(!any_billing.references_entity_type(EntityType::Job));

        let excluded = Condition::not_in_list("entityType", vec![json!("job")]);
        assert!(!excluded.references_entity_type(EntityType::Job));
    }

    #[test]
    fn test_rule_patch_preserves_id() {
        let mut rule = Rule::new("Original").with_id("r-1").with_priority(5);
        rule.apply(RulePatch::default().name("Renamed").active(false));

        assert_eq!(rule.id, "r-1");
        assert_eq!(rule.name, "Renamed");
        assert_eq!(rule.priority, 5);
        assert!(!rule.is_active);
    }

    #[test]
    fn test_rule_patch_json_null_clears_description() {
        let mut rule = Rule::new("Described").with_description("old");

        let untouched: RulePatch = serde_json::from_value(json!({"name": "Kept"})).unwrap();
        assert_eq!(untouched.description, None);
        rule.apply(untouched);
        assert_eq!(rule.description.as_deref(), Some("old"));

        let cleared: RulePatch = serde_json::from_value(json!({"description": null})).unwrap();
        assert_eq!(cleared.description, Some(None));
        rule.apply(cleared);
        assert_eq!(rule.description, None);

        let set: RulePatch = serde_json::from_value(json!({"description": "new"})).unwrap();
        assert_eq!(set.description, Some(Some("new".to_string())));
    }

    #[test]
    fn test_rule_deserializes_with_defaults() {
        let rule: Rule = serde_json::from_value(json!({
            "id": "auto-invoice",
            "name": "Auto invoice",
            "conditions": [
                {"field": "entityType", "operator": "equals", "value": "transaction"},
                {"field": "amount", "operator": "greater_than", "value": 1000}
            ],
            "actions": [{"type": "create_invoice", "data": {"source": "auto"}}]
        }))
        .unwrap();

        assert!(rule.is_active);
        assert_eq!(rule.priority, 0);
        assert_eq!(rule.conditions[1].operator, ConditionOperator::GreaterThan);
        assert_eq!(rule.actions[0].action_type, "create_invoice");
        assert!(rule.applies_to(EntityType::Transaction));
    }

    #[test]
    fn test_rule_filter() {
        let rule = Rule::new("Overdue Job Reminder")
            .with_condition(Condition::entity_type(EntityType::Job));

        assert!(RuleFilter::default().matches(&rule));
        assert!(RuleFilter { name_contains: Some("overdue".into()), ..Default::default() }.matches(&rule));
        assert!(!RuleFilter { active: Some(false), ..Default::default() }.matches(&rule));
        assert!(!RuleFilter { entity_type: Some(EntityType::Invoice), ..Default::default() }.matches(&rule));
    }

    #[test]
    fn test_report_counters() {
        let trigger = Trigger::client_created("c-1", "Acme", "ops@acme.test");
        let mut report = ExecutionReport::new(&trigger);
        report.rules.push(RuleExecution {
            rule_id: "a".into(),
            rule_name: "A".into(),
            matched: true,
            action_results: vec![
                ActionResult::success("send_email", 3),
                ActionResult::failure(
                    "create_job",
                    ActionError::Handler { message: "db down".into() },
                    1,
                ),
            ],
        });
        report.rules.push(RuleExecution {
            rule_id: "b".into(),
            rule_name: "B".into(),
            matched: false,
            action_results: Vec::new(),
        });

        assert_eq!(report.matched_rules().count(), 1);
        assert_eq!(report.actions_executed(), 2);
        assert_eq!(report.actions_failed(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_action_error_serializes_with_kind_tag() {
        let err = ActionError::UnknownActionType { action_type: "fax".into() };
        let value = serde_json::to_value(&err).unwrap();

        assert_eq!(value, json!({"kind": "unknown_action_type", "action_type": "fax"}));
        assert_eq!(err.to_string(), "no handler registered for action type 'fax'");
    }
}
