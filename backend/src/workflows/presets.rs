// Workflow Presets - Stock automations for common bookkeeping flows

use serde_json::json;
use tally_shared::{Action, Condition, EntityType, Rule, TriggerEvent};

use super::conditions::NOW_LITERAL;

/// Credits over 1000 get an invoice drafted automatically
pub fn auto_invoice_large_transactions() -> Rule {
    Rule::new("Auto-invoice large transactions")
        .with_id("auto_invoice_large_transactions")
        .with_description("Create an invoice for credit transactions above 1000")
        .with_priority(10)
        .with_condition(Condition::entity_type(EntityType::Transaction))
        .with_condition(Condition::greater_than("amount", 1000.0))
        .with_condition(Condition::equals("type", json!("CREDIT")))
        .with_action(Action::create_invoice(json!({
            "transactionId": "{{entityId}}",
            "amount": "{{amount}}",
            "status": "DRAFT"
        })))
}

/// Open jobs whose due date has passed trigger a high-urgency reminder
pub fn overdue_job_reminder() -> Rule {
    Rule::new("Overdue job reminder")
        .with_id("overdue_job_reminder")
        .with_description("Remind about scheduled or in-progress jobs past their due date")
        .with_priority(20)
        .with_condition(Condition::entity_type(EntityType::Job))
        .with_condition(Condition::in_list(
            "status",
            vec![json!("IN_PROGRESS"), json!("SCHEDULED")],
        ))
        .with_condition(Condition::date_before("dueDate", NOW_LITERAL))
        .with_action(Action::send_reminder(
            "high",
            "Job {{entityId}} was due on {{dueDate}}",
        ))
}

pub fn follow_up_completed_job() -> Rule {
    Rule::new("Follow up completed job")
        .with_id("follow_up_completed_job")
        .with_description("Schedule a follow-up visit once a job is completed")
        .with_priority(30)
        .with_condition(Condition::entity_type(EntityType::Job))
        .with_condition(Condition::event(TriggerEvent::Completed))
        .with_action(Action::create_job(json!({
            "title": "Follow-up for job {{entityId}}",
            "clientId": "{{clientId}}",
            "status": "SCHEDULED"
        })))
}

pub fn welcome_new_client() -> Rule {
    Rule::new("Welcome new client")
        .with_id("welcome_new_client")
        .with_priority(40)
        .with_condition(Condition::entity_type(EntityType::Client))
        .with_condition(Condition::event(TriggerEvent::Created))
        .with_action(Action::send_email(
            "{{email}}",
            "Welcome aboard",
            "Hi {{name}}, thanks for choosing us.",
        ))
}

pub fn overdue_invoice_status() -> Rule {
    Rule::new("Mark overdue invoices")
        .with_id("overdue_invoice_status")
        .with_priority(50)
        .with_condition(Condition::entity_type(EntityType::Invoice))
        .with_condition(Condition::event(TriggerEvent::Overdue))
        .with_action(Action::update_status("OVERDUE"))
}

/// Every preset, in priority order
pub fn defaults() -> Vec<Rule> {
    vec![
        auto_invoice_large_transactions(),
        overdue_job_reminder(),
        follow_up_completed_job(),
        welcome_new_client(),
        overdue_invoice_status(),
    ]
}

/// Action types referenced by the presets
pub const PRESET_ACTION_TYPES: [&str; 5] = [
    "create_invoice",
    "send_reminder",
    "create_job",
    "send_email",
    "update_status",
];
