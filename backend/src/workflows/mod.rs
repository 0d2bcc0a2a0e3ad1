// Workflow Automation Engine
//
// Rule-based automation for the Tally bookkeeping backend. Triggers describe
// what happened to an entity, rules decide whether to react, and registered
// handlers perform the side effects.

pub mod actions;
pub mod conditions;
pub mod dispatcher;
pub mod engine;
pub mod executor;
pub mod presets;
pub mod store;

pub use actions::{ActionHandler, ExecutionContext, FnHandler, HandlerRegistry, LoggingHandler, handler_fn};
pub use conditions::{ConditionEvaluator, resolve_field};
pub use dispatcher::TriggerDispatcher;
pub use engine::{EngineConfig, WorkflowEngine};
pub use executor::{ActionExecutor, process_templates};
pub use store::RuleStore;
