pub mod config;
pub mod error;
pub mod workflows;

pub use config::Config;
pub use error::{AutomationError, AutomationResult};
pub use workflows::{EngineConfig, WorkflowEngine};
