//! Error handling for the automation engine
//!
//! Only configuration-surface operations (rule mutation) and engine-level
//! misconfiguration fail with these errors. Anything that goes wrong while
//! evaluating or executing a specific rule is recorded in the
//! `ExecutionReport` instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("Rule '{0}' already exists")]
    DuplicateRuleId(String),

    #[error("Rule '{0}' not found")]
    RuleNotFound(String),

    /// The rule store or handler registry cannot be used (poisoned lock)
    #[error("Automation engine unavailable: {0}")]
    EngineUnavailable(String),
}

impl AutomationError {
    /// Stable error code for logs and host-side mapping
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateRuleId(_) => "DUPLICATE_RULE_ID",
            Self::RuleNotFound(_) => "RULE_NOT_FOUND",
            Self::EngineUnavailable(_) => "ENGINE_UNAVAILABLE",
        }
    }

    pub fn unavailable(component: &str) -> Self {
        tracing::error!("{} lock poisoned", component);
        Self::EngineUnavailable(format!("{} lock poisoned", component))
    }
}

pub type AutomationResult<T> = Result<T, AutomationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AutomationError::DuplicateRuleId("r1".into()).error_code(),
            "DUPLICATE_RULE_ID"
        );
        assert_eq!(
            AutomationError::RuleNotFound("r1".into()).error_code(),
            "RULE_NOT_FOUND"
        );
        assert_eq!(
            AutomationError::unavailable("rule store").error_code(),
            "ENGINE_UNAVAILABLE"
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            AutomationError::RuleNotFound("overdue-reminder".into()).to_string(),
            "Rule 'overdue-reminder' not found"
        );
    }
}
