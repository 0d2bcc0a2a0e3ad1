use anyhow::Context;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tally_shared::Rule;

use crate::workflows::{EngineConfig, presets};

#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum wait per action invocation; `None` waits indefinitely
    pub action_timeout: Option<Duration>,
    /// Render `{{path}}` placeholders in action payloads
    pub render_templates: bool,
    /// JSON file with the rule set to load at startup
    pub rules_path: Option<PathBuf>,
    /// tracing-subscriber filter directive
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let action_timeout = match env::var("AUTOMATION_ACTION_TIMEOUT_MS") {
            Ok(raw) => {
                let millis: u64 = raw.trim().parse().map_err(|e| {
                    anyhow::anyhow!("AUTOMATION_ACTION_TIMEOUT_MS must be a number of milliseconds: {}", e)
                })?;
                (millis > 0).then(|| Duration::from_millis(millis))
            }
            Err(_) => None,
        };

        let render_templates = match env::var("AUTOMATION_RENDER_TEMPLATES") {
            Ok(raw) => parse_flag(&raw).ok_or_else(|| {
                anyhow::anyhow!("AUTOMATION_RENDER_TEMPLATES must be true or false, got '{}'", raw)
            })?,
            Err(_) => true,
        };

        Ok(Config {
            action_timeout,
            render_templates,
            rules_path: env::var("AUTOMATION_RULES_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            log_filter: env::var("AUTOMATION_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            action_timeout: self.action_timeout,
            render_templates: self.render_templates,
        }
    }

    /// Rules to seed the engine with: the configured rules file, or the presets
    pub fn initial_rules(&self) -> anyhow::Result<Vec<Rule>> {
        match &self.rules_path {
            Some(path) => load_rules(path),
            None => Ok(presets::defaults()),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a JSON array of rules
pub fn load_rules(path: &Path) -> anyhow::Result<Vec<Rule>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read rules file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid rules in {}", path.display()))
}
