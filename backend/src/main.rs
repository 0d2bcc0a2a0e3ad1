use std::sync::Arc;
use tally_backend::workflows::{LoggingHandler, WorkflowEngine, presets};
use tally_backend::Config;
use tally_shared::Trigger;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let engine = WorkflowEngine::new(config.engine());
    let rules = config.initial_rules()?;
    engine.add_rules(rules)?;

    for action_type in presets::PRESET_ACTION_TYPES {
        engine.register_action_handler(action_type, Arc::new(LoggingHandler))?;
    }

    info!(
        rules_path = ?config.rules_path,
        timeout = ?config.action_timeout,
        "Automation engine ready, reading triggers from stdin"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let trigger: Trigger = match serde_json::from_str(&line) {
            Ok(trigger) => trigger,
            Err(e) => {
                warn!(error = %e, "Skipping malformed trigger");
                continue;
            }
        };

        let report = engine.process_trigger(&trigger).await?;
        let mut out = serde_json::to_vec(&report)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }

    info!("Input closed, shutting down");
    Ok(())
}
