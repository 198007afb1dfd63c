//! Interactive intake console.
//!
//! Loads configuration, installs logging, wires the configured capabilities
//! against in-memory stores and the YAML strategy directory, then runs one
//! session over stdin. Usage: `care-intake [strategy-id]`.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use care_intake::adapters::storage::YamlStrategyRepository;
use care_intake::application::{Capabilities, EngineDeps, ProcessTurnCommand, SessionOrchestrator, StartSessionCommand};
use care_intake::config::{AppConfig, LoggingConfig};
use care_intake::domain::foundation::{SessionType, StrategyId, SubjectId};
use care_intake::ports::StrategyRepository;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);
    config.validate()?;

    let strategies: Arc<dyn StrategyRepository> = Arc::new(YamlStrategyRepository::new(&config.strategies.directory));
    let strategy_id = match std::env::args().nth(1) {
        Some(id) => StrategyId::new(id)?,
        None => strategies
            .list_ids()
            .await?
            .into_iter()
            .next()
            .ok_or("no strategies found in the strategy directory")?,
    };

    let capabilities = Capabilities::from_config(&config.ai)?;
    tracing::info!(mode = ?config.ai.mode, strategy_id = %strategy_id, "Starting intake console");

    let engine = Arc::new(SessionOrchestrator::new(EngineDeps::in_memory(strategies, capabilities), &config)?);

    let sweeper = {
        let engine = engine.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                if let Err(err) = engine.expire_idle_sessions().await {
                    tracing::warn!(error = %err, "Idle sweep failed");
                }
            }
        })
    };

    let started = engine
        .start_session(StartSessionCommand::new(
            strategy_id,
            SubjectId::new("console")?,
            SessionType::Screening,
        ))
        .await?;
    let session_id = *started.session.id();
    println!("assistant> {}", started.opening_message.content());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let outcome = engine.process_turn(ProcessTurnCommand::new(session_id, line)).await?;
        println!("assistant> {}", outcome.assistant_message.content());
        if let Some(assessment) = &outcome.assessment {
            println!("assessment> {}", assessment.summary);
        }
        if !outcome.session.status().accepts_turns() {
            println!("(session {})", outcome.session.status());
            break;
        }
    }

    engine.end_session(session_id, None).await?;
    sweeper.abort();
    let _ = sweeper.await;
    if let Ok(engine) = Arc::try_unwrap(engine) {
        engine.shutdown().await;
    }
    Ok(())
}
