//! # growhubd: growhub daemon
//!
//! Composition root that wires all adapters together, runs the rule engine
//! loop and serves the HTTP API.
//!
//! ## Responsibilities
//! - Parse configuration (`growhub.toml`, env vars)
//! - Initialize logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations and the virtual grow tent
//! - Construct the rule service and the rule engine, injecting adapters via port traits
//! - Spawn the scheduler loop and serve the axum router
//! - Handle graceful shutdown (SIGINT): stop accepting requests, let the
//!   in-flight tick finish, then exit
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use growhub_adapter_http_axum::state::AppState;
use growhub_adapter_storage_sqlite_sqlx::{SqliteRuleRepository, SqliteTriggerHistory};
use growhub_adapter_virtual::{VirtualActuators, VirtualSensors};
use growhub_app::clock::SystemClock;
use growhub_app::rule_engine::{EngineSettings, RuleEngine};
use growhub_app::scheduler::Scheduler;
use growhub_app::services::rule_service::RuleService;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Database
    let mut db_config = growhub_adapter_storage_sqlite_sqlx::Config::new(config.database_url());
    db_config.max_connections = config.database.max_connections;
    let db = db_config.build().await?;
    let pool = db.pool().clone();

    // Repositories
    let rule_repo = Arc::new(SqliteRuleRepository::new(pool.clone()));
    let history = Arc::new(SqliteTriggerHistory::new(pool));

    // Virtual grow tent
    let sensors = VirtualSensors::new(config.virtual_tent.readings.clone());
    let actuators = if config.virtual_tent.devices.is_empty() {
        VirtualActuators::default()
    } else {
        VirtualActuators::with_devices(config.virtual_tent.devices.iter().cloned())
    };

    // Engine
    let engine = Arc::new(RuleEngine::new(
        Arc::clone(&rule_repo),
        Arc::clone(&history),
        sensors,
        actuators,
        SystemClock::new(config.utc_offset()?),
        EngineSettings {
            dispatch_timeout: config.dispatch_timeout(),
        },
    ));

    let shutdown = CancellationToken::new();
    let scheduler = Scheduler::new(Arc::clone(&engine), config.tick_period());
    let scheduler_task = tokio::spawn(scheduler.run(shutdown.clone()));

    // HTTP
    let state = AppState::from_arcs(Arc::new(RuleService::new(rule_repo)), history, engine);
    let app = growhub_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        %bind_addr,
        tick_secs = config.engine.tick_secs,
        utc_offset = %config.engine.utc_offset,
        "growhubd listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    scheduler_task.await?;
    tracing::info!("growhubd stopped");

    Ok(())
}

async fn shutdown_signal(token: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                tracing::error!(error = %err, "failed to listen for shutdown signal");
            }
            tracing::info!("shutdown requested");
        }
        () = token.cancelled() => {}
    }
    token.cancel();
}
