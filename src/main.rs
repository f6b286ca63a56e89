use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use laurel::adapters::{LogDispatcher, MatchFactSource, NotificationDispatcher, PostgresStore, PushDispatcher, WarehouseStore};
use laurel::cli::{Cli, Commands};
use laurel::config::{AppConfig, LoggingConfig};
use laurel::error::LaurelError;
use laurel::ranking::GroupSelection;
use laurel::services::{EngineSettings, FactCollector, NotificationFanout, RankingEngine, Selection};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config))?;
    init_logging(&config.logging);
    config.validate().map_err(LaurelError::InvalidConfig)?;

    let store = Arc::new(
        PostgresStore::new(&config.database.url, config.database.max_connections)
            .await
            .context("failed to connect to the operational store")?,
    );

    match cli.command {
        Commands::Migrate => {
            store.migrate().await?;
            info!("Migrations applied");
        }
        Commands::Run { window } => {
            let window = window.resolve(Utc::now().date_naive())?;
            let engine = build_engine(&config, store).await?;
            let summary = engine.run(&window).await?;
            println!(
                "{}: team created: {}, winners created: {}, notifications sent: {}",
                summary.period_key,
                summary.composite_team_created(),
                summary.winners_created,
                summary.notifications_sent
            );
        }
        Commands::Preview { window } => {
            let window = window.resolve(Utc::now().date_naive())?;
            let engine = build_engine(&config, store).await?;
            let selection = engine.compute(&window).await?;
            print_selection(&selection)?;
        }
    }

    Ok(())
}

async fn build_engine(config: &AppConfig, store: Arc<PostgresStore>) -> anyhow::Result<RankingEngine> {
    let mut sources: Vec<Arc<dyn MatchFactSource>> = vec![store.clone()];
    if let Some(warehouse) = &config.warehouse {
        let warehouse = WarehouseStore::new(&warehouse.url, warehouse.max_connections)
            .await
            .context("failed to connect to the warehouse")?;
        sources.push(Arc::new(warehouse));
    }
    let collector = FactCollector::new(sources, Duration::from_secs(config.sources.query_timeout_secs));

    let dispatcher: Arc<dyn NotificationDispatcher> = match &config.notifications.webhook_url {
        Some(url) => Arc::new(PushDispatcher::new(url.clone(), config.notifications.request_timeout_ms)?),
        None => {
            warn!("No push gateway configured, notifications will only be logged");
            Arc::new(LogDispatcher)
        }
    };

    let fanout = NotificationFanout::new(
        store.clone(),
        store.clone(),
        dispatcher,
        config.notifications.daily_cap,
        config.notifications.max_concurrent,
    );

    Ok(RankingEngine::new(
        collector,
        store.clone(),
        store,
        fanout,
        EngineSettings::from(config),
    ))
}

fn print_selection(selection: &Selection) -> anyhow::Result<()> {
    println!(
        "Window {} ({} facts, {} skipped)",
        selection.window,
        selection.facts_collected,
        selection.aggregation.skipped.len()
    );

    for team in &selection.teams {
        match team {
            GroupSelection::Selected(team) => {
                println!("\nTeam of the period, {}:", team.group);
                println!("{}", serde_json::to_string_pretty(&team.members)?);
            }
            GroupSelection::Quiet { group, candidates } => {
                println!("\n{group}: quiet period ({candidates} candidates)");
            }
        }
    }

    println!("\nStars of the match:");
    for w in &selection.winners {
        println!(
            "  {} -> {} ({:.1}, {} votes)",
            w.match_id, w.winner.nominee.player_id, w.winner.value, w.winner.nominee.votes
        );
    }
    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},laurel=debug,sqlx=warn", logging.level)));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}
