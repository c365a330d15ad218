use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::prelude::*;

use remeslo::cli::{Cli, Commands};
use remeslo::core::{config, init_logger};
use remeslo::game::Engine;
use remeslo::storage::{catalog, create_pool, get_connection, inventory, progress};
use remeslo::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Set up global panic handler to catch panics in dispatcher
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    // Load environment variables from .env if present
    let _ = dotenv();

    match cli.command {
        Some(Commands::Run) | None => run_bot().await,
        Some(Commands::Seed) => run_seed(),
        Some(Commands::Progress { player_id, json }) => run_progress(player_id, json),
    }
}

/// Seed the shop catalog and exit
fn run_seed() -> Result<()> {
    let pool = create_pool(&config::DATABASE_PATH)?;
    let conn = get_connection(&pool)?;
    let inserted = catalog::seed(&conn)?;
    log::info!("Catalog seeded: {} new items", inserted);
    Ok(())
}

#[derive(serde::Serialize)]
struct ProgressReport {
    player_id: i64,
    stage: String,
    balance: i64,
    is_completed: bool,
    completed_stages: Vec<String>,
    inventory: Vec<String>,
}

/// Print a player's tutorial progress to stdout
fn run_progress(player_id: i64, json: bool) -> Result<()> {
    let pool = create_pool(&config::DATABASE_PATH)?;
    let conn = get_connection(&pool)?;

    let Some(record) = progress::get(&conn, player_id)? else {
        println!("Player {player_id}: no tutorial progress");
        return Ok(());
    };
    let report = ProgressReport {
        player_id,
        stage: record.current_stage,
        balance: record.balance,
        is_completed: record.is_completed,
        completed_stages: record.completed_stages,
        inventory: inventory::names(&conn, player_id)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Player {player_id}");
        println!("  stage:     {}", report.stage);
        println!("  balance:   {} coins", report.balance);
        println!("  completed: {}", report.is_completed);
        for name in &report.inventory {
            println!("  item:      {name}");
        }
    }
    Ok(())
}

/// Run the bot in long polling mode
async fn run_bot() -> Result<()> {
    log::info!("Starting remeslo bot...");

    let pool = create_pool(&config::DATABASE_PATH)?;
    {
        let conn = get_connection(&pool)?;
        let inserted = catalog::seed(&conn)?;
        if inserted > 0 {
            log::info!("Catalog seeded: {} new items", inserted);
        }
    }

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set up bot commands: {}", e);
    }

    let engine = Arc::new(Engine::new(pool.clone()));
    let deps = HandlerDeps::new(pool, engine);
    let handler = schema(deps);

    log::info!("Starting bot in long polling mode");

    // Polling listener that drops pending updates on start
    use teloxide::update_listeners::Polling;
    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

    Dispatcher::builder(bot, handler)
        .dependencies(DependencyMap::new())
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
