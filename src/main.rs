use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use dotenvy::dotenv;

use donationtracker::config::Config;
use donationtracker::db::{db_conn, run_migrations};
use donationtracker::handler::BoardHandler;
use serenity::prelude::*;

use donationtracker::subsystems::{BoardUpdates, PendingDeletes, Subsystem, Tracker, TrackerState};
use donationtracker::commands::tracker_framework;
use donationtracker::error::{TrackerError, Result};

const DEFAULT_LOG_FILTER: &str = "info,serenity=warn,poise=warn,hyper=warn,reqwest=warn,rustls=warn";

#[tokio::main]
async fn main() -> Result<()> {

    dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Running pending migrations");
    {
        let conn = &mut db_conn()?;
        run_migrations(conn)?;
    }
    info!("Done");

    let config = Config::from_env()?;
    let bot_token = config.bot_token.clone();
    let state = Arc::new(TrackerState::new(config)?);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    info!("Building poise framework");
    let framework = tracker_framework(state.clone());
    info!("Done");

    info!("Building serenity client");
    let builder = Client::builder(&bot_token, intents)
        .framework(framework)
        .event_handler(BoardHandler)
        .type_map_insert::<Tracker>(state);
    let builder = BoardUpdates::install(builder);
    let builder = PendingDeletes::install(builder);
    let mut client = builder.await?;
    info!("Done");

    info!("Now starting the donation tracker!");
    client.start()
        .await
        .map_err(TrackerError::from)
}
