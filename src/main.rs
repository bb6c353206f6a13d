use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use casedesk::cli::{AdminCommand, Cli, Command, run_admin};
use casedesk::config::Config;
use casedesk::db;
use casedesk::settings::Settings;
use casedesk::web::{AppState, Templates, start_server};

const DEFAULT_LOG_FILTER: &str = "casedesk=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    let config = Config::resolve(&settings).context("resolving configuration")?;
    init_tracing(config.logging.json);

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => serve(config, bind).await,
        Command::Migrate => {
            db::connect_from_config(&config.database)
                .await
                .context("migrating database")?;
            tracing::info!("Migrations applied");
            Ok(())
        }
        Command::Admin(command) => admin(config, command).await,
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    // Logs go to stderr so admin commands keep stdout for their JSON.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn admin(config: Config, command: AdminCommand) -> anyhow::Result<()> {
    let db = db::connect_from_config(&config.database)
        .await
        .context("opening database")?;
    let output = run_admin(db.as_ref(), command).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("encoding output")?
    );
    Ok(())
}

async fn serve(config: Config, bind: Option<SocketAddr>) -> anyhow::Result<()> {
    let db = db::connect_from_config(&config.database)
        .await
        .context("opening database")?;
    let templates = Templates::new().context("compiling templates")?;
    let state = Arc::new(AppState::new(db, templates));

    let addr = bind.unwrap_or(config.server.bind);
    let bound = start_server(addr, Arc::clone(&state), config.server.body_limit).await?;
    tracing::info!(addr = %bound, "casedesk ready");

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    tracing::info!("Shutdown requested");
    state.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}
