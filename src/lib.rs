pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod domain;
pub mod models;
pub mod parser;
pub mod services;
pub mod state;

use clap::{CommandFactory, Parser};
use cli::{Cli, Commands, cmd_browse_feed, cmd_search_releases};
pub use config::Config;
use state::SharedState;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.log_format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    init_logging(&config);

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists.");
            }
            Ok(())
        }

        Commands::Search {
            media_id,
            episode,
            batch,
            ignore_quality,
        } => {
            let state = SharedState::new(config)?;
            info!(media_id, episode, "Resolving releases");
            cmd_search_releases(&state, media_id, episode, batch, ignore_quality).await
        }

        Commands::Feed {
            source,
            page,
            per_page,
        } => {
            let state = SharedState::new(config)?;
            cmd_browse_feed(&state, &source, page, per_page).await
        }
    }
}
