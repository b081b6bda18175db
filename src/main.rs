//! Vitals View CLI
//!
//! Read-only weekly step and heart-rate summary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vitals_view::{
    config::{Config, ValidatedConfig},
    core::{CycleOutcome, Presenter, QueryAdapter},
    render::TextView,
    store::{HealthStore, NoopStore, SimulatedBehavior, SimulatedStore},
    ACCESS_DECLARATION, VERSION,
};

#[derive(Parser)]
#[command(name = "vitals-view")]
#[command(version = VERSION)]
#[command(about = "Read-only weekly step and heart-rate summary", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Request access, fetch the week's data once and display it
    Show {
        /// Answer the permission prompt with "don't allow"
        #[arg(long)]
        deny: bool,

        /// Behave as a device without a health-data service
        #[arg(long)]
        unavailable: bool,

        /// Print the display state as JSON instead of the chart
        #[arg(long)]
        json: bool,
    },

    /// Show configuration
    Config {
        /// Write the current configuration to the config file
        #[arg(long)]
        init: bool,
    },

    /// Display what the app reads and what it never does
    Permissions,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Show {
            deny,
            unavailable,
            json,
        } => cmd_show(deny, unavailable, json).await,
        Commands::Config { init } => cmd_config(init),
        Commands::Permissions => {
            println!("{ACCESS_DECLARATION}");
            Ok(())
        }
    }
}

fn load_config() -> Result<(Config, ValidatedConfig)> {
    let config = Config::load()
        .with_context(|| format!("loading {}", Config::config_path().display()))?;
    let validated = config.validate().context("invalid configuration")?;
    Ok((config, validated))
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn cmd_show(deny: bool, unavailable: bool, json: bool) -> Result<()> {
    let (config, validated) = load_config()?;
    init_tracing(&config.log_filter);

    let store: Arc<dyn HealthStore> = if unavailable {
        Arc::new(NoopStore::new())
    } else {
        let behavior = SimulatedBehavior {
            grant_authorization: !deny,
            ..SimulatedBehavior::default()
        };
        Arc::new(SimulatedStore::demo(
            chrono::Utc::now(),
            validated.timezone,
            behavior,
        ))
    };

    let adapter = QueryAdapter::new(store, &validated);
    let mut presenter = Presenter::new(adapter, &validated);

    let outcome = if json {
        let outcome = presenter.refresh().await;
        println!("{}", serde_json::to_string_pretty(presenter.state())?);
        outcome
    } else {
        presenter.present(&mut TextView::stdout()).await
    };

    tracing::debug!(?outcome, "fetch cycle finished");
    if outcome == CycleOutcome::NotAuthorized {
        tracing::info!("run `vitals-view permissions` to see what is requested");
    }
    Ok(())
}

fn cmd_config(init: bool) -> Result<()> {
    let (config, validated) = load_config()?;

    if init {
        config
            .save()
            .with_context(|| format!("writing {}", Config::config_path().display()))?;
        println!("Wrote {}", Config::config_path().display());
        return Ok(());
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    println!();
    println!("Effective timezone: {}", validated.timezone);
    Ok(())
}
