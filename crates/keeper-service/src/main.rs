//! The limit-keeper binary.
//!
//! Assembles the engine over the on-chain AMM backend and runs the keeper
//! poll loop: periodically scan for an executable order and trigger its
//! execution as the configured keeper principal.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use keeper_amm::implementations::uniswap::{UniswapAmm, UniswapConfig};
use keeper_config::ConfigLoader;
use keeper_core::Engine;

mod service;

#[derive(Parser)]
#[command(name = "limit-keeper")]
#[command(about = "Conditional-order keeper engine", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Path to configuration file
	#[arg(short, long, value_name = "FILE", default_value = "config/keeper.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(long, env = "KEEPER_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Start the keeper service
	Start,
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level);

	match cli.command {
		Some(Commands::Start) | None => start_service(cli).await,
		Some(Commands::Validate) => validate_config(cli).await,
	}
}

fn setup_tracing(level: &str) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
	tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn start_service(cli: Cli) -> Result<()> {
	info!("starting limit-keeper");
	info!(config = %cli.config.display(), "loading configuration");

	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("failed to load configuration")?;

	let amm = Arc::new(
		UniswapAmm::connect(UniswapConfig {
			rpc_url: config.chain.rpc_url.clone(),
			private_key: config.chain.private_key.clone(),
			quoter: config.chain.quoter,
			router: config.chain.router,
		})
		.await
		.context("failed to connect to the AMM backend")?,
	);
	info!(custody = %amm.custody(), keeper = %config.engine.keeper, "connected");

	let engine = Engine::builder()
		.keeper(config.engine.keeper)
		.deadline_margin(config.engine.deadline_margin_secs)
		.oracle(amm.clone())
		.swap_executor(amm.clone())
		.ledger(amm)
		.build()
		.context("failed to assemble engine")?;

	let keeper_service = service::KeeperService::new(
		engine,
		config.engine.keeper,
		Duration::from_millis(config.service.poll_interval_ms),
	);
	keeper_service.run().await;

	info!("limit-keeper stopped");
	Ok(())
}

async fn validate_config(cli: Cli) -> Result<()> {
	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("configuration invalid")?;

	info!(
		keeper = %config.engine.keeper,
		rpc_url = %config.chain.rpc_url,
		poll_interval_ms = config.service.poll_interval_ms,
		"configuration is valid"
	);
	Ok(())
}
