use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use schedule_config::{Config, ConfigLoader};
use schedule_core::{JobOrchestrator, JobRegistry, RetentionPolicy};
use schedule_service::{
	api::{self, AppState},
	demo::DemoData,
	telemetry,
};
use schedule_solver::{LocalSolverManager, SearchConfig, SolverManagerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::signal;
use tracing::info;

#[derive(Parser)]
#[command(name = "leader-schedule")]
#[command(about = "Leader scheduling service", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	#[arg(short, long, value_name = "FILE", env = "SCHEDULE_CONFIG")]
	config: Option<PathBuf>,

	/// Overrides the configured log level
	#[arg(long, env = "SCHEDULE_LOG_LEVEL")]
	log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
	/// Start the HTTP service
	Serve,
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let mut loader = ConfigLoader::new();
	if let Some(path) = &cli.config {
		loader = loader.with_file(path);
	}
	let config = loader.load().await.context("Failed to load configuration")?;

	let log_level = cli
		.log_level
		.clone()
		.unwrap_or_else(|| config.service.log_level.clone());
	telemetry::setup_tracing(&log_level, config.service.log_format)?;

	match cli.command {
		Some(Commands::Serve) | None => serve(config).await,
		Some(Commands::Validate) => validate_config(&cli, &config),
	}
}

async fn serve(config: Config) -> Result<()> {
	info!("Starting leader scheduling service");

	let engine = LocalSolverManager::new(
		SolverManagerConfig {
			parallel_solver_count: config.solver.parallel_solver_count,
			search: SearchConfig {
				spent_limit: config.solver.spent_limit(),
				unimproved_spent_limit: config.solver.unimproved_spent_limit(),
				random_seed: config.solver.random_seed,
			},
		},
		Handle::current(),
	);

	let orchestrator = Arc::new(JobOrchestrator::new(
		Arc::new(JobRegistry::new()),
		Arc::new(engine),
		RetentionPolicy::new(config.jobs.max_completed_jobs_retained),
	));
	let demo = DemoData::new(config.demo.roster_path.clone())
		.context("Failed to set up demo data")?;

	let state = AppState {
		orchestrator: orchestrator.clone(),
		demo: Arc::new(demo),
	};

	api::start_http_server(state, &config.service.bind_address(), setup_shutdown_signal())
		.await
		.context("HTTP server failed")?;

	info!("Shutdown signal received, stopping solver runs...");
	orchestrator.shutdown();

	info!("Leader scheduling service stopped");
	Ok(())
}

fn validate_config(cli: &Cli, config: &Config) -> Result<()> {
	match &cli.config {
		Some(path) => info!("Configuration file {:?} is valid", path),
		None => info!("No configuration file given; defaults are valid"),
	}
	info!("Listen address: {}", config.service.bind_address());
	info!(
		"Completed jobs retained: {}",
		config.jobs.max_completed_jobs_retained
	);
	info!(
		"Solver: {} parallel, {}s spent limit",
		config.solver.parallel_solver_count, config.solver.spent_limit_secs
	);
	if let Some(path) = &config.demo.roster_path {
		info!("Demo roster: {:?}", path);
	}
	Ok(())
}

async fn setup_shutdown_signal() {
	let ctrl_c = async {
		signal::ctrl_c()
			.await
			.expect("failed to install Ctrl+C handler");
	};

	#[cfg(unix)]
	let terminate = async {
		signal::unix::signal(signal::unix::SignalKind::terminate())
			.expect("failed to install signal handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
