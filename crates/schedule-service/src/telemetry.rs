use anyhow::{anyhow, Result};
use schedule_config::LogFormat;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` takes precedence over `log_level`.
pub fn setup_tracing(log_level: &str, format: LogFormat) -> Result<()> {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
	let registry = tracing_subscriber::registry().with(env_filter);

	match format {
		LogFormat::Json => registry
			.with(tracing_subscriber::fmt::layer().json().with_target(true))
			.try_init(),
		LogFormat::Pretty => registry
			.with(tracing_subscriber::fmt::layer().with_thread_ids(true))
			.try_init(),
	}
	.map_err(|e| anyhow!("Failed to initialize tracing: {}", e))
}
