use std::sync::Arc;

use anyhow::Result;
use tokio::select;
use tokio::signal::unix::SignalKind;

mod api;
mod config;
mod database;
mod global;
mod logging;

#[tokio::main]
async fn main() -> Result<()> {
	dotenvy::dotenv().ok();

	let config = config::AppConfig::parse()?;

	logging::init(&config.logging)?;

	if let Some(file) = &config.config_file {
		tracing::info!(file = file.as_str(), "loaded config from file");
	}

	tracing::debug!("config: {:#?}", config);

	tracing::info!(name = %config.name, "starting api");

	let global = Arc::new(global::GlobalState::new(config).await?);

	let api_future = tokio::spawn(api::run(global.clone()));

	// Listen on both sigint and sigterm and stop when either is received
	let mut interrupt = tokio::signal::unix::signal(SignalKind::interrupt())?;
	let mut terminate = tokio::signal::unix::signal(SignalKind::terminate())?;

	select! {
		r = api_future => tracing::error!("api stopped unexpectedly: {:?}", r),
		_ = interrupt.recv() => tracing::info!("shutting down"),
		_ = terminate.recv() => tracing::info!("shutting down"),
	}

	drop(global);

	Ok(())
}
