use std::str::FromStr;

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

static DEBUG_RESPONSES: OnceCell<bool> = OnceCell::new();

pub fn init(config: &LoggingConfig) -> Result<()> {
	DEBUG_RESPONSES.set(config.debug).ok();

	let env_filter = EnvFilter::from_str(&config.level)?;

	let builder = tracing_subscriber::fmt()
		.with_line_number(true)
		.with_file(true)
		.with_env_filter(env_filter);

	if config.json {
		builder.json().try_init()
	} else {
		builder.pretty().try_init()
	}
	.map_err(|err| anyhow::anyhow!("failed to init logger: {err}"))?;

	Ok(())
}

/// Whether 5xx responses may carry source detail. Latched at init so the
/// router error handler does not need access to the config.
pub fn debug_responses() -> bool {
	DEBUG_RESPONSES.get().copied().unwrap_or(false)
}
