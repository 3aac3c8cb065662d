use std::net::SocketAddr;

use anyhow::{Context, Result};

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
/// The API is the backend for the Vidhive service
pub struct AppConfig {
	/// The path to the config file
	pub config_file: Option<String>,

	/// Name of this instance
	pub name: String,

	/// The logging config
	pub logging: LoggingConfig,

	/// API Config
	pub api: ApiConfig,

	/// Database Config
	pub database: DatabaseConfig,

	/// JWT Config
	pub jwt: JwtConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// The log level to use, this is a tracing env-filter
	pub level: String,

	/// If the logs should be outputted as json
	pub json: bool,

	/// If error responses should carry source detail
	pub debug: bool,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			json: false,
			debug: false,
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct ApiConfig {
	/// Bind address for the API
	pub bind_address: SocketAddr,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			bind_address: "[::]:4000".parse().expect("failed to parse bind address"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
	/// The database URI to use, the default database is taken from the path
	pub uri: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			uri: "mongodb://localhost:27017/vidhive_dev".to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct JwtConfig {
	/// JWT secret
	pub secret: String,

	/// JWT issuer
	pub issuer: String,
}

impl Default for JwtConfig {
	fn default() -> Self {
		Self {
			issuer: "vidhive".to_string(),
			secret: "vidhive".to_string(),
		}
	}
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			config_file: None,
			name: "vidhive-api".to_string(),
			logging: LoggingConfig::default(),
			api: ApiConfig::default(),
			database: DatabaseConfig::default(),
			jwt: JwtConfig::default(),
		}
	}
}

impl AppConfig {
	/// Loads the config from an optional JSON file and applies environment
	/// overrides on top.
	pub fn parse() -> Result<Self> {
		let config_file = std::env::var("VIDHIVE_CONFIG_FILE").ok();

		let mut config = match &config_file {
			Some(path) => {
				let raw = std::fs::read_to_string(path)
					.with_context(|| format!("failed to read config file {path}"))?;
				serde_json::from_str(&raw).with_context(|| format!("failed to parse config file {path}"))?
			}
			None => Self::default(),
		};

		config.config_file = config_file;

		if let Ok(name) = std::env::var("VIDHIVE_NAME") {
			config.name = name;
		}

		if let Ok(level) = std::env::var("VIDHIVE_LOG_LEVEL") {
			config.logging.level = level;
		}

		if let Ok(json) = std::env::var("VIDHIVE_LOG_JSON") {
			config.logging.json = json.parse().context("VIDHIVE_LOG_JSON must be a boolean")?;
		}

		if let Ok(debug) = std::env::var("VIDHIVE_DEBUG") {
			config.logging.debug = debug.parse().context("VIDHIVE_DEBUG must be a boolean")?;
		}

		if let Ok(addr) = std::env::var("VIDHIVE_BIND_ADDRESS") {
			config.api.bind_address = addr.parse().context("VIDHIVE_BIND_ADDRESS must be a socket address")?;
		}

		if let Ok(uri) = std::env::var("MONGODB_URI") {
			config.database.uri = uri;
		}

		if let Ok(secret) = std::env::var("JWT_SECRET") {
			config.jwt.secret = secret;
		}

		if let Ok(issuer) = std::env::var("JWT_ISSUER") {
			config.jwt.issuer = issuer;
		}

		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use serial_test::serial;

	use super::*;

	fn clear_env() {
		for key in [
			"VIDHIVE_CONFIG_FILE",
			"VIDHIVE_NAME",
			"VIDHIVE_LOG_LEVEL",
			"VIDHIVE_LOG_JSON",
			"VIDHIVE_DEBUG",
			"VIDHIVE_BIND_ADDRESS",
			"MONGODB_URI",
			"JWT_SECRET",
			"JWT_ISSUER",
		] {
			std::env::remove_var(key);
		}
	}

	#[serial]
	#[test]
	fn test_defaults() {
		clear_env();

		let config = AppConfig::parse().expect("failed to parse config");

		assert_eq!(config.name, "vidhive-api");
		assert_eq!(config.api.bind_address, "[::]:4000".parse().unwrap());
		assert_eq!(config.logging.level, "info");
		assert!(!config.logging.json);
		assert_eq!(config.jwt.issuer, "vidhive");
	}

	#[serial]
	#[test]
	fn test_env_overrides() {
		clear_env();

		std::env::set_var("VIDHIVE_BIND_ADDRESS", "127.0.0.1:9000");
		std::env::set_var("JWT_SECRET", "not-the-default");

		let config = AppConfig::parse().expect("failed to parse config");

		assert_eq!(config.api.bind_address, "127.0.0.1:9000".parse().unwrap());
		assert_eq!(config.jwt.secret, "not-the-default");

		std::env::remove_var("VIDHIVE_BIND_ADDRESS");
		std::env::remove_var("JWT_SECRET");
	}
}
