use std::time::Duration;

use anyhow::Context;

use crate::config::AppConfig;
use crate::database::{Channel, User, Video};

pub struct GlobalState {
	pub config: AppConfig,
	pub client: mongodb::Client,
	pub db: mongodb::Database,
}

impl GlobalState {
	pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
		const SETUP_TIMEOUT: Duration = Duration::from_secs(5);

		tracing::debug!("setting up mongo client");

		let client = tokio::time::timeout(SETUP_TIMEOUT, mongodb::Client::with_uri_str(&config.database.uri))
			.await
			.context("mongodb timeout")?
			.context("mongodb")?;

		let Some(db) = client.default_database() else {
			anyhow::bail!("database uri has no default database")
		};

		tracing::debug!("setting up collections");

		tokio::time::timeout(SETUP_TIMEOUT, async {
			User::setup_collection(&db).await?;
			Channel::setup_collection(&db).await?;
			Video::setup_collection(&db).await
		})
		.await
		.context("collection setup timeout")?
		.context("collection setup")?;

		Ok(Self { config, client, db })
	}
}
