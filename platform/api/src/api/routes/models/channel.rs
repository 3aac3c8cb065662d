use chrono::{DateTime, Utc};

use crate::database;

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPayload {
	pub id: String,
	pub user_id: String,
	pub name: String,
	pub description: String,
	pub avatar: String,
	pub banner: String,
	pub subscriber_count: i64,
	pub total_views: i64,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<&database::Channel> for ChannelPayload {
	fn from(channel: &database::Channel) -> Self {
		Self {
			id: channel.id.to_hex(),
			user_id: channel.user_id.to_hex(),
			name: channel.name.clone(),
			description: channel.description.clone(),
			avatar: channel.avatar.clone(),
			banner: channel.banner.clone(),
			subscriber_count: channel.subscriber_count,
			total_views: channel.total_views,
			created_at: channel.created_at,
			updated_at: channel.updated_at,
		}
	}
}
