use chrono::{DateTime, Utc};

use crate::database;

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPayload {
	pub id: String,
	pub text: String,
	pub user_id: String,
	pub username: String,
	pub avatar: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<&database::Comment> for CommentPayload {
	fn from(comment: &database::Comment) -> Self {
		Self {
			id: comment.id.to_hex(),
			text: comment.text.clone(),
			user_id: comment.user_id.to_hex(),
			username: comment.username.clone(),
			avatar: comment.avatar.clone(),
			created_at: comment.created_at,
			updated_at: comment.updated_at,
		}
	}
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPayload {
	pub id: String,
	pub title: String,
	pub description: String,
	/// The source URL is emitted under both its internal name and its
	/// external alias.
	pub video_url: String,
	pub url: String,
	pub thumbnail: Option<String>,
	pub user_id: String,
	pub channel_id: String,
	pub views: i64,
	pub likes: Vec<String>,
	pub dislikes: Vec<String>,
	pub comments: Vec<CommentPayload>,
	pub categories: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub duration: Option<String>,
	pub is_local_video: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	/// Display identities resolved at read time.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_avatar: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub channel_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub channel_avatar: Option<String>,
}

impl From<&database::Video> for VideoPayload {
	fn from(video: &database::Video) -> Self {
		Self {
			id: video.id.to_hex(),
			title: video.title.clone(),
			description: video.description.clone(),
			video_url: video.video_url.clone(),
			url: video.video_url.clone(),
			thumbnail: video.thumbnail.clone(),
			user_id: video.user_id.to_hex(),
			channel_id: video.channel_id.to_hex(),
			views: video.views,
			likes: video.likes.iter().map(|id| id.to_hex()).collect(),
			dislikes: video.dislikes.iter().map(|id| id.to_hex()).collect(),
			comments: video.comments.iter().map(CommentPayload::from).collect(),
			categories: video.categories.clone(),
			duration: video.duration.clone(),
			is_local_video: video.is_local_video,
			created_at: video.created_at,
			updated_at: video.updated_at,
			username: None,
			user_avatar: None,
			channel_name: None,
			channel_avatar: None,
		}
	}
}

impl VideoPayload {
	pub fn with_uploader(mut self, user: &database::User) -> Self {
		self.username = Some(user.username.clone());
		self.user_avatar = user.avatar.clone();
		self
	}

	pub fn with_channel(mut self, channel: &database::Channel) -> Self {
		self.channel_name = Some(channel.name.clone());
		self.channel_avatar = Some(channel.avatar.clone());
		self
	}
}

#[cfg(test)]
mod tests {
	use mongodb::bson::oid::ObjectId;

	use super::*;
	use crate::database::{User, Video};

	fn video() -> Video {
		Video::new(
			"title".to_string(),
			"description".to_string(),
			"https://example.com/a.mp4".to_string(),
			None,
			ObjectId::new(),
			ObjectId::new(),
			vec!["music".to_string()],
			None,
		)
	}

	#[test]
	fn test_url_emitted_under_both_names() {
		let video = video();

		let value = serde_json::to_value(VideoPayload::from(&video)).expect("failed to serialize");
		let object = value.as_object().expect("expected an object");

		assert_eq!(object["videoUrl"], "https://example.com/a.mp4");
		assert_eq!(object["url"], "https://example.com/a.mp4");
		assert_eq!(object["id"], video.id.to_hex());
		assert_eq!(object["views"], 0);
	}

	#[test]
	fn test_display_identities_resolved_at_read_time() {
		let video = video();
		let mut user = User::new(
			"alice".to_string(),
			"a@x.com".to_string(),
			"hash".to_string(),
		);
		user.avatar = Some("https://example.com/alice.png".to_string());

		let bare = serde_json::to_value(VideoPayload::from(&video)).expect("failed to serialize");
		assert!(bare.get("username").is_none());

		let resolved = serde_json::to_value(VideoPayload::from(&video).with_uploader(&user))
			.expect("failed to serialize");
		assert_eq!(resolved["username"], "alice");
		assert_eq!(resolved["userAvatar"], "https://example.com/alice.png");
	}
}
