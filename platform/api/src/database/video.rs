use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};

use super::User;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
	/// The unique identifier for the comment within its video.
	#[serde(rename = "_id")]
	pub id: ObjectId,
	pub text: String,
	/// The authoring user.
	pub user_id: ObjectId,
	/// Display identity captured when the comment was written; not kept in
	/// sync with later profile edits.
	pub username: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub avatar: Option<String>,
	#[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
	pub created_at: DateTime<Utc>,
	#[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
	pub updated_at: DateTime<Utc>,
}

impl Comment {
	pub fn new(author: &User, text: String) -> Self {
		let now = Utc::now();

		Self {
			id: ObjectId::new(),
			text,
			user_id: author.id,
			username: author.username.clone(),
			avatar: author.avatar.clone(),
			created_at: now,
			updated_at: now,
		}
	}
}

/// A reaction toggle on a video. Any authenticated user may react; this is
/// the only mutation path that is not owner-restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionAction {
	Like,
	Unlike,
	Dislike,
	Undislike,
}

impl FromStr for ReactionAction {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"like" => Ok(Self::Like),
			"unlike" => Ok(Self::Unlike),
			"dislike" => Ok(Self::Dislike),
			"undislike" => Ok(Self::Undislike),
			_ => Err(()),
		}
	}
}

impl ReactionAction {
	/// Builds the one-document update for this action. Adding to one set
	/// always pulls from the other, so the two sets stay disjoint and a
	/// repeated reaction is a no-op.
	pub fn update_document(self, user_id: ObjectId) -> Document {
		match self {
			Self::Like => doc! { "$addToSet": { "likes": user_id }, "$pull": { "dislikes": user_id } },
			Self::Unlike => doc! { "$pull": { "likes": user_id } },
			Self::Dislike => doc! { "$addToSet": { "dislikes": user_id }, "$pull": { "likes": user_id } },
			Self::Undislike => doc! { "$pull": { "dislikes": user_id } },
		}
	}
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
	/// The unique identifier for the video.
	#[serde(rename = "_id")]
	pub id: ObjectId,
	pub title: String,
	#[serde(default)]
	pub description: String,
	/// The source URL. Exposed to clients under both `videoUrl` and its
	/// external alias `url`.
	pub video_url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub thumbnail: Option<String>,
	/// The uploading user.
	pub user_id: ObjectId,
	/// The channel the video was published on.
	pub channel_id: ObjectId,
	/// Incremented on every fetch by id, with no de-duplication by viewer.
	#[serde(default)]
	pub views: i64,
	#[serde(default)]
	pub likes: Vec<ObjectId>,
	#[serde(default)]
	pub dislikes: Vec<ObjectId>,
	#[serde(default)]
	pub comments: Vec<Comment>,
	#[serde(default)]
	pub categories: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub duration: Option<String>,
	#[serde(default)]
	pub is_local_video: bool,
	#[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
	pub created_at: DateTime<Utc>,
	#[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
	pub updated_at: DateTime<Utc>,
}

impl Video {
	pub(crate) fn collection(db: &Database) -> Collection<Video> {
		db.collection("videos")
	}

	pub async fn setup_collection(db: &Database) -> Result<(), mongodb::error::Error> {
		let collection = Self::collection(db);

		collection
			.create_index(IndexModel::builder().keys(doc! { "userId": 1 }).build(), None)
			.await?;

		collection
			.create_index(IndexModel::builder().keys(doc! { "channelId": 1 }).build(), None)
			.await?;

		collection
			.create_index(IndexModel::builder().keys(doc! { "createdAt": -1 }).build(), None)
			.await?;

		Ok(())
	}

	#[allow(clippy::too_many_arguments)]
	pub fn new(
		title: String,
		description: String,
		video_url: String,
		thumbnail: Option<String>,
		user_id: ObjectId,
		channel_id: ObjectId,
		categories: Vec<String>,
		duration: Option<String>,
	) -> Self {
		let now = Utc::now();

		Self {
			id: ObjectId::new(),
			title,
			description,
			video_url,
			thumbnail,
			user_id,
			channel_id,
			views: 0,
			likes: Vec::new(),
			dislikes: Vec::new(),
			comments: Vec::new(),
			categories,
			duration,
			is_local_video: false,
			created_at: now,
			updated_at: now,
		}
	}

	pub async fn insert(&self, db: &Database) -> Result<(), mongodb::error::Error> {
		Self::collection(db).insert_one(self, None).await?;

		Ok(())
	}

	/// Fetches all videos, newest first. An optional search filters on
	/// title and description, case-insensitively.
	pub async fn find_all(db: &Database, search: Option<&str>) -> Result<Vec<Video>, mongodb::error::Error> {
		let filter = match search {
			Some(text) => doc! {
				"$or": [
					{ "title": { "$regex": text, "$options": "i" } },
					{ "description": { "$regex": text, "$options": "i" } },
				],
			},
			None => doc! {},
		};

		let cursor = Self::collection(db)
			.find(filter, FindOptions::builder().sort(doc! { "createdAt": -1 }).build())
			.await?;

		cursor.try_collect().await
	}

	/// Fetches all videos uploaded by a user, newest first.
	pub async fn find_by_user_id(db: &Database, user_id: ObjectId) -> Result<Vec<Video>, mongodb::error::Error> {
		let cursor = Self::collection(db)
			.find(
				doc! { "userId": user_id },
				FindOptions::builder().sort(doc! { "createdAt": -1 }).build(),
			)
			.await?;

		cursor.try_collect().await
	}

	pub async fn find_by_id(db: &Database, id: ObjectId) -> Result<Option<Video>, mongodb::error::Error> {
		Self::collection(db).find_one(doc! { "_id": id }, None).await
	}

	/// Fetches the video and counts the view. Every fetch counts, including
	/// repeats and the owner's own.
	pub async fn find_by_id_and_count_view(
		db: &Database,
		id: ObjectId,
	) -> Result<Option<Video>, mongodb::error::Error> {
		Self::collection(db)
			.find_one_and_update(
				doc! { "_id": id },
				doc! { "$inc": { "views": 1 } },
				Some(
					FindOneAndUpdateOptions::builder()
						.return_document(ReturnDocument::After)
						.build(),
				),
			)
			.await
	}

	/// Applies a partial update; only the supplied fields change.
	pub async fn update_fields(
		db: &Database,
		id: ObjectId,
		title: Option<String>,
		description: Option<String>,
	) -> Result<Option<Video>, mongodb::error::Error> {
		let mut set = doc! { "updatedAt": Utc::now() };

		if let Some(title) = title {
			set.insert("title", title);
		}

		if let Some(description) = description {
			set.insert("description", description);
		}

		Self::collection(db)
			.find_one_and_update(
				doc! { "_id": id },
				doc! { "$set": set },
				Some(
					FindOneAndUpdateOptions::builder()
						.return_document(ReturnDocument::After)
						.build(),
				),
			)
			.await
	}

	/// Applies a reaction as a single atomic document update.
	pub async fn react(
		db: &Database,
		id: ObjectId,
		user_id: ObjectId,
		action: ReactionAction,
	) -> Result<Option<Video>, mongodb::error::Error> {
		Self::collection(db)
			.find_one_and_update(
				doc! { "_id": id },
				action.update_document(user_id),
				Some(
					FindOneAndUpdateOptions::builder()
						.return_document(ReturnDocument::After)
						.build(),
				),
			)
			.await
	}

	/// Deletes the video and, with it, its embedded comments.
	pub async fn delete(db: &Database, id: ObjectId) -> Result<bool, mongodb::error::Error> {
		let result = Self::collection(db).delete_one(doc! { "_id": id }, None).await?;

		Ok(result.deleted_count == 1)
	}

	/// Appends a comment. Returns false when the video does not exist.
	pub async fn push_comment(
		db: &Database,
		video_id: ObjectId,
		comment: &Comment,
	) -> Result<bool, mongodb::error::Error> {
		let comment = bson::to_bson(comment)?;

		let result = Self::collection(db)
			.update_one(doc! { "_id": video_id }, doc! { "$push": { "comments": comment } }, None)
			.await?;

		Ok(result.matched_count == 1)
	}

	/// Rewrites the text of one embedded comment and refreshes its updated
	/// timestamp. Returns false when the video or comment is gone.
	pub async fn update_comment(
		db: &Database,
		video_id: ObjectId,
		comment_id: ObjectId,
		text: &str,
		updated_at: DateTime<Utc>,
	) -> Result<bool, mongodb::error::Error> {
		let result = Self::collection(db)
			.update_one(
				doc! { "_id": video_id, "comments._id": comment_id },
				doc! { "$set": { "comments.$.text": text, "comments.$.updatedAt": updated_at } },
				None,
			)
			.await?;

		Ok(result.matched_count == 1)
	}

	/// Removes one embedded comment by id. Returns false when nothing was
	/// removed.
	pub async fn pull_comment(
		db: &Database,
		video_id: ObjectId,
		comment_id: ObjectId,
	) -> Result<bool, mongodb::error::Error> {
		let result = Self::collection(db)
			.update_one(
				doc! { "_id": video_id },
				doc! { "$pull": { "comments": { "_id": comment_id } } },
				None,
			)
			.await?;

		Ok(result.modified_count == 1)
	}
}

/// Deduplicates a listing by source URL, first occurrence wins. A defensive
/// measure against duplicate inserts, not a data-layer constraint.
pub fn dedupe_by_source_url(videos: Vec<Video>) -> Vec<Video> {
	let mut seen = HashSet::new();

	videos.into_iter().filter(|video| seen.insert(video.video_url.clone())).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn video(url: &str) -> Video {
		Video::new(
			"title".to_string(),
			String::new(),
			url.to_string(),
			None,
			ObjectId::new(),
			ObjectId::new(),
			Vec::new(),
			None,
		)
	}

	#[test]
	fn test_reaction_action_parse() {
		assert_eq!("like".parse(), Ok(ReactionAction::Like));
		assert_eq!("unlike".parse(), Ok(ReactionAction::Unlike));
		assert_eq!("dislike".parse(), Ok(ReactionAction::Dislike));
		assert_eq!("undislike".parse(), Ok(ReactionAction::Undislike));

		assert_eq!("love".parse::<ReactionAction>(), Err(()));
		assert_eq!("Like".parse::<ReactionAction>(), Err(()));
		assert_eq!("".parse::<ReactionAction>(), Err(()));
	}

	#[test]
	fn test_reaction_updates_keep_sets_disjoint() {
		let user_id = ObjectId::new();

		// Adding to either set always pulls from the other in the same
		// document update.
		let like = ReactionAction::Like.update_document(user_id);
		assert_eq!(like.get_document("$addToSet").unwrap().get_object_id("likes").unwrap(), user_id);
		assert_eq!(like.get_document("$pull").unwrap().get_object_id("dislikes").unwrap(), user_id);

		let dislike = ReactionAction::Dislike.update_document(user_id);
		assert_eq!(
			dislike.get_document("$addToSet").unwrap().get_object_id("dislikes").unwrap(),
			user_id
		);
		assert_eq!(dislike.get_document("$pull").unwrap().get_object_id("likes").unwrap(), user_id);

		let unlike = ReactionAction::Unlike.update_document(user_id);
		assert!(unlike.get_document("$addToSet").is_err());
		assert_eq!(unlike.get_document("$pull").unwrap().get_object_id("likes").unwrap(), user_id);

		let undislike = ReactionAction::Undislike.update_document(user_id);
		assert!(undislike.get_document("$addToSet").is_err());
		assert_eq!(
			undislike.get_document("$pull").unwrap().get_object_id("dislikes").unwrap(),
			user_id
		);
	}

	#[test]
	fn test_dedupe_by_source_url_first_wins() {
		let first = video("https://example.com/a.mp4");
		let first_id = first.id;

		let videos = vec![
			first,
			video("https://example.com/b.mp4"),
			video("https://example.com/a.mp4"),
		];

		let deduped = dedupe_by_source_url(videos);

		assert_eq!(deduped.len(), 2);
		assert_eq!(deduped[0].id, first_id);
		assert_eq!(deduped[0].video_url, "https://example.com/a.mp4");
		assert_eq!(deduped[1].video_url, "https://example.com/b.mp4");
	}
}
