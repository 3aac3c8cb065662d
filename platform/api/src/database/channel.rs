use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};

pub const DEFAULT_AVATAR: &str = "https://via.placeholder.com/150";
pub const DEFAULT_BANNER: &str = "https://via.placeholder.com/1200x300";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
	/// The unique identifier for the channel.
	#[serde(rename = "_id")]
	pub id: ObjectId,
	/// The user owning the channel. At most one channel per user; enforced
	/// by a unique index.
	pub user_id: ObjectId,
	/// The name of the channel.
	pub name: String,
	#[serde(default)]
	pub description: String,
	pub avatar: String,
	pub banner: String,
	#[serde(default)]
	pub subscriber_count: i64,
	#[serde(default)]
	pub total_views: i64,
	#[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
	pub created_at: DateTime<Utc>,
	#[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
	pub updated_at: DateTime<Utc>,
}

impl Channel {
	pub(crate) fn collection(db: &Database) -> Collection<Channel> {
		db.collection("channels")
	}

	pub async fn setup_collection(db: &Database) -> Result<(), mongodb::error::Error> {
		Self::collection(db)
			.create_index(
				IndexModel::builder()
					.keys(doc! { "userId": 1 })
					.options(IndexOptions::builder().unique(true).build())
					.build(),
				None,
			)
			.await?;

		Ok(())
	}

	pub fn new(user_id: ObjectId, name: String, description: String, avatar: Option<String>) -> Self {
		let now = Utc::now();

		Self {
			id: ObjectId::new(),
			user_id,
			name,
			description,
			avatar: avatar.unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
			banner: DEFAULT_BANNER.to_string(),
			subscriber_count: 0,
			total_views: 0,
			created_at: now,
			updated_at: now,
		}
	}

	pub async fn insert(&self, db: &Database) -> Result<(), mongodb::error::Error> {
		Self::collection(db).insert_one(self, None).await?;

		Ok(())
	}

	pub async fn find_by_id(db: &Database, id: ObjectId) -> Result<Option<Channel>, mongodb::error::Error> {
		Self::collection(db).find_one(doc! { "_id": id }, None).await
	}

	pub async fn find_by_user_id(
		db: &Database,
		user_id: ObjectId,
	) -> Result<Option<Channel>, mongodb::error::Error> {
		Self::collection(db).find_one(doc! { "userId": user_id }, None).await
	}

	/// Fetches a batch of channels keyed by id, for resolving display
	/// identities onto video payloads.
	pub async fn find_many(
		db: &Database,
		ids: &[ObjectId],
	) -> Result<std::collections::HashMap<ObjectId, Channel>, mongodb::error::Error> {
		use futures_util::TryStreamExt;

		let cursor = Self::collection(db)
			.find(doc! { "_id": { "$in": ids.to_vec() } }, None)
			.await?;

		cursor.map_ok(|channel| (channel.id, channel)).try_collect().await
	}

	/// Applies a partial update; only the supplied fields change.
	pub async fn update_fields(
		db: &Database,
		id: ObjectId,
		name: Option<String>,
		description: Option<String>,
		avatar: Option<String>,
	) -> Result<Option<Channel>, mongodb::error::Error> {
		let mut set = doc! { "updatedAt": Utc::now() };

		if let Some(name) = name {
			set.insert("name", name);
		}

		if let Some(description) = description {
			set.insert("description", description);
		}

		if let Some(avatar) = avatar {
			set.insert("avatar", avatar);
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
}
