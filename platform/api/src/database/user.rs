use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{ClientSession, Collection, Database, IndexModel};

use super::Channel;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// The unique identifier for the user.
	#[serde(rename = "_id")]
	pub id: ObjectId,
	/// The username of the user.
	pub username: String,
	/// The email of the user.
	pub email: String,
	/// The hashed password of the user. (argon2)
	pub password: String,
	/// The avatar of the user.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub avatar: Option<String>,
	/// The channel owned by the user, if one has been created.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub channel_id: Option<ObjectId>,
	#[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
	pub created_at: DateTime<Utc>,
	#[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
	pub updated_at: DateTime<Utc>,
}

impl User {
	pub(crate) fn collection(db: &Database) -> Collection<User> {
		db.collection("users")
	}

	pub async fn setup_collection(db: &Database) -> Result<(), mongodb::error::Error> {
		let collection = Self::collection(db);

		collection
			.create_index(
				IndexModel::builder()
					.keys(doc! { "username": 1 })
					.options(IndexOptions::builder().unique(true).build())
					.build(),
				None,
			)
			.await?;

		collection
			.create_index(
				IndexModel::builder()
					.keys(doc! { "email": 1 })
					.options(IndexOptions::builder().unique(true).build())
					.build(),
				None,
			)
			.await?;

		Ok(())
	}

	pub fn new(username: String, email: String, password_hash: String) -> Self {
		let now = Utc::now();

		Self {
			id: ObjectId::new(),
			username,
			email,
			password: password_hash,
			avatar: None,
			channel_id: None,
			created_at: now,
			updated_at: now,
		}
	}

	pub async fn find_by_id(db: &Database, id: ObjectId) -> Result<Option<User>, mongodb::error::Error> {
		Self::collection(db).find_one(doc! { "_id": id }, None).await
	}

	pub async fn find_by_email(db: &Database, email: &str) -> Result<Option<User>, mongodb::error::Error> {
		Self::collection(db).find_one(doc! { "email": email }, None).await
	}

	/// Fetches a batch of users keyed by id, for resolving display
	/// identities onto video payloads.
	pub async fn find_many(
		db: &Database,
		ids: &[ObjectId],
	) -> Result<std::collections::HashMap<ObjectId, User>, mongodb::error::Error> {
		use futures_util::TryStreamExt;

		let cursor = Self::collection(db)
			.find(doc! { "_id": { "$in": ids.to_vec() } }, None)
			.await?;

		cursor.map_ok(|user| (user.id, user)).try_collect().await
	}

	/// Finds a user colliding with the given username or email, used to
	/// report which field a signup conflicts on before inserting.
	pub async fn find_conflicting(
		db: &Database,
		username: &str,
		email: &str,
	) -> Result<Option<User>, mongodb::error::Error> {
		Self::collection(db)
			.find_one(doc! { "$or": [{ "username": username }, { "email": email }] }, None)
			.await
	}

	/// Creates the user and their default channel in a single transaction,
	/// so a failure partway through leaves neither record behind.
	pub async fn register(
		client: &mongodb::Client,
		db: &Database,
		username: String,
		email: String,
		password_hash: String,
	) -> Result<(User, Channel), mongodb::error::Error> {
		let mut user = User::new(username, email, password_hash);
		let channel = Channel::new(
			user.id,
			user.username.clone(),
			format!("{}'s channel", user.username),
			None,
		);

		let mut session = client.start_session(None).await?;
		session.start_transaction(None).await?;

		let result = Self::register_in_session(db, &user, &channel, &mut session).await;

		if let Err(err) = result {
			session.abort_transaction().await.ok();
			return Err(err);
		}

		session.commit_transaction().await?;

		user.channel_id = Some(channel.id);

		Ok((user, channel))
	}

	async fn register_in_session(
		db: &Database,
		user: &User,
		channel: &Channel,
		session: &mut ClientSession,
	) -> Result<(), mongodb::error::Error> {
		User::collection(db).insert_one_with_session(user, None, session).await?;
		Channel::collection(db).insert_one_with_session(channel, None, session).await?;

		User::collection(db)
			.update_one_with_session(
				doc! { "_id": user.id },
				doc! { "$set": { "channelId": channel.id, "updatedAt": Utc::now() } },
				None,
				session,
			)
			.await?;

		Ok(())
	}

	/// Links the channel to the user once it has been created.
	pub async fn set_channel(
		db: &Database,
		user_id: ObjectId,
		channel_id: ObjectId,
	) -> Result<(), mongodb::error::Error> {
		Self::collection(db)
			.update_one(
				doc! { "_id": user_id },
				doc! { "$set": { "channelId": channel_id, "updatedAt": Utc::now() } },
				None,
			)
			.await?;

		Ok(())
	}

	/// Uses argon2 to verify the password hash against the provided password.
	pub fn verify_password(&self, password: &str) -> bool {
		let hash = match PasswordHash::new(&self.password) {
			Ok(hash) => hash,
			Err(err) => {
				tracing::error!("failed to parse password hash: {}", err);
				return false;
			}
		};

		Argon2::default().verify_password(password.as_bytes(), &hash).is_ok()
	}

	/// Generates a new password hash using argon2.
	pub fn hash_password(password: &str) -> String {
		let salt = SaltString::generate(&mut OsRng);

		let hash = Argon2::default()
			.hash_password(password.as_bytes(), &salt)
			.expect("failed to hash password");

		hash.to_string()
	}

	/// Validates a username.
	pub fn validate_username(username: &str) -> Result<(), &'static str> {
		if username.len() < 3 {
			return Err("Username must be at least 3 characters long");
		}

		if username.len() > 20 {
			return Err("Username must be at most 20 characters long");
		}

		if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
			return Err("Username must only contain alphanumeric characters and underscores");
		}

		Ok(())
	}

	/// Validates a password.
	pub fn validate_password(password: &str) -> Result<(), &'static str> {
		if password.len() < 6 {
			return Err("Password must be at least 6 characters long");
		}

		if password.len() > 100 {
			return Err("Password must be at most 100 characters long");
		}

		Ok(())
	}

	/// Validates an email.
	pub fn validate_email(email: &str) -> Result<(), &'static str> {
		if !email_address::EmailAddress::is_valid(email) {
			return Err("Valid email is required");
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_validate_username() {
		assert!(User::validate_username("alice").is_ok());
		assert!(User::validate_username("alice_99").is_ok());

		assert!(User::validate_username("al").is_err());
		assert!(User::validate_username("a".repeat(21).as_str()).is_err());
		assert!(User::validate_username("alice!").is_err());
		assert!(User::validate_username("ali ce").is_err());
	}

	#[test]
	fn test_validate_password() {
		assert!(User::validate_password("secret1").is_ok());

		assert!(User::validate_password("short").is_err());
		assert!(User::validate_password("a".repeat(101).as_str()).is_err());
	}

	#[test]
	fn test_validate_email() {
		assert!(User::validate_email("a@x.com").is_ok());

		assert!(User::validate_email("").is_err());
		assert!(User::validate_email("not-an-email").is_err());
		assert!(User::validate_email("missing@tld@x").is_err());
	}

	#[test]
	fn test_password_hash_round_trip() {
		let user = User::new(
			"alice".to_string(),
			"a@x.com".to_string(),
			User::hash_password("secret1"),
		);

		assert_ne!(user.password, "secret1");
		assert!(user.verify_password("secret1"));
		assert!(!user.verify_password("secret2"));
	}

	#[test]
	fn test_password_never_serialized_in_projections() {
		// The database model does serialize the hash (it has to be
		// persisted); client payloads are built from projections only.
		let user = User::new(
			"alice".to_string(),
			"a@x.com".to_string(),
			User::hash_password("secret1"),
		);

		let doc = bson::to_document(&user).expect("failed to serialize user");
		assert!(doc.contains_key("password"));
		assert!(doc.contains_key("_id"));
	}
}
