use crate::database;

/// The public projection of a user. The password hash never leaves the
/// database model.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
	pub id: String,
	pub username: String,
	pub email: String,
	pub avatar: Option<String>,
	pub channel_id: Option<String>,
}

impl From<&database::User> for PublicUser {
	fn from(user: &database::User) -> Self {
		Self {
			id: user.id.to_hex(),
			username: user.username.clone(),
			email: user.email.clone(),
			avatar: user.avatar.clone(),
			channel_id: user.channel_id.map(|id| id.to_hex()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::database::User;

	#[test]
	fn test_no_password_in_projection() {
		let user = User::new(
			"alice".to_string(),
			"a@x.com".to_string(),
			"some-argon2-hash".to_string(),
		);

		let value = serde_json::to_value(PublicUser::from(&user)).expect("failed to serialize");
		let object = value.as_object().expect("expected an object");

		assert!(!object.contains_key("password"));
		assert_eq!(object["username"], "alice");
		assert_eq!(object["id"], user.id.to_hex());
		assert_eq!(object["channelId"], serde_json::Value::Null);
	}
}
