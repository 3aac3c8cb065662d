use mongodb::bson::oid::ObjectId;

use crate::database::User;

#[derive(thiserror::Error, Debug, Clone)]
pub enum AuthError {
	#[error("No auth token provided")]
	NotLoggedIn,
	#[error("token must be ascii only")]
	HeaderToStr,
	#[error("Invalid or expired token")]
	InvalidToken,
	#[error("Invalid credentials")]
	InvalidCredentials,
	#[error("User not found")]
	UserNotFound,
}

/// The authenticated identity attached to the request context by the auth
/// middleware.
#[derive(Debug, Clone)]
pub struct AuthData {
	pub user: User,
}

impl AuthData {
	pub fn new(user: User) -> Self {
		Self { user }
	}

	pub fn user_id(&self) -> ObjectId {
		self.user.id
	}

	/// The ownership predicate applied before every owner-only mutation.
	pub fn owns(&self, owner_id: ObjectId) -> bool {
		self.user.id == owner_id
	}
}

/// Accepts both a raw token and a "Bearer "-prefixed one.
pub fn token_from_header(header: &str) -> &str {
	header.strip_prefix("Bearer ").unwrap_or(header)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn user() -> User {
		User::new(
			"alice".to_string(),
			"a@x.com".to_string(),
			"hash".to_string(),
		)
	}

	#[test]
	fn test_token_from_header() {
		assert_eq!(token_from_header("Bearer abc.def.ghi"), "abc.def.ghi");
		assert_eq!(token_from_header("abc.def.ghi"), "abc.def.ghi");
	}

	#[test]
	fn test_owns() {
		let auth = AuthData::new(user());

		assert!(auth.owns(auth.user_id()));
		assert!(!auth.owns(ObjectId::new()));
	}
}
