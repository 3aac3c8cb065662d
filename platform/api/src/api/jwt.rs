use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use jwt::{Claims, Header, RegisteredClaims, SignWithKey, Token, VerifyWithKey};
use mongodb::bson::oid::ObjectId;
use sha2::Sha256;

use crate::config::JwtConfig;

/// Tokens are stateless; expiry is the only invalidation path.
pub const TOKEN_LIFETIME_SECONDS: i64 = 24 * 60 * 60;

pub struct AuthJwtPayload {
	pub user_id: ObjectId,
	pub issued_at: DateTime<Utc>,
	pub expiration: DateTime<Utc>,
}

impl AuthJwtPayload {
	pub fn new(user_id: ObjectId) -> Self {
		let issued_at = Utc::now();

		Self {
			user_id,
			issued_at,
			expiration: issued_at + Duration::seconds(TOKEN_LIFETIME_SECONDS),
		}
	}
}

pub trait JwtState: Sized {
	fn to_claims(&self) -> Claims;

	fn from_claims(claims: &Claims) -> Option<Self>;

	fn serialize(&self, config: &JwtConfig) -> Option<String> {
		let key = Hmac::<Sha256>::new_from_slice(config.secret.as_bytes()).ok()?;
		let mut claims = self.to_claims();

		claims.registered.issuer = Some(config.issuer.clone());

		claims.sign_with_key(&key).ok()
	}

	fn verify(config: &JwtConfig, token: &str) -> Option<Self> {
		let key = Hmac::<Sha256>::new_from_slice(config.secret.as_bytes()).ok()?;
		let token: Token<Header, Claims, _> = token.verify_with_key(&key).ok()?;

		let claims = token.claims();

		if claims.registered.issuer.as_ref() != Some(&config.issuer) {
			return None;
		}

		let iat = Utc.timestamp_opt(claims.registered.issued_at? as i64, 0).single()?;
		if iat > Utc::now() {
			return None;
		}

		let exp = Utc.timestamp_opt(claims.registered.expiration? as i64, 0).single()?;
		if exp < Utc::now() {
			return None;
		}

		Self::from_claims(claims)
	}
}

impl JwtState for AuthJwtPayload {
	fn to_claims(&self) -> Claims {
		Claims {
			registered: RegisteredClaims {
				issuer: None,
				subject: Some(self.user_id.to_hex()),
				audience: None,
				expiration: Some(self.expiration.timestamp() as u64),
				not_before: None,
				issued_at: Some(self.issued_at.timestamp() as u64),
				json_web_token_id: None,
			},
			private: Default::default(),
		}
	}

	fn from_claims(claims: &Claims) -> Option<Self> {
		Some(Self {
			user_id: claims
				.registered
				.subject
				.as_ref()
				.and_then(|x| ObjectId::parse_str(x).ok())?,
			issued_at: Utc.timestamp_opt(claims.registered.issued_at? as i64, 0).single()?,
			expiration: Utc.timestamp_opt(claims.registered.expiration? as i64, 0).single()?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config() -> JwtConfig {
		JwtConfig {
			secret: "test-secret".to_string(),
			issuer: "test".to_string(),
		}
	}

	fn payload_with(issued_at: DateTime<Utc>, expiration: DateTime<Utc>) -> AuthJwtPayload {
		AuthJwtPayload {
			user_id: ObjectId::new(),
			issued_at,
			expiration,
		}
	}

	#[test]
	fn test_round_trip() {
		let config = config();
		let payload = AuthJwtPayload::new(ObjectId::new());

		let token = payload.serialize(&config).expect("failed to serialize token");
		let verified = AuthJwtPayload::verify(&config, &token).expect("failed to verify token");

		assert_eq!(verified.user_id, payload.user_id);
		assert_eq!(verified.issued_at.timestamp(), payload.issued_at.timestamp());
		assert_eq!(
			verified.expiration.timestamp() - verified.issued_at.timestamp(),
			TOKEN_LIFETIME_SECONDS
		);
	}

	#[test]
	fn test_accepts_just_before_expiry() {
		let config = config();

		// Issued almost a full lifetime ago, one minute left on the clock.
		let issued_at = Utc::now() - Duration::seconds(TOKEN_LIFETIME_SECONDS - 60);
		let payload = payload_with(issued_at, issued_at + Duration::seconds(TOKEN_LIFETIME_SECONDS));

		let token = payload.serialize(&config).expect("failed to serialize token");
		assert!(AuthJwtPayload::verify(&config, &token).is_some());
	}

	#[test]
	fn test_rejects_after_expiry() {
		let config = config();

		let issued_at = Utc::now() - Duration::seconds(TOKEN_LIFETIME_SECONDS + 60);
		let payload = payload_with(issued_at, issued_at + Duration::seconds(TOKEN_LIFETIME_SECONDS));

		let token = payload.serialize(&config).expect("failed to serialize token");
		assert!(AuthJwtPayload::verify(&config, &token).is_none());
	}

	#[test]
	fn test_rejects_future_issued_at() {
		let config = config();

		let issued_at = Utc::now() + Duration::hours(1);
		let payload = payload_with(issued_at, issued_at + Duration::seconds(TOKEN_LIFETIME_SECONDS));

		let token = payload.serialize(&config).expect("failed to serialize token");
		assert!(AuthJwtPayload::verify(&config, &token).is_none());
	}

	#[test]
	fn test_rejects_wrong_secret() {
		let config = config();
		let other = JwtConfig {
			secret: "other-secret".to_string(),
			issuer: config.issuer.clone(),
		};

		let token = AuthJwtPayload::new(ObjectId::new())
			.serialize(&config)
			.expect("failed to serialize token");

		assert!(AuthJwtPayload::verify(&other, &token).is_none());
	}

	#[test]
	fn test_rejects_wrong_issuer() {
		let config = config();
		let other = JwtConfig {
			secret: config.secret.clone(),
			issuer: "someone-else".to_string(),
		};

		let token = AuthJwtPayload::new(ObjectId::new())
			.serialize(&other)
			.expect("failed to serialize token");

		assert!(AuthJwtPayload::verify(&config, &token).is_none());
	}

	#[test]
	fn test_rejects_garbage() {
		let config = config();

		assert!(AuthJwtPayload::verify(&config, "not-a-token").is_none());
		assert!(AuthJwtPayload::verify(&config, "").is_none());
	}
}
