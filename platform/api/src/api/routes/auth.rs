use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;
use serde_json::json;

use super::models::PublicUser;
use crate::api::auth::AuthError;
use crate::api::error::{ApiError, Result, RouteError};
use crate::api::ext::{parse_json_body, RequestGlobalExt as _};
use crate::api::jwt::{AuthJwtPayload, JwtState};
use crate::api::macros::make_response;
use crate::database::{is_duplicate_key, User};
use crate::global::GlobalState;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SignupRequest {
	username: String,
	email: String,
	password: String,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct LoginRequest {
	email: String,
	password: String,
}

async fn signup(mut req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global()?;
	let body: SignupRequest = parse_json_body(&mut req).await?;

	let username = body.username.trim().to_lowercase();
	let email = body.email.trim().to_lowercase();

	// Every constraint is checked before anything is persisted. The first
	// failing message is reported along with the full field list.
	let mut fields = Vec::new();
	let mut message = None;

	if let Err(err) = User::validate_username(&username) {
		fields.push("username");
		message.get_or_insert(err);
	}

	if let Err(err) = User::validate_email(&email) {
		fields.push("email");
		message.get_or_insert(err);
	}

	if let Err(err) = User::validate_password(&body.password) {
		fields.push("password");
		message.get_or_insert(err);
	}

	if let Some(message) = message {
		return Err(ApiError::InvalidInput { fields, message }.into());
	}

	if let Some(existing) = User::find_conflicting(&global.db, &username, &email).await? {
		return Err(conflict_for(&existing, &email).into());
	}

	let password_hash = User::hash_password(&body.password);

	let (user, _channel) = match User::register(&global.client, &global.db, username, email, password_hash).await
	{
		Ok(created) => created,
		// A concurrent signup can slip past the pre-check; the unique
		// indexes surface it as a duplicate-key write.
		Err(err) if is_duplicate_key(&err) => {
			return Err(ApiError::Conflict {
				field: "email",
				message: "Email or username already in use",
			}
			.into())
		}
		Err(err) => return Err(err.into()),
	};

	let token = AuthJwtPayload::new(user.id)
		.serialize(&global.config.jwt)
		.ok_or(ApiError::InternalServerError("failed to serialize JWT"))?;

	tracing::debug!(user_id = %user.id, "user signed up");

	Ok(make_response!(
		StatusCode::CREATED,
		json!({
			"token": token,
			"user": PublicUser::from(&user),
		})
	))
}

fn conflict_for(existing: &User, email: &str) -> ApiError {
	if existing.email == email {
		ApiError::Conflict {
			field: "email",
			message: "Email already in use",
		}
	} else {
		ApiError::Conflict {
			field: "username",
			message: "Username already taken",
		}
	}
}

async fn login(mut req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global()?;
	let body: LoginRequest = parse_json_body(&mut req).await?;

	if body.email.is_empty() || body.password.is_empty() {
		return Err(ApiError::InvalidInput {
			fields: vec!["email", "password"],
			message: "Email and password are required",
		}
		.into());
	}

	let email = body.email.trim().to_lowercase();

	// The same error for an unknown email and for a wrong password, so the
	// response does not leak which one failed.
	let user = User::find_by_email(&global.db, &email)
		.await?
		.ok_or(AuthError::InvalidCredentials)?;

	if !user.verify_password(&body.password) {
		return Err(AuthError::InvalidCredentials.into());
	}

	let token = AuthJwtPayload::new(user.id)
		.serialize(&global.config.jwt)
		.ok_or(ApiError::InternalServerError("failed to serialize JWT"))?;

	tracing::debug!(user_id = %user.id, "user logged in");

	Ok(make_response!(
		StatusCode::OK,
		json!({
			"token": token,
			"user": PublicUser::from(&user),
		})
	))
}

pub fn routes(_global: &Arc<GlobalState>) -> Router<Body, RouteError> {
	Router::builder()
		.post("/signup", signup)
		.post("/login", login)
		.build()
		.expect("failed to build auth router")
}
