use std::fmt::{Debug, Display};
use std::panic::Location;

use hyper::{Body, StatusCode};
use routerify::RequestInfo;
use serde_json::json;

use super::auth::AuthError;
use super::macros::make_response;
use crate::logging;

pub type Result<T, E = RouteError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	/// The input was malformed or missing. Detected before any persistence
	/// attempt.
	#[error("{message}")]
	InvalidInput {
		fields: Vec<&'static str>,
		message: &'static str,
	},
	/// A uniqueness constraint was violated.
	#[error("{message}")]
	Conflict {
		field: &'static str,
		message: &'static str,
	},
	/// The credential was missing, invalid or expired.
	#[error("{0}")]
	Auth(#[from] AuthError),
	/// The requester is known, just not permitted.
	#[error("{0}")]
	Forbidden(&'static str),
	#[error("{0} not found")]
	NotFound(&'static str),
	#[error("database error: {0}")]
	Database(#[from] mongodb::error::Error),
	#[error("internal server error: {0}")]
	InternalServerError(&'static str),
}

impl ApiError {
	pub fn status(&self) -> StatusCode {
		match self {
			ApiError::InvalidInput { .. } | ApiError::Conflict { .. } => StatusCode::BAD_REQUEST,
			ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
			ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
			ApiError::NotFound(_) => StatusCode::NOT_FOUND,
			ApiError::Database(_) | ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// The message shown to clients. 5xx sources stay behind a generic
	/// message unless debug responses are enabled.
	pub fn message(&self) -> String {
		match self {
			ApiError::Database(_) | ApiError::InternalServerError(_) => "Internal Server Error".to_string(),
			_ => self.to_string(),
		}
	}

	pub fn response(&self) -> hyper::Response<Body> {
		let status = self.status();

		let mut body = json!({
			"message": self.message(),
			"success": false,
		});

		if let ApiError::InvalidInput { fields, .. } = self {
			if !fields.is_empty() {
				body["fields"] = json!(fields);
			}
		}

		if status.is_server_error() && logging::debug_responses() {
			body["error"] = json!(self.to_string());
		}

		make_response!(status, body)
	}
}

pub struct RouteError {
	error: ApiError,
	span: tracing::Span,
	location: &'static Location<'static>,
}

impl RouteError {
	pub fn error(&self) -> &ApiError {
		&self.error
	}

	pub fn span(&self) -> &tracing::Span {
		&self.span
	}

	pub fn location(&self) -> &'static Location<'static> {
		self.location
	}

	pub fn response(&self) -> hyper::Response<Body> {
		self.error.response()
	}
}

impl<T> From<T> for RouteError
where
	ApiError: From<T>,
{
	#[track_caller]
	fn from(value: T) -> Self {
		Self {
			error: ApiError::from(value),
			span: tracing::Span::current(),
			location: Location::caller(),
		}
	}
}

impl Debug for RouteError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "RouteError: {:?}", self.error)
	}
}

impl Display for RouteError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "RouteError: {}", self.error)
	}
}

impl std::error::Error for RouteError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		Some(&self.error)
	}
}

pub async fn error_handler(
	err: Box<dyn std::error::Error + Send + Sync + 'static>,
	info: RequestInfo,
) -> hyper::Response<Body> {
	match err.downcast::<RouteError>() {
		Ok(err) => {
			let location = err.location();

			err.span().in_scope(|| {
				if err.error().status().is_server_error() {
					tracing::error!(path = %info.uri(), method = %info.method(), location = location.to_string(), error = %err.error(), "http error");
				} else {
					tracing::debug!(path = %info.uri(), method = %info.method(), location = location.to_string(), error = %err.error(), "http error");
				}
			});

			err.response()
		}
		Err(err) => {
			tracing::error!(path = %info.uri(), method = %info.method(), error = ?err, "unhandled http error");

			make_response!(
				StatusCode::INTERNAL_SERVER_ERROR,
				json!({ "message": "Internal Server Error", "success": false })
			)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_taxonomy() {
		let invalid = ApiError::InvalidInput {
			fields: vec!["username"],
			message: "Username must be at least 3 characters long",
		};
		assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

		let conflict = ApiError::Conflict {
			field: "email",
			message: "Email already in use",
		};
		assert_eq!(conflict.status(), StatusCode::BAD_REQUEST);

		assert_eq!(ApiError::Auth(AuthError::NotLoggedIn).status(), StatusCode::UNAUTHORIZED);
		assert_eq!(ApiError::Auth(AuthError::InvalidToken).status(), StatusCode::UNAUTHORIZED);
		assert_eq!(
			ApiError::Forbidden("Not authorized to update this video").status(),
			StatusCode::FORBIDDEN
		);
		assert_eq!(ApiError::NotFound("Video").status(), StatusCode::NOT_FOUND);
		assert_eq!(
			ApiError::InternalServerError("boom").status(),
			StatusCode::INTERNAL_SERVER_ERROR
		);
	}

	#[test]
	fn test_forbidden_is_distinct_from_unauthorized() {
		// The requester is known, just not permitted.
		assert_ne!(
			ApiError::Forbidden("Not authorized to edit this comment").status(),
			ApiError::Auth(AuthError::NotLoggedIn).status()
		);
	}

	#[test]
	fn test_client_messages() {
		assert_eq!(ApiError::NotFound("Video").message(), "Video not found");
		assert_eq!(
			ApiError::InternalServerError("secret detail").message(),
			"Internal Server Error"
		);
	}
}
