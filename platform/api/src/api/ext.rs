use std::sync::{Arc, Weak};

use hyper::Body;
use mongodb::bson::oid::ObjectId;
use routerify::prelude::RequestExt as _;

use super::auth::{AuthData, AuthError};
use super::error::{ApiError, Result};
use crate::global::GlobalState;

pub trait RequestGlobalExt {
	fn get_global(&self) -> Result<Arc<GlobalState>>;
}

impl RequestGlobalExt for hyper::Request<Body> {
	fn get_global(&self) -> Result<Arc<GlobalState>> {
		Ok(self
			.data::<Weak<GlobalState>>()
			.expect("global state not set")
			.upgrade()
			.ok_or(ApiError::InternalServerError("failed to upgrade global state"))?)
	}
}

pub trait RequestExt {
	/// The identity attached by the auth middleware, or unauthorized.
	fn auth(&self) -> Result<AuthData>;

	/// Parses an ObjectId path parameter. A malformed id can never match a
	/// stored document, so it reports the same not-found as a missing one.
	fn param_object_id(&self, name: &str, resource: &'static str) -> Result<ObjectId>;
}

impl RequestExt for hyper::Request<Body> {
	fn auth(&self) -> Result<AuthData> {
		self.context::<AuthData>().ok_or_else(|| AuthError::NotLoggedIn.into())
	}

	fn param_object_id(&self, name: &str, resource: &'static str) -> Result<ObjectId> {
		let raw = self
			.param(name)
			.ok_or(ApiError::InternalServerError("missing route parameter"))?;

		Ok(ObjectId::parse_str(raw).map_err(|_| ApiError::NotFound(resource))?)
	}
}

pub async fn parse_json_body<T: serde::de::DeserializeOwned>(req: &mut hyper::Request<Body>) -> Result<T> {
	let body = hyper::body::to_bytes(req.body_mut()).await.map_err(|_| ApiError::InvalidInput {
		fields: vec![],
		message: "body has no data",
	})?;

	// An absent body validates like an empty object.
	let body = if body.is_empty() { &b"{}"[..] } else { &body[..] };

	Ok(serde_json::from_slice(body).map_err(|_| ApiError::InvalidInput {
		fields: vec![],
		message: "body is not valid json",
	})?)
}
