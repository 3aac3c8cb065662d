use std::sync::Arc;

use hyper::http::header;
use hyper::Body;
use routerify::prelude::RequestExt as _;
use routerify::Middleware;

use crate::api::auth::{token_from_header, AuthData, AuthError};
use crate::api::error::RouteError;
use crate::api::ext::RequestGlobalExt as _;
use crate::api::jwt::{AuthJwtPayload, JwtState};
use crate::database::User;
use crate::global::GlobalState;

pub fn auth_middleware(_: &Arc<GlobalState>) -> Middleware<Body, RouteError> {
	Middleware::pre(|req| async move {
		let Some(token) = req.headers().get(header::AUTHORIZATION) else {
			// Not authenticated; protected routes reject on their own.
			return Ok(req);
		};

		let global = req.get_global()?;

		let token = token_from_header(token.to_str().map_err(|_| AuthError::HeaderToStr)?);

		let jwt = AuthJwtPayload::verify(&global.config.jwt, token).ok_or(AuthError::InvalidToken)?;

		let user = User::find_by_id(&global.db, jwt.user_id)
			.await?
			.ok_or(AuthError::UserNotFound)?;

		req.set_context(AuthData::new(user));

		Ok(req)
	})
}
