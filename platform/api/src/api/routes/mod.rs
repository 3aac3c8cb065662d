use hyper::{Body, Request, Response, StatusCode};
use serde_json::json;

use super::error::Result;
use super::macros::make_response;

pub mod auth;
pub mod channels;
pub mod health;
pub mod models;
pub mod videos;

pub async fn not_found(req: Request<Body>) -> Result<Response<Body>> {
	Ok(make_response!(
		StatusCode::NOT_FOUND,
		json!({
			"message": format!("Cannot {} {}", req.method(), req.uri().path()),
			"success": false,
		})
	))
}
