use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;
use serde_json::json;

use super::models::{ChannelPayload, VideoPayload};
use crate::api::error::{ApiError, Result, RouteError};
use crate::api::ext::{parse_json_body, RequestExt as _, RequestGlobalExt as _};
use crate::api::macros::make_response;
use crate::database::{is_duplicate_key, Channel, User, Video};
use crate::global::GlobalState;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct CreateChannelRequest {
	name: Option<String>,
	description: Option<String>,
	avatar: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UpdateChannelRequest {
	name: Option<String>,
	description: Option<String>,
	avatar: Option<String>,
}

fn already_has_channel(channel: &Channel) -> Response<Body> {
	// Idempotent from the client's view: the existing channel rides along.
	make_response!(
		StatusCode::BAD_REQUEST,
		json!({
			"success": false,
			"message": "User already has a channel",
			"channel": ChannelPayload::from(channel),
		})
	)
}

async fn create(mut req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global()?;
	let auth = req.auth()?;
	let body: CreateChannelRequest = parse_json_body(&mut req).await?;

	if let Some(channel_id) = auth.user.channel_id {
		if let Some(existing) = Channel::find_by_id(&global.db, channel_id).await? {
			return Ok(already_has_channel(&existing));
		}
	}

	let name = body
		.name
		.filter(|name| !name.trim().is_empty())
		.unwrap_or_else(|| format!("{}'s Channel", auth.user.username));
	let avatar = body.avatar.or_else(|| auth.user.avatar.clone());

	let channel = Channel::new(auth.user_id(), name, body.description.unwrap_or_default(), avatar);

	if let Err(err) = channel.insert(&global.db).await {
		// Two near-simultaneous creates race on the unique userId index;
		// the loser answers with the channel that won.
		if is_duplicate_key(&err) {
			if let Some(existing) = Channel::find_by_user_id(&global.db, auth.user_id()).await? {
				return Ok(already_has_channel(&existing));
			}
		}

		return Err(err.into());
	}

	User::set_channel(&global.db, auth.user_id(), channel.id).await?;

	tracing::debug!(channel_id = %channel.id, user_id = %auth.user_id(), "channel created");

	Ok(make_response!(
		StatusCode::CREATED,
		json!({
			"success": true,
			"message": "Channel created successfully",
			"channel": ChannelPayload::from(&channel),
		})
	))
}

async fn get(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global()?;
	let id = req.param_object_id("id", "Channel")?;

	let channel = Channel::find_by_id(&global.db, id)
		.await?
		.ok_or(ApiError::NotFound("Channel"))?;

	let videos = Video::find_by_user_id(&global.db, channel.user_id).await?;

	let videos: Vec<VideoPayload> = videos
		.iter()
		.map(|video| VideoPayload::from(video).with_channel(&channel))
		.collect();

	Ok(make_response!(
		StatusCode::OK,
		json!({
			"channel": ChannelPayload::from(&channel),
			"videos": videos,
		})
	))
}

async fn update(mut req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global()?;
	let auth = req.auth()?;
	let id = req.param_object_id("id", "Channel")?;
	let body: UpdateChannelRequest = parse_json_body(&mut req).await?;

	let channel = Channel::find_by_id(&global.db, id)
		.await?
		.ok_or(ApiError::NotFound("Channel"))?;

	if !auth.owns(channel.user_id) {
		return Err(ApiError::Forbidden("Not authorized to update this channel").into());
	}

	let updated = Channel::update_fields(&global.db, id, body.name, body.description, body.avatar)
		.await?
		.ok_or(ApiError::NotFound("Channel"))?;

	Ok(make_response!(
		StatusCode::OK,
		json!({ "channel": ChannelPayload::from(&updated) })
	))
}

pub fn routes(_global: &Arc<GlobalState>) -> Router<Body, RouteError> {
	Router::builder()
		.post("/", create)
		.get("/:id", get)
		.patch("/:id", update)
		.build()
		.expect("failed to build channels router")
}
