use std::sync::Arc;

use chrono::Utc;
use hyper::{Body, Request, Response, StatusCode};
use mongodb::bson::oid::ObjectId;
use routerify::Router;
use serde_json::json;

use super::models::{CommentPayload, VideoPayload};
use crate::api::error::{ApiError, Result, RouteError};
use crate::api::ext::{parse_json_body, RequestExt as _, RequestGlobalExt as _};
use crate::api::macros::make_response;
use crate::database::{dedupe_by_source_url, Channel, Comment, ReactionAction, User, Video};
use crate::global::GlobalState;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CreateVideoRequest {
	title: String,
	description: String,
	#[serde(alias = "videoUrl")]
	url: String,
	thumbnail: Option<String>,
	channel_id: String,
	categories: Vec<String>,
	duration: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UpdateVideoRequest {
	action: Option<String>,
	title: Option<String>,
	description: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct CommentRequest {
	text: String,
}

async fn list(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global()?;

	let search = req.uri().query().and_then(|query| {
		url::form_urlencoded::parse(query.as_bytes())
			.find(|(key, _)| key == "search")
			.map(|(_, value)| value.into_owned())
	});

	let videos = Video::find_all(&global.db, search.as_deref()).await?;
	let videos = dedupe_by_source_url(videos);

	// Resolve uploader and channel display identities in two batched reads.
	let user_ids: Vec<ObjectId> = videos.iter().map(|video| video.user_id).collect();
	let channel_ids: Vec<ObjectId> = videos.iter().map(|video| video.channel_id).collect();

	let users = User::find_many(&global.db, &user_ids).await?;
	let channels = Channel::find_many(&global.db, &channel_ids).await?;

	let payload: Vec<VideoPayload> = videos
		.iter()
		.map(|video| {
			let mut payload = VideoPayload::from(video);
			if let Some(user) = users.get(&video.user_id) {
				payload = payload.with_uploader(user);
			}
			if let Some(channel) = channels.get(&video.channel_id) {
				payload = payload.with_channel(channel);
			}
			payload
		})
		.collect();

	Ok(make_response!(StatusCode::OK, json!(payload)))
}

async fn get(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global()?;
	let id = req.param_object_id("id", "Video")?;

	let video = Video::find_by_id_and_count_view(&global.db, id)
		.await?
		.ok_or(ApiError::NotFound("Video"))?;

	let mut payload = VideoPayload::from(&video);
	if let Some(user) = User::find_by_id(&global.db, video.user_id).await? {
		payload = payload.with_uploader(&user);
	}

	Ok(make_response!(StatusCode::OK, json!(payload)))
}

async fn create(mut req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global()?;
	let auth = req.auth()?;
	let body: CreateVideoRequest = parse_json_body(&mut req).await?;

	let mut fields = Vec::new();

	if body.title.trim().is_empty() {
		fields.push("title");
	}

	if body.url.trim().is_empty() {
		fields.push("url");
	}

	if body.channel_id.trim().is_empty() {
		fields.push("channelId");
	}

	if !fields.is_empty() {
		return Err(ApiError::InvalidInput {
			fields,
			message: "Title, video URL, and channel ID are required",
		}
		.into());
	}

	let channel_id = ObjectId::parse_str(body.channel_id.trim()).map_err(|_| ApiError::InvalidInput {
		fields: vec!["channelId"],
		message: "channelId is not a valid id",
	})?;

	let video = Video::new(
		body.title,
		body.description,
		body.url,
		body.thumbnail,
		auth.user_id(),
		channel_id,
		body.categories,
		body.duration,
	);

	video.insert(&global.db).await?;

	tracing::debug!(video_id = %video.id, user_id = %auth.user_id(), "video created");

	Ok(make_response!(StatusCode::CREATED, json!(VideoPayload::from(&video))))
}

async fn update(mut req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global()?;
	let auth = req.auth()?;
	let id = req.param_object_id("id", "Video")?;
	let body: UpdateVideoRequest = parse_json_body(&mut req).await?;

	let video = Video::find_by_id(&global.db, id)
		.await?
		.ok_or(ApiError::NotFound("Video"))?;

	let updated = if let Some(action) = &body.action {
		// Reactions are open to any authenticated user.
		let action: ReactionAction = action.parse().map_err(|_| ApiError::InvalidInput {
			fields: vec!["action"],
			message: "Invalid action",
		})?;

		Video::react(&global.db, id, auth.user_id(), action).await?
	} else {
		if !auth.owns(video.user_id) {
			return Err(ApiError::Forbidden("Not authorized to update this video").into());
		}

		Video::update_fields(&global.db, id, body.title, body.description).await?
	};

	let updated = updated.ok_or(ApiError::NotFound("Video"))?;

	Ok(make_response!(StatusCode::OK, json!(VideoPayload::from(&updated))))
}

async fn delete(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global()?;
	let auth = req.auth()?;
	let id = req.param_object_id("id", "Video")?;

	let video = Video::find_by_id(&global.db, id)
		.await?
		.ok_or(ApiError::NotFound("Video"))?;

	if !auth.owns(video.user_id) {
		return Err(ApiError::Forbidden("Not authorized to delete this video").into());
	}

	Video::delete(&global.db, id).await?;

	tracing::debug!(video_id = %id, user_id = %auth.user_id(), "video deleted");

	Ok(make_response!(
		StatusCode::OK,
		json!({ "message": "Video deleted successfully" })
	))
}

async fn add_comment(mut req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global()?;
	let auth = req.auth()?;
	let id = req.param_object_id("id", "Video")?;
	let body: CommentRequest = parse_json_body(&mut req).await?;

	if body.text.trim().is_empty() {
		return Err(ApiError::InvalidInput {
			fields: vec!["text"],
			message: "Comment text is required",
		}
		.into());
	}

	// The author's display identity is captured here and not refreshed by
	// later profile edits.
	let comment = Comment::new(&auth.user, body.text);

	if !Video::push_comment(&global.db, id, &comment).await? {
		return Err(ApiError::NotFound("Video").into());
	}

	Ok(make_response!(StatusCode::CREATED, json!(CommentPayload::from(&comment))))
}

async fn update_comment(mut req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global()?;
	let auth = req.auth()?;
	let video_id = req.param_object_id("id", "Video")?;
	let comment_id = req.param_object_id("cid", "Comment")?;
	let body: CommentRequest = parse_json_body(&mut req).await?;

	if body.text.trim().is_empty() {
		return Err(ApiError::InvalidInput {
			fields: vec!["text"],
			message: "Comment text is required",
		}
		.into());
	}

	let video = Video::find_by_id(&global.db, video_id)
		.await?
		.ok_or(ApiError::NotFound("Video"))?;

	let comment = video
		.comments
		.iter()
		.find(|comment| comment.id == comment_id)
		.ok_or(ApiError::NotFound("Comment"))?;

	// Authorship check, not video ownership.
	if !auth.owns(comment.user_id) {
		return Err(ApiError::Forbidden("Not authorized to edit this comment").into());
	}

	let updated_at = Utc::now();

	if !Video::update_comment(&global.db, video_id, comment_id, &body.text, updated_at).await? {
		return Err(ApiError::NotFound("Comment").into());
	}

	let payload = CommentPayload {
		text: body.text,
		updated_at,
		..CommentPayload::from(comment)
	};

	Ok(make_response!(StatusCode::OK, json!(payload)))
}

async fn delete_comment(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global()?;
	let auth = req.auth()?;
	let video_id = req.param_object_id("id", "Video")?;
	let comment_id = req.param_object_id("cid", "Comment")?;

	let video = Video::find_by_id(&global.db, video_id)
		.await?
		.ok_or(ApiError::NotFound("Video"))?;

	let comment = video
		.comments
		.iter()
		.find(|comment| comment.id == comment_id)
		.ok_or(ApiError::NotFound("Comment"))?;

	if !auth.owns(comment.user_id) {
		return Err(ApiError::Forbidden("Not authorized to delete this comment").into());
	}

	if !Video::pull_comment(&global.db, video_id, comment_id).await? {
		return Err(ApiError::NotFound("Comment").into());
	}

	Ok(make_response!(
		StatusCode::OK,
		json!({ "message": "Comment deleted successfully" })
	))
}

pub fn routes(_global: &Arc<GlobalState>) -> Router<Body, RouteError> {
	Router::builder()
		.get("/", list)
		.post("/", create)
		.get("/:id", get)
		.patch("/:id", update)
		.delete("/:id", delete)
		.post("/:id/comments", add_comment)
		.put("/:id/comments/:cid", update_comment)
		.delete("/:id/comments/:cid", delete_comment)
		.build()
		.expect("failed to build videos router")
}
