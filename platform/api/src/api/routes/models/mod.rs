mod channel;
mod user;
mod video;

pub use channel::ChannelPayload;
pub use user::PublicUser;
pub use video::{CommentPayload, VideoPayload};
