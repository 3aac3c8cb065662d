mod channel;
mod user;
mod video;

pub use channel::Channel;
pub use user::User;
pub use video::{dedupe_by_source_url, Comment, ReactionAction, Video};

/// Unique-index violations surface as duplicate-key write errors; the
/// callers turn them into conflicts instead of internal errors.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
	use mongodb::error::{ErrorKind, WriteFailure};

	match &*err.kind {
		ErrorKind::Write(WriteFailure::WriteError(write_err)) => write_err.code == 11000,
		_ => false,
	}
}
