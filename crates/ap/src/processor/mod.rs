//! Per-activity inbox processors.

mod accept;
mod announce;
mod create;
mod delete;
mod follow;
mod like;
mod undo;

pub use accept::AcceptProcessor;
pub use announce::AnnounceProcessor;
pub use create::CreateProcessor;
pub use delete::DeleteProcessor;
pub use follow::FollowProcessor;
pub use like::LikeProcessor;
pub use undo::UndoProcessor;
