//! Optimistic interactions for the Loop Social client core.
//!
//! Likes and group memberships are toggled locally first and written to the
//! remote store afterwards. This crate provides:
//! - [`OptimisticMutator`], which applies toggles and runs their writes on
//!   per-target lanes
//! - [`TargetCollection`], the screen-owned set of [`InteractionTarget`]s
//! - [`NoticeSink`], through which failures reach the actor

mod error;
mod mutator;
mod notice;
mod target;

#[cfg(test)]
mod tests;

pub use error::{InteractionError, InteractionResult};
pub use mutator::{OptimisticMutator, PendingToggle, RemoteWrite, ToggleOutcome};
pub use notice::{Notice, NoticeKind, NoticeSink, NullNotices, RecordingNotices};
pub use target::{InteractionTarget, TargetCollection, TargetId, TargetKind, TargetState};
