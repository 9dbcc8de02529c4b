//! Social data and interactions for the Loop Social client core.
//!
//! This crate provides:
//! - [`TableStore`], the row-level seam, with the PostgREST client
//!   [`SupabaseTables`] and the in-process [`MemoryTables`]
//! - [`SocialRepository`], typed access to groups, posts, likes and profiles
//! - [`SocialActions`], the session-gated like, membership and post handlers
//! - Built-in [`fixtures`] for demo mode

mod actions;
mod error;
pub mod fixtures;
mod memory_tables;
pub mod models;
mod repository;
mod rest_client;
pub mod tables;

#[cfg(test)]
mod tests;

pub use actions::SocialActions;
pub use error::{SocialError, SocialResult};
pub use memory_tables::MemoryTables;
pub use models::{Author, Group, NewPost, Post, Profile};
pub use repository::SocialRepository;
pub use rest_client::SupabaseTables;
pub use tables::{Filter, Row, TableStore};
