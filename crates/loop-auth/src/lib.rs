//! Session guard and credential flows for the Loop Social client core.
//!
//! This crate provides:
//! - [`SessionGuard`], which decides whether a navigation may proceed
//! - [`Authenticator`], the sign-in, sign-up and sign-out flows
//! - [`AuthProvider`], the remote auth seam, with the [`SupabaseAuth`]
//!   adapter and the in-process [`MemoryAuth`]
//! - The session state machine shared by the guard and the authenticator

mod authenticator;
mod error;
mod guard;
mod memory_auth;
mod provider;
mod routes;
pub mod session_fsm;
mod supabase_auth;
mod tracker;

pub use authenticator::{Authenticator, ProfileSeed, ProfileWriter};
pub use error::{AuthError, AuthResult};
pub use guard::SessionGuard;
pub use memory_auth::MemoryAuth;
pub use provider::{AuthProvider, RemoteSession, RemoteUser, SignUpMetadata, SignUpOutcome};
pub use routes::{Decision, RouteTable};
pub use session_fsm::{RefreshConfig, SessionState, SessionStateCallback, SessionStateChanged};
pub use supabase_auth::SupabaseAuth;
pub use tracker::SessionTracker;
