//! CLI command implementations.

mod auth;
mod social;

pub use auth::{authorize, login, logout, refresh, signup, status};
pub use social::{feed, groups_list, join, like, post};

use crate::client::Client;
use anyhow::Result;
use loop_auth::Decision;
use std::io::{self, Write};

/// Read one trimmed line after printing `label`.
fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

/// Use `value` if given, otherwise ask for it.
fn value_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None => prompt(label),
    }
}

/// Run the session guard for `path` the way a page navigation would.
async fn require_page(client: &Client, path: &str) -> Result<()> {
    match client.guard.authorize(path).await {
        Decision::Allow => Ok(()),
        Decision::Redirect(to) => {
            anyhow::bail!("Not logged in ({} redirects to {}). Run 'loop login'", path, to)
        }
    }
}
