//! Authentication commands.

use super::value_or_prompt;
use crate::client::Client;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use loop_auth::{AuthError, Decision};
use loop_config::DataMode;
use loop_social::fixtures;
use loop_storage::ActorSession;

/// Login with email and password.
pub async fn login(client: &Client, email: Option<String>, format: &OutputFormat) -> Result<()> {
    if let Some(user_id) = client.user_id() {
        output::print_success(&format!("Already logged in as {}", user_id), format);
        return Ok(());
    }

    if client.mode == DataMode::Demo && email.is_none() {
        println!(
            "Demo account: {} / {}",
            fixtures::DEMO_EMAIL,
            fixtures::DEMO_PASSWORD
        );
    }
    let email = value_or_prompt(email, "Email")?;
    let password = rpassword::prompt_password("Password: ")?;

    println!("Logging in...");

    match client.authenticator.sign_in(&email, &password).await {
        Ok(session) => {
            let user = session.user_id().unwrap_or("user");
            output::print_success(&format!("Logged in as {}", user), format);
        }
        Err(AuthError::InvalidCredentials(message)) | Err(AuthError::ValidationFailure(message)) => {
            output::print_error(&format!("Login failed: {}", message), format);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Create an account and sign in.
pub async fn signup(
    client: &Client,
    name: Option<String>,
    email: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let name = value_or_prompt(name, "Full name")?;
    let email = value_or_prompt(email, "Email")?;
    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;

    if password != confirm {
        output::print_error("Passwords do not match", format);
        return Ok(());
    }

    match client.authenticator.sign_up(&email, &password, &name).await {
        Ok(session) => match session.user_id() {
            Some(user) => {
                output::print_success(&format!("Account created. Logged in as {}", user), format);
                println!("Complete your profile at {}", client.guard.routes().onboarding_path);
            }
            None => output::print_success(
                "Account created. Check your email to confirm it, then run 'loop login'",
                format,
            ),
        },
        Err(AuthError::ValidationFailure(message)) => {
            output::print_error(&format!("Sign-up failed: {}", message), format);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Exchange the refresh token for a new session, retrying network failures.
pub async fn refresh(client: &Client, format: &OutputFormat) -> Result<()> {
    let Some(supabase) = &client.supabase else {
        output::print_success("Demo sessions have no tokens to refresh", format);
        return Ok(());
    };

    match supabase.refresh_session().await? {
        Some(session) => {
            client
                .lifecycle
                .commit(ActorSession::authenticated(session.user.id.as_str()))?;
            let expires = session
                .expires_at
                .map(|t| format!(" until {}", t.format("%Y-%m-%d %H:%M UTC")))
                .unwrap_or_default();
            output::print_success(
                &format!("Session refreshed for {}{}", session.user.id, expires),
                format,
            );
        }
        None => {
            client.lifecycle.clear()?;
            output::print_error("Session expired. Run 'loop login'", format);
        }
    }
    Ok(())
}

/// Logout and clear session.
pub async fn logout(client: &Client, format: &OutputFormat) -> Result<()> {
    client.authenticator.sign_out().await?;
    output::print_success("Logged out successfully", format);
    Ok(())
}

/// Check authentication status.
pub async fn status(client: &Client, format: &OutputFormat) -> Result<()> {
    let cached = client.lifecycle.current();
    let home = client.guard.landing_path().to_string();
    let decision = client.guard.authorize(&home).await;
    let verified = client.lifecycle.current();

    match format {
        OutputFormat::Text => {
            output::print_heading("Loop Social");
            output::print_row("Data", &client.mode.to_string());
            output::print_row("Session", &format!("{:?}", client.guard.state()));
            match verified.user_id() {
                Some(user_id) => output::print_row("User", user_id),
                None => output::print_row("User", "not logged in"),
            }
            if let Some(at) = verified.last_verified() {
                output::print_row("Verified", &at.to_rfc3339());
            }
            if cached.is_authenticated() && !verified.is_authenticated() {
                println!("\nThe stored session was no longer valid and has been cleared.");
            }
        }
        OutputFormat::Json => {
            output::print_json(&serde_json::json!({
                "data_mode": client.mode,
                "state": client.guard.state(),
                "logged_in": verified.is_authenticated(),
                "user_id": verified.user_id(),
                "verified_at": verified.last_verified(),
                "home_allowed": decision.is_allow(),
            }));
        }
    }
    Ok(())
}

/// Check whether a page may be shown.
pub async fn authorize(client: &Client, path: &str, format: &OutputFormat) -> Result<()> {
    if path == "/" {
        let landing = client.guard.landing_path();
        match format {
            OutputFormat::Text => println!("redirect {}", landing),
            OutputFormat::Json => output::print_json(&serde_json::json!({
                "path": path,
                "decision": "redirect",
                "location": landing,
            })),
        }
        return Ok(());
    }

    let decision = client.guard.authorize(path).await;
    match format {
        OutputFormat::Text => match &decision {
            Decision::Allow => println!("allow"),
            Decision::Redirect(to) => println!("redirect {}", to),
        },
        OutputFormat::Json => {
            let (kind, location) = match &decision {
                Decision::Allow => ("allow", None),
                Decision::Redirect(to) => ("redirect", Some(to.as_str())),
            };
            output::print_json(&serde_json::json!({
                "path": path,
                "decision": kind,
                "location": location,
            }));
        }
    }

    Ok(())
}
