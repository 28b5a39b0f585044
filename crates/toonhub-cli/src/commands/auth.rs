//! Auth command handlers
//!
//! Sign-in state lives with the hosted identity provider; these handlers
//! drive the provider client and report the resolved user.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::debug;

use toonhub_core::{
    Config, HostedAuthClient, IdentityProvider, SessionManager, SignUpOutcome, User,
};

use crate::output::{Output, OutputFormat};

/// Where the browser lands after an OAuth sign-in
///
/// Nothing listens there; the user copies the access token out of the
/// redirect URL and completes the sign-in with `login --token`.
const OAUTH_REDIRECT: &str = "http://localhost:53682/callback";

/// Sign in with email/password, an access token, or via GitHub
pub async fn login(
    email: Option<String>,
    github: bool,
    token: Option<String>,
    output: &Output,
) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let client = HostedAuthClient::from_config(&config)
        .context("Sign-in needs auth_url and auth_anon_key (see `toonhub config`)")?;

    if github {
        let url = client.oauth_authorize_url("github", OAUTH_REDIRECT)?;
        output.message("Opening the GitHub sign-in page...");
        if open::that(&url).is_err() {
            output.message(&format!("Open this URL in a browser:\n  {}", url));
        }
        output.message("After signing in, copy the access_token from the redirect URL and run:");
        output.message("  toonhub login --token <access_token>");
        return Ok(());
    }

    let session = if let Some(token) = token {
        client.sign_in_with_token(&token).await?
    } else {
        let email = match email {
            Some(email) => email,
            None => prompt("Email")?,
        };
        let password = prompt_password("Password")?;
        client.sign_in_with_password(&email, &password).await?
    };

    let user = User::from_provider(&session);
    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        output.success(&format!("Signed in as {}", user.username));
    }
    Ok(())
}

/// Create an account with email and password
pub async fn signup(email: String, output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let client = HostedAuthClient::from_config(&config)
        .context("Sign-up needs auth_url and auth_anon_key (see `toonhub config`)")?;

    let password = prompt_password("Password")?;
    let confirmation = prompt_password("Confirm password")?;
    if password != confirmation {
        bail!("Passwords do not match.");
    }

    match client.sign_up_with_password(&email, &password).await? {
        SignUpOutcome {
            session: Some(session),
        } => {
            let user = User::from_provider(&session);
            output.success(&format!("Account created. Signed in as {}", user.username));
        }
        SignUpOutcome { session: None } => {
            output.message(
                "Account created. Confirm the address from your inbox, then run `toonhub login`.",
            );
        }
    }
    Ok(())
}

/// Sign out of the current session
pub async fn logout(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    let client = match HostedAuthClient::from_config(&config) {
        Ok(client) => client,
        Err(_) => {
            output.message("Not signed in.");
            return Ok(());
        }
    };

    client.sign_out().await?;
    output.success("Signed out");
    Ok(())
}

/// Show the signed-in user
pub async fn whoami(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match current_user(&config).await {
        Some(user) => match output.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&user)?),
            OutputFormat::Quiet => println!("{}", user.id),
            OutputFormat::Human => {
                println!("Signed in as: {}", user.username);
                println!("User ID:      {}", user.id);
                println!("Avatar:       {}", user.avatar);
            }
        },
        None => output.message("Not signed in."),
    }
    Ok(())
}

/// Resolve the signed-in user, treating missing auth config as signed out
pub async fn current_user(config: &Config) -> Option<User> {
    let client = match HostedAuthClient::from_config(config) {
        Ok(client) => client,
        Err(_) => {
            debug!("Identity provider not configured, browsing signed out");
            return None;
        }
    };

    let manager = SessionManager::start(Arc::new(client)).await;
    manager.current_user()
}

fn prompt(label: &str) -> Result<String> {
    use std::io::{self, Write};

    print!("{}: ", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Prompt for a secret without echoing it back to the terminal
fn prompt_password(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{}: ", label)).context("Failed to read the password")
}
