//! Subcommand handlers. Each returns exactly one notification.

mod account;
mod prompt;
mod theme;

use anyhow::Result;
use motio_application::SessionStore;
use motio_core::{Notification, NotificationVariant};

use crate::Commands;
use crate::bootstrap::AppBootstrap;
use crate::output::Outcome;

pub async fn run(command: Commands, app: &AppBootstrap) -> Result<Outcome> {
    match command {
        Commands::Register {
            email,
            password,
            display_name,
        } => account::register(app, &email, &password, &display_name).await,
        Commands::Login { email, password } => account::login(app, &email, &password).await,
        Commands::Logout => account::logout(app).await,
        Commands::Whoami => account::whoami(app).await,
        Commands::Profile {
            display_name,
            photo_url,
        } => account::profile(app, &display_name, photo_url).await,
        Commands::Password {
            current,
            new,
            confirm,
        } => account::password(app, current, new, confirm).await,
        Commands::Improve { prompt } => prompt::improve(app, prompt).await,
        Commands::Animate { prompt, out } => prompt::animate(app, prompt, out.as_deref()).await,
        Commands::Theme {
            toggle,
            prefers_dark,
        } => theme::run(app, toggle, prefers_dark),
    }
}

/// The signed-in store, or `None` when the user must log in first.
async fn signed_in_store(app: &AppBootstrap) -> Result<Option<&SessionStore>> {
    let store = app.session_store().await?;
    let session = store.initialize().await?;
    if session.login_redirect_required() {
        tracing::debug!("[CLI] No session, redirecting to login");
        return Ok(None);
    }
    Ok(Some(store))
}

fn login_required() -> Outcome {
    Outcome::from(Notification {
        title: "Login Required".to_string(),
        description: "Please log in first.".to_string(),
        variant: NotificationVariant::Destructive,
    })
}
