use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use motio_infrastructure::MotioPaths;

mod bootstrap;
mod commands;
mod logging;
mod output;

use bootstrap::AppBootstrap;
use output::Outcome;

#[derive(Parser)]
#[command(name = "motio")]
#[command(about = "motio - turn text prompts into animations", long_about = None)]
struct Cli {
    /// Configuration directory (defaults to the platform config dir)
    #[arg(long, global = true, env = "MOTIO_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        display_name: String,
    },
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Update display name and avatar
    Profile {
        #[arg(long)]
        display_name: String,
        /// Avatar URL; omit to clear it
        #[arg(long)]
        photo_url: Option<String>,
    },
    /// Change the account password
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
    /// Ask the model for a better animation prompt
    Improve { prompt: String },
    /// Generate an animation from a prompt
    Animate {
        prompt: String,
        /// Write the decoded animation to this file or directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show or toggle the color theme
    Theme {
        #[arg(long)]
        toggle: bool,
        /// Treat the system color scheme as dark
        #[arg(long, env = "MOTIO_PREFERS_DARK")]
        prefers_dark: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let paths = MotioPaths::new(cli.config_dir.as_deref());
    let app = AppBootstrap::new(paths)?;
    logging::init(&app.config().log_level);

    let outcome = execute(cli.command, &app).await?;
    output::print_outcome(&outcome);
    Ok(if outcome.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Runs one command and releases the session listener whether or not it failed.
async fn execute(command: Commands, app: &AppBootstrap) -> Result<Outcome> {
    let outcome = commands::run(command, app).await;
    app.shutdown().await;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use motio_core::user::{AuthUser, PersistedSession, SessionStorage};
    use motio_infrastructure::FileSessionStorage;

    const UNREACHABLE_CONFIG: &str = r#"
[identity]
endpoint = "http://127.0.0.1:9/v1"
token_endpoint = "http://127.0.0.1:9/v1"

[model]
endpoint = "http://127.0.0.1:9/v1beta/models"
timeout_secs = 1
"#;

    #[tokio::test]
    async fn test_execute_releases_session_after_failed_command() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), UNREACHABLE_CONFIG).unwrap();
        std::fs::write(
            dir.path().join("secret.json"),
            r#"{"identity":{"api_key":"test-key"}}"#,
        )
        .unwrap();
        FileSessionStorage::with_path(dir.path().join("session.json"))
            .save(&PersistedSession {
                user: AuthUser::new("uid-1", "ann@example.com"),
                id_token: "id".into(),
                refresh_token: "refresh".into(),
                expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
            })
            .await
            .unwrap();

        let app = AppBootstrap::new(MotioPaths::new(Some(dir.path()))).unwrap();
        // Signed in, but the model key is missing (or the model unreachable).
        let _ = execute(
            Commands::Improve {
                prompt: "a bouncing ball".into(),
            },
            &app,
        )
        .await;

        let store = app.session_store().await.unwrap();
        assert!(store.session().current_user.is_some());
        assert!(!store.is_listening());
    }
}
