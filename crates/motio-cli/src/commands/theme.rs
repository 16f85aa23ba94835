use anyhow::Result;
use motio_core::{Notification, Theme};

use crate::bootstrap::AppBootstrap;
use crate::output::Outcome;

pub fn run(app: &AppBootstrap, toggle: bool, prefers_dark: bool) -> Result<Outcome> {
    let current = Theme::initial(app.config().ui.theme, prefers_dark);
    if !toggle {
        return Ok(Notification::success("Theme", format!("Current theme: {current}.")).into());
    }

    let next = current.toggle();
    Ok(
        match app
            .config_service()
            .update(|config| config.ui.theme = Some(next))
        {
            Ok(_) => {
                tracing::info!("[CLI] Theme switched to {}", next);
                Notification::success("Theme", format!("Switched to {next} theme.")).into()
            }
            Err(e) => Notification::failure("Error", &e, "Failed to save theme.").into(),
        },
    )
}
