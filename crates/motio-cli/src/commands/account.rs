use anyhow::Result;
use motio_application::{ChangePasswordForm, Flow};
use motio_core::Notification;

use super::{login_required, signed_in_store};
use crate::bootstrap::AppBootstrap;
use crate::output::Outcome;

fn notify(flow: Flow, result: motio_core::Result<()>) -> Outcome {
    match result {
        Ok(()) => flow.success().into(),
        Err(e) => {
            tracing::debug!("[CLI] {:?} failed: {}", flow, e);
            flow.failure(&e).into()
        }
    }
}

pub async fn register(
    app: &AppBootstrap,
    email: &str,
    password: &str,
    display_name: &str,
) -> Result<Outcome> {
    let store = app.session_store().await?;
    Ok(notify(
        Flow::Register,
        store.sign_up(email, password, display_name).await,
    ))
}

pub async fn login(app: &AppBootstrap, email: &str, password: &str) -> Result<Outcome> {
    let store = app.session_store().await?;
    let result = match store.sign_in(email, password).await {
        // Wait for the notification so the session is on disk before exit.
        Ok(()) => store.settled().await.map(|_| ()),
        Err(e) => Err(e),
    };
    Ok(notify(Flow::Login, result))
}

pub async fn logout(app: &AppBootstrap) -> Result<Outcome> {
    let store = app.session_store().await?;
    Ok(match store.sign_out().await {
        Ok(()) => Notification::success("Logged Out", "You have been logged out.").into(),
        Err(e) => Notification::failure("Error", &e, "Failed to log out.").into(),
    })
}

pub async fn whoami(app: &AppBootstrap) -> Result<Outcome> {
    let Some(store) = signed_in_store(app).await? else {
        return Ok(login_required());
    };
    let Some(user) = store.session().current_user else {
        return Ok(login_required());
    };

    let description = match (&user.display_name, &user.email) {
        (Some(name), Some(email)) => format!("{name} <{email}>"),
        _ => user.label().to_string(),
    };
    let outcome = Outcome::from(Notification::success("Signed In", description));
    Ok(match &user.photo_url {
        Some(url) => outcome.with_detail(format!("Avatar: {url}")),
        None => outcome,
    })
}

pub async fn profile(
    app: &AppBootstrap,
    display_name: &str,
    photo_url: Option<String>,
) -> Result<Outcome> {
    let Some(store) = signed_in_store(app).await? else {
        return Ok(login_required());
    };
    Ok(notify(
        Flow::Profile,
        store.update_user(display_name, photo_url).await,
    ))
}

pub async fn password(
    app: &AppBootstrap,
    current: String,
    new: String,
    confirm: String,
) -> Result<Outcome> {
    let Some(store) = signed_in_store(app).await? else {
        return Ok(login_required());
    };
    let form = ChangePasswordForm::new(current, new, confirm);
    Ok(notify(Flow::Password, store.change_password(&form).await))
}
