use colored::Colorize;
use motio_core::Notification;

/// What a command prints: one notification, optionally followed by a result
/// body (an improved prompt, a saved file path).
#[derive(Debug)]
pub struct Outcome {
    pub notification: Notification,
    pub detail: Option<String>,
}

impl Outcome {
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_failure(&self) -> bool {
        self.notification.is_destructive()
    }
}

impl From<Notification> for Outcome {
    fn from(notification: Notification) -> Self {
        Self {
            notification,
            detail: None,
        }
    }
}

/// Renders a notification as `title: description`.
pub fn format_notification(notification: &Notification) -> String {
    let title = if notification.is_destructive() {
        notification.title.red().bold()
    } else {
        notification.title.green().bold()
    };
    format!("{title}: {}", notification.description)
}

pub fn print_outcome(outcome: &Outcome) {
    println!("{}", format_notification(&outcome.notification));
    if let Some(detail) = &outcome.detail {
        println!("{detail}");
    }
}
