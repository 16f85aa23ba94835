//! Notification text for each user-facing flow.

use motio_core::{AuthErrorReason, MotioError, Notification, NotificationVariant};

/// A user action that ends in exactly one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Register,
    Login,
    Generate,
    Improve,
    Password,
    Profile,
}

struct FlowText {
    success_title: &'static str,
    success_description: &'static str,
    failure_title: &'static str,
    fallback: &'static str,
}

impl Flow {
    fn text(self) -> FlowText {
        let (success_title, success_description, failure_title, fallback) = match self {
            Flow::Register => (
                "Registration Successful!",
                "Your account has been created successfully.",
                "Registration Failed",
                "Failed to create account.",
            ),
            Flow::Login => (
                "Login Successful!",
                "You have successfully logged in.",
                "Login Failed",
                "Invalid credentials.",
            ),
            Flow::Generate => (
                "Animation Generated!",
                "Your animation has been generated successfully.",
                "Error",
                "Failed to generate animation.",
            ),
            Flow::Improve => (
                "Prompt Improved!",
                "Your prompt has been improved by AI.",
                "Error",
                "Failed to improve prompt.",
            ),
            Flow::Password => (
                "Success",
                "Your password has been updated.",
                "Error",
                "Failed to update password.",
            ),
            Flow::Profile => (
                "Profile Updated",
                "Your profile has been updated.",
                "Error",
                "Failed to update profile.",
            ),
        };
        FlowText {
            success_title,
            success_description,
            failure_title,
            fallback,
        }
    }

    pub fn success(self) -> Notification {
        let text = self.text();
        Notification::success(text.success_title, text.success_description)
    }

    pub fn failure(self, error: &MotioError) -> Notification {
        let text = self.text();
        // Re-authentication only ever checks the current password here.
        if self == Flow::Password
            && error.auth_reason() == Some(&AuthErrorReason::WrongCredentials)
        {
            return Notification {
                title: text.failure_title.to_string(),
                description: "Incorrect current password.".to_string(),
                variant: NotificationVariant::Destructive,
            };
        }
        Notification::failure(text.failure_title, error, text.fallback)
    }
}
