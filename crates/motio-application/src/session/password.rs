use motio_core::ValidationError;

/// Input of the change-password flow.
#[derive(Clone, Default)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl ChangePasswordForm {
    pub fn new(
        current_password: impl Into<String>,
        new_password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            current_password: current_password.into(),
            new_password: new_password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    /// Mismatch is reported before missing fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.new_password != self.confirm_password {
            return Err(ValidationError::new(
                "confirmPassword",
                "New passwords do not match.",
            ));
        }
        if self.current_password.is_empty()
            || self.new_password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(ValidationError::new(
                "password",
                "Please fill in all password fields.",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ChangePasswordForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChangePasswordForm { .. }")
    }
}
