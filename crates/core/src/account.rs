//! Account forms
//!
//! Local validation for sign-up, sign-in and profile changes. Every check
//! runs before any request is made; a failing form never reaches the API.

use serde::Serialize;

use crate::error::Error;
use crate::Result;

pub const MIN_PASSWORD_LENGTH: usize = 6;

fn required(value: &str, message: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(message));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<Self> {
        let name = required(&self.name, "Name is required")?;
        let email = required(&self.email, "Email is required")?;
        if self.password.is_empty() {
            return Err(Error::validation("Password is required"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::validation(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LENGTH
            )));
        }
        Ok(Self {
            name,
            email,
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<Self> {
        let email = required(&self.email, "Email is required")?;
        if self.password.is_empty() {
            return Err(Error::validation("Password is required"));
        }
        Ok(Self {
            email,
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
}

impl ProfileForm {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn validate(&self) -> Result<Self> {
        Ok(Self {
            name: required(&self.name, "Name is required")?,
            email: required(&self.email, "Email is required")?,
        })
    }
}

/// Password change request
///
/// The service exposes no password endpoint, so this form is validated and
/// handed to the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChangeForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm: String,
}

impl PasswordChangeForm {
    pub fn new(
        current_password: impl Into<String>,
        new_password: impl Into<String>,
        confirm: impl Into<String>,
    ) -> Self {
        Self {
            current_password: current_password.into(),
            new_password: new_password.into(),
            confirm: confirm.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.current_password.is_empty() {
            return Err(Error::validation("Current password is required"));
        }
        if self.new_password.is_empty() {
            return Err(Error::validation("New password is required"));
        }
        if self.new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::validation(format!(
                "New password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if self.new_password != self.confirm {
            return Err(Error::validation("Passwords do not match"));
        }
        Ok(())
    }
}
