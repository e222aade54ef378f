use serde::Deserialize;
use validator::Validate;

use super::FieldErrors;
use crate::error::AppError;
use crate::sanitize::{is_valid_email, normalize_email};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: String,
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signup {
    pub name: String,
    pub email: String,
    pub password: String,
}

fn check_email(errors: &mut FieldErrors, email: &str) -> String {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        errors.push("email", "Please provide a valid email address");
    }
    email
}

impl SignupRequest {
    pub fn into_command(self) -> Result<Signup, AppError> {
        let mut errors = FieldErrors::validate(&self);
        if self.name.trim().is_empty() && !errors.has("name") {
            errors.push("name", "Name is required");
        }
        let email = check_email(&mut errors, &self.email);
        errors.into_result()?;

        Ok(Signup {
            name: self.name.trim().to_string(),
            email,
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Login {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn into_command(self) -> Result<Login, AppError> {
        let mut errors = FieldErrors::default();
        if self.email.trim().is_empty() {
            errors.push("email", "Email is required");
        }
        if self.password.is_empty() {
            errors.push("password", "Password is required");
        }
        errors.into_result()?;

        Ok(Login {
            email: normalize_email(&self.email),
            password: self.password,
        })
    }
}

/// Body of `/auth/refresh` and `/auth/logout`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

impl RefreshRequest {
    pub fn into_token(self) -> Result<String, AppError> {
        let token = self.refresh_token.trim().to_string();
        if token.is_empty() {
            return Err(AppError::validation(
                "refreshToken",
                "Refresh token is required",
            ));
        }
        Ok(token)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

impl ForgotPasswordRequest {
    pub fn into_email(self) -> Result<String, AppError> {
        let mut errors = FieldErrors::default();
        let email = check_email(&mut errors, &self.email);
        errors.into_result()?;
        Ok(email)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResetPassword {
    pub token: String,
    pub password: String,
}

impl ResetPasswordRequest {
    pub fn into_command(self) -> Result<ResetPassword, AppError> {
        FieldErrors::validate(&self).into_result()?;
        Ok(ResetPassword {
            token: self.token.trim().to_string(),
            password: self.password,
        })
    }
}
