//! Password policy checked before the identity provider is called.

use super::AuthFailure;
use crate::models::{LoginRequest, RegisterRequest};

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

pub fn check_login(request: &LoginRequest) -> Result<(), AuthFailure> {
    require_fields(&request.email, &request.password)
}

pub fn check_registration(request: &RegisterRequest) -> Result<(), AuthFailure> {
    require_fields(&request.email, &request.password)?;

    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthFailure::Validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }

    if request.password != request.confirm_password {
        return Err(AuthFailure::Validation(
            "Passwords do not match".to_string(),
        ));
    }

    Ok(())
}

fn require_fields(email: &str, password: &str) -> Result<(), AuthFailure> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AuthFailure::Validation(
            "Please fill in all fields".to_string(),
        ));
    }
    Ok(())
}
