//! Identity error types.

use thiserror::Error;

/// Error codes reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("auth/user-not-found")]
    UserNotFound,

    #[error("auth/wrong-password")]
    WrongPassword,

    #[error("auth/invalid-email")]
    InvalidEmail,

    #[error("auth/email-already-in-use")]
    EmailAlreadyInUse,

    #[error("auth/weak-password")]
    WeakPassword,

    #[error("auth/too-many-requests")]
    TooManyRequests,

    /// Anything the provider reports that has no entry in the message table.
    #[error("{0}")]
    Other(String),
}

impl From<sqlx::Error> for ProviderError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Identity database error: {:?}", err);
        ProviderError::Other(format!("Database error: {}", err))
    }
}

/// The session operation a provider error came from; selects the fallback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    Login,
    Register,
    Logout,
}

impl AuthAction {
    fn fallback_message(self) -> &'static str {
        match self {
            AuthAction::Login => "Login failed. Please try again.",
            AuthAction::Register => "Registration failed. Please try again.",
            AuthAction::Logout => "Failed to logout. Please try again.",
        }
    }
}

/// Map a provider error to the message shown to the user.
pub fn user_message(action: AuthAction, err: &ProviderError) -> &'static str {
    match err {
        ProviderError::UserNotFound => "No account found with this email.",
        ProviderError::WrongPassword => "Incorrect password.",
        ProviderError::InvalidEmail => "Please enter a valid email address.",
        ProviderError::EmailAlreadyInUse => "This email is already registered.",
        ProviderError::WeakPassword => "Password should be at least 6 characters long.",
        ProviderError::TooManyRequests => "Too many failed login attempts. Try again later.",
        ProviderError::Other(_) => action.fallback_message(),
    }
}

/// Failure of a session operation, ready to show to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    /// Rejected by the local password policy; the provider was not called.
    #[error("{0}")]
    Validation(String),

    /// Rejected by the identity provider.
    #[error("{reason}")]
    Rejected { code: String, reason: String },
}

impl AuthFailure {
    pub fn from_provider(action: AuthAction, err: &ProviderError) -> Self {
        let code = match err {
            ProviderError::Other(_) => "auth/unknown".to_string(),
            known => known.to_string(),
        };
        AuthFailure::Rejected {
            code,
            reason: user_message(action, err).to_string(),
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            AuthFailure::Validation(reason) => reason,
            AuthFailure::Rejected { reason, .. } => reason,
        }
    }
}
