//! Identity provider abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// A user as known to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Provider user id. Matches `users.id`.
    pub id: String,
    /// E-mail on record, if the provider returned one.
    pub email: Option<String>,
}

/// A signed-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Bearer token for subsequent calls.
    pub access_token: String,
    /// The signed-in user.
    pub user: AuthUser,
}

/// Classified identity-provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AuthErrorKind {
    /// Unknown e-mail or wrong password.
    InvalidCredentials,
    /// Account exists but has not been confirmed.
    UserNotConfirmed,
    /// The e-mail address has not been confirmed.
    EmailNotConfirmed,
    /// No account for that e-mail.
    UserNotFound,
    /// Password rejected.
    InvalidPassword,
    /// Account already registered.
    UserAlreadyExists,
    /// The provider could not be reached.
    Network,
    /// Anything else; the provider's message is shown as-is.
    Other,
}

/// An identity-provider error with its classification and raw message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct AuthError {
    /// Classification.
    pub kind: AuthErrorKind,
    /// Message as reported by the provider or transport.
    pub message: String,
}

impl AuthError {
    /// Creates an error of the given kind.
    #[must_use]
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the message to show an end user for this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self.kind {
            AuthErrorKind::InvalidCredentials => {
                "Invalid email or password. Please try again.".to_string()
            }
            AuthErrorKind::UserNotConfirmed => {
                "User not confirmed. Please check your email for confirmation link.".to_string()
            }
            AuthErrorKind::EmailNotConfirmed => {
                "Email not confirmed. Please check your email for confirmation link.".to_string()
            }
            AuthErrorKind::UserNotFound => "User not found. Please check your email.".to_string(),
            AuthErrorKind::InvalidPassword => "Invalid password. Please try again.".to_string(),
            AuthErrorKind::UserAlreadyExists => {
                "User already exists. Please use a different email.".to_string()
            }
            AuthErrorKind::Network => {
                "Network error. Please check your internet connection.".to_string()
            }
            AuthErrorKind::Other => self.message.clone(),
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        Self::new(AuthErrorKind::Network, e.to_string())
    }
}

/// Operations the session layer needs from an identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves an access token to its user. Returns `Ok(None)` when the
    /// token is unknown or expired.
    async fn current_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError>;

    /// Signs in with e-mail and password.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError>;

    /// Invalidates the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// Sends a password-reset e-mail to `email`.
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Creates an account and returns the provider's user. The account may
    /// still need e-mail confirmation before it can sign in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Sets a new password for the user behind `access_token`.
    async fn update_password(&self, access_token: &str, password: &str) -> Result<(), AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_kinds_use_fixed_messages() {
        let err = AuthError::new(AuthErrorKind::InvalidCredentials, "Invalid login credentials");
        assert_eq!(
            err.user_message(),
            "Invalid email or password. Please try again."
        );
        let err = AuthError::new(AuthErrorKind::EmailNotConfirmed, "Email not confirmed");
        assert_eq!(
            err.user_message(),
            "Email not confirmed. Please check your email for confirmation link."
        );
    }

    #[test]
    fn other_kind_passes_message_through() {
        let err = AuthError::new(AuthErrorKind::Other, "Signups not allowed for this instance");
        assert_eq!(err.user_message(), "Signups not allowed for this instance");
    }

    #[test]
    fn display_includes_kind() {
        let err = AuthError::new(AuthErrorKind::Network, "connection refused");
        assert_eq!(err.to_string(), "network: connection refused");
    }
}
