//! Per-session user context: sign-up, restore, login, logout and
//! password changes.

use crime_watch_crime_models::UserType;
use crime_watch_database::queries;
use crime_watch_database_models::UserRow;
use crime_watch_dispatch::account::{self, Registration};
use serde::Serialize;
use switchy_database::Database;

use crate::SessionError;
use crate::provider::IdentityProvider;

/// Where the client should go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Navigation {
    /// The login entry point.
    Login,
}

impl Navigation {
    /// Client route for this destination.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/auth/login",
        }
    }
}

/// Result of restoring a session from a stored token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// No token or no live session.
    Anonymous,
    /// Session and user row found; the context now holds the user.
    Restored,
    /// The provider knows the user but the `users` row is missing.
    RedirectToLogin,
}

/// Result of a login attempt, shaped for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Whether the user is now signed in.
    pub success: bool,
    /// Message to show the user.
    pub message: String,
    /// Account kind, on success.
    pub user_type: Option<UserType>,
    /// User id, on success.
    pub user_id: Option<String>,
    /// Bearer token, on success.
    pub access_token: Option<String>,
}

impl LoginOutcome {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            user_type: None,
            user_id: None,
            access_token: None,
        }
    }
}

/// Result of a password-reset request or password change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordReset {
    /// Whether the provider accepted the request.
    pub success: bool,
    /// Message to show the user.
    pub message: String,
}

/// The signed-in user and their access token, if any.
///
/// A context starts anonymous. It is authenticated exactly when it holds
/// a user row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    user: Option<UserRow>,
    access_token: Option<String>,
}

impl SessionContext {
    /// Creates an anonymous context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context that holds only a bearer token, e.g. to log it
    /// out without loading the user.
    #[must_use]
    pub fn from_access_token(access_token: impl Into<String>) -> Self {
        Self {
            user: None,
            access_token: Some(access_token.into()),
        }
    }

    /// The signed-in user's row.
    #[must_use]
    pub const fn user(&self) -> Option<&UserRow> {
        self.user.as_ref()
    }

    /// The current bearer token.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Whether a user is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    fn clear(&mut self) {
        self.user = None;
        self.access_token = None;
    }

    /// Restores the session for a stored access token.
    ///
    /// A provider failure is treated like an absent session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Database`] if the user row cannot be loaded.
    pub async fn restore(
        &mut self,
        identity: &dyn IdentityProvider,
        db: &dyn Database,
        access_token: Option<&str>,
    ) -> Result<RestoreOutcome, SessionError> {
        self.clear();

        let Some(token) = access_token.filter(|t| !t.is_empty()) else {
            return Ok(RestoreOutcome::Anonymous);
        };

        let auth_user = match identity.current_user(token).await {
            Ok(Some(user)) => user,
            Ok(None) => return Ok(RestoreOutcome::Anonymous),
            Err(e) => {
                log::warn!("Could not restore session: {e}");
                return Ok(RestoreOutcome::Anonymous);
            }
        };

        let Some(user) = queries::get_user(db, &auth_user.id).await? else {
            log::warn!(
                "Session for {} has no user profile; redirecting to login",
                auth_user.id
            );
            return Ok(RestoreOutcome::RedirectToLogin);
        };

        self.user = Some(user);
        self.access_token = Some(token.to_string());

        Ok(RestoreOutcome::Restored)
    }

    /// Signs in with e-mail and password and loads the user row.
    ///
    /// Provider rejections come back as an unsuccessful [`LoginOutcome`]
    /// with a user-facing message. The context is left untouched unless
    /// login succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Database`] if the user row cannot be loaded.
    pub async fn login(
        &mut self,
        identity: &dyn IdentityProvider,
        db: &dyn Database,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, SessionError> {
        let session = match identity.sign_in_with_password(email, password).await {
            Ok(session) => session,
            Err(e) => {
                log::info!("Login rejected ({})", e.kind);
                return Ok(LoginOutcome::failure(e.user_message()));
            }
        };

        let Some(user) = queries::get_user(db, &session.user.id).await? else {
            log::warn!("Login for {} has no user profile", session.user.id);
            return Ok(LoginOutcome::failure("User profile not found."));
        };

        let outcome = LoginOutcome {
            success: true,
            message: "Welcome back!".to_string(),
            user_type: Some(user.user_type),
            user_id: Some(user.id.clone()),
            access_token: Some(session.access_token.clone()),
        };

        self.user = Some(user);
        self.access_token = Some(session.access_token);

        Ok(outcome)
    }

    /// Ends the provider session and clears the context.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Auth`] if the provider refuses; the context
    /// keeps its state in that case.
    pub async fn logout(
        &mut self,
        identity: &dyn IdentityProvider,
    ) -> Result<Navigation, SessionError> {
        if let Some(token) = self.access_token.as_deref()
            && let Err(e) = identity.sign_out(token).await
        {
            log::error!("Logout failed: {e}");
            return Err(e.into());
        }

        self.clear();
        Ok(Navigation::Login)
    }

    /// Sets a new password for the signed-in user.
    ///
    /// Provider rejections come back as an unsuccessful [`PasswordReset`]
    /// carrying the provider's message.
    pub async fn update_password(
        &self,
        identity: &dyn IdentityProvider,
        password: &str,
    ) -> PasswordReset {
        let Some(token) = self.access_token.as_deref() else {
            return PasswordReset {
                success: false,
                message: "Auth session missing!".to_string(),
            };
        };

        match identity.update_password(token, password).await {
            Ok(()) => PasswordReset {
                success: true,
                message: "Password updated successfully".to_string(),
            },
            Err(e) => {
                log::warn!("Password update failed: {e}");
                PasswordReset {
                    success: false,
                    message: e.message,
                }
            }
        }
    }
}

/// Creates the account with the identity provider, then stores its
/// profile under the provider's user id so that login can find it.
///
/// A profile insert failure leaves the provider account in place.
///
/// # Errors
///
/// * [`SessionError::Dispatch`] if a field is blank or the profile insert
///   fails
/// * [`SessionError::Auth`] if the provider rejects the sign-up
pub async fn sign_up(
    identity: &dyn IdentityProvider,
    db: &dyn Database,
    mut registration: Registration,
) -> Result<UserRow, SessionError> {
    account::validate_registration(&registration)?;

    let auth_user = identity
        .sign_up(registration.email.trim(), &registration.password)
        .await
        .inspect_err(|e| log::info!("Sign-up rejected ({})", e.kind))?;

    registration.id = Some(auth_user.id);
    let user = account::register_user(db, registration).await?;

    Ok(user)
}

/// Asks the provider to e-mail a password-reset link.
pub async fn request_password_reset(identity: &dyn IdentityProvider, email: &str) -> PasswordReset {
    match identity.send_password_reset(email).await {
        Ok(()) => PasswordReset {
            success: true,
            message: "Password reset email sent successfully".to_string(),
        },
        Err(e) => {
            log::warn!("Password reset request failed: {e}");
            PasswordReset {
                success: false,
                message: e.message,
            }
        }
    }
}
