#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Authentication and the per-session user context.
//!
//! Credentials are checked by an external identity provider behind the
//! [`provider::IdentityProvider`] trait; [`gotrue::GoTrueClient`] talks to
//! a GoTrue-compatible auth API over HTTP. A [`context::SessionContext`]
//! pairs the provider's session with the matching `users` row and is
//! passed explicitly to whoever needs it. [`context::sign_up`] creates the
//! provider account first and stores the profile under its id.

pub mod context;
pub mod gotrue;
pub mod provider;

pub use context::{
    LoginOutcome, Navigation, PasswordReset, RestoreOutcome, SessionContext,
    request_password_reset, sign_up,
};
pub use gotrue::GoTrueClient;
pub use provider::{AuthError, AuthErrorKind, AuthSession, AuthUser, IdentityProvider};

use crime_watch_database::DbError;
use crime_watch_dispatch::DispatchError;

/// Errors surfaced by [`SessionContext`] operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The identity provider call failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Loading the user row failed.
    #[error(transparent)]
    Database(#[from] DbError),

    /// Validating or storing a new profile failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
