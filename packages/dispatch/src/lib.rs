#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Crime report lifecycle and responder dispatch.
//!
//! Each workflow here is a short sequence of store calls:
//!
//! - [`report::submit_report`] inserts a report and fans it out to
//!   responders chosen by a [`selector::ResponderSelector`].
//! - [`response::update_response`] applies a responder's status change and
//!   cascades `arrived`/`completed` onto the parent report.
//! - [`sos::raise_sos`] records an emergency alert and counts who could
//!   answer it.
//! - [`account::register_user`] stores an account profile.
//!
//! None of these run in a transaction. The follow-up step of a workflow
//! (fan-out, cascade, responder count) is best-effort: its failure is
//! logged and the primary write stands.

pub mod account;
pub mod report;
pub mod response;
pub mod selector;
pub mod sos;

use crime_watch_database::DbError;

/// Errors returned by dispatch workflows.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The input failed validation. The message is safe to show to clients.
    #[error("{0}")]
    Validation(String),

    /// A store call failed.
    #[error(transparent)]
    Database(#[from] DbError),

    /// No response exists for the given report and responder.
    #[error("No response found for report {crime_report_id} and responder {vigilante_id}")]
    ResponseNotFound {
        /// Report id from the request.
        crime_report_id: String,
        /// Responder id from the request.
        vigilante_id: String,
    },

    /// The password could not be hashed.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

/// Fails with [`DispatchError::Validation`] when `value` is blank.
pub(crate) fn require(value: &str, label: &str) -> Result<(), DispatchError> {
    if value.trim().is_empty() {
        return Err(DispatchError::Validation(format!("{label} is required")));
    }
    Ok(())
}

/// Fails with [`DispatchError::Validation`] when a coordinate is out of
/// range.
pub(crate) fn require_location(
    location: crime_watch_database_models::Coordinates,
) -> Result<(), DispatchError> {
    if !(-90.0..=90.0).contains(&location.latitude) {
        return Err(DispatchError::Validation(
            "Latitude must be between -90 and 90".to_string(),
        ));
    }
    if !(-180.0..=180.0).contains(&location.longitude) {
        return Err(DispatchError::Validation(
            "Longitude must be between -180 and 180".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crime_watch_crime_models::UserType;
    use crime_watch_database::{db::open_sqlite, queries};
    use crime_watch_database_models::{Coordinates, NewUser, UserRow};
    use switchy_database::Database;

    pub async fn test_db() -> Box<dyn Database> {
        let path =
            std::env::temp_dir().join(format!("crime_watch_dispatch_{}.db", uuid::Uuid::new_v4()));
        open_sqlite(&path).await.unwrap()
    }

    pub async fn add_user(
        db: &dyn Database,
        name: &str,
        user_type: UserType,
        location: Option<Coordinates>,
        is_active: bool,
    ) -> UserRow {
        queries::insert_user(
            db,
            &NewUser {
                id: None,
                email: format!("{name}@example.com"),
                password_hash: None,
                first_name: name.to_string(),
                last_name: "Test".to_string(),
                phone: None,
                user_type,
                address: None,
                location,
                is_verified: false,
                is_active,
            },
        )
        .await
        .unwrap()
    }
}
