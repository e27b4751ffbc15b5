//! Account profile registration.

use argon2::Argon2;
use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};
use crime_watch_crime_models::UserType;
use crime_watch_database::queries;
use crime_watch_database_models::{NewUser, UserRow};
use switchy_database::Database;

use crate::{DispatchError, require};

/// Account details submitted at sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Identity provider user id to store the profile under. Generated
    /// when `None`.
    pub id: Option<String>,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Login e-mail.
    pub email: String,
    /// Plain-text password; only its hash is stored.
    pub password: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Account kind.
    pub user_type: UserType,
    /// Home address.
    pub address: Option<String>,
}

/// Checks that every required registration field is filled in.
///
/// # Errors
///
/// Returns [`DispatchError::Validation`] naming the first blank field.
pub fn validate_registration(registration: &Registration) -> Result<(), DispatchError> {
    require(&registration.first_name, "First name")?;
    require(&registration.last_name, "Last name")?;
    require(&registration.email, "Email")?;
    require(&registration.password, "Password")?;
    Ok(())
}

/// Creates an unverified, active account with an Argon2id password hash.
///
/// The returned row never carries the hash.
///
/// # Errors
///
/// * [`DispatchError::Validation`] if a required field is blank
/// * [`DispatchError::PasswordHash`] if hashing fails
/// * [`DispatchError::Database`] if the insert fails, e.g. the e-mail or
///   id is already registered
pub async fn register_user(
    db: &dyn Database,
    registration: Registration,
) -> Result<UserRow, DispatchError> {
    validate_registration(&registration)?;

    let password_hash = hash_password(&registration.password)?;

    let user = queries::insert_user(
        db,
        &NewUser {
            id: registration.id,
            email: registration.email.trim().to_string(),
            password_hash: Some(password_hash),
            first_name: registration.first_name,
            last_name: registration.last_name,
            phone: registration.phone,
            user_type: registration.user_type,
            address: registration.address,
            location: None,
            is_verified: false,
            is_active: true,
        },
    )
    .await?;

    log::info!("Registered {} account {}", user.user_type, user.id);

    Ok(user)
}

/// Hashes a password into an Argon2id PHC string with a random salt.
///
/// # Errors
///
/// Returns [`DispatchError::PasswordHash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, DispatchError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DispatchError::PasswordHash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    fn registration(email: &str) -> Registration {
        Registration {
            id: None,
            first_name: "Ngozi".to_string(),
            last_name: "Okafor".to_string(),
            email: email.to_string(),
            password: "correct horse battery".to_string(),
            phone: Some("+2348000000000".to_string()),
            user_type: UserType::Vigilante,
            address: None,
        }
    }

    #[test]
    fn hash_verifies_against_original_password() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2id$"));

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"s3cret", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"wrong", &parsed)
                .is_err()
        );
    }

    #[tokio::test]
    async fn new_accounts_are_active_and_unverified() {
        let db = test_db().await;
        let user = register_user(db.as_ref(), registration("ngozi@example.com"))
            .await
            .unwrap();

        assert!(user.is_active);
        assert!(!user.is_verified);
        assert_eq!(user.user_type, UserType::Vigilante);
        assert!(user.latitude.is_none());
    }

    #[tokio::test]
    async fn duplicate_email_fails_in_store() {
        let db = test_db().await;
        register_user(db.as_ref(), registration("dup@example.com"))
            .await
            .unwrap();

        let err = register_user(db.as_ref(), registration("dup@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Database(_)));
    }

    #[tokio::test]
    async fn provider_id_becomes_the_row_id() {
        let db = test_db().await;
        let mut input = registration("linked@example.com");
        input.id = Some("auth-7".to_string());

        let user = register_user(db.as_ref(), input).await.unwrap();
        assert_eq!(user.id, "auth-7");

        let stored = queries::get_user(db.as_ref(), "auth-7").await.unwrap();
        assert_eq!(stored.map(|u| u.email), Some("linked@example.com".to_string()));
    }

    #[test]
    fn validation_names_first_blank_field() {
        let mut input = registration("v@example.com");
        input.last_name = "  ".to_string();
        let err = validate_registration(&input).unwrap_err();
        assert_eq!(err.to_string(), "Last name is required");
    }

    #[tokio::test]
    async fn blank_password_is_rejected() {
        let db = test_db().await;
        let mut input = registration("blank@example.com");
        input.password = String::new();

        let err = register_user(db.as_ref(), input).await.unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
    }
}
