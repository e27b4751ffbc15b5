//! HTTP client for a GoTrue-compatible auth API.
//!
//! Every request carries the project's anonymous key in the `apikey`
//! header; user-scoped calls add `Authorization: Bearer <access token>`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::provider::{AuthError, AuthErrorKind, AuthSession, AuthUser, IdentityProvider};

/// Identity provider backed by the GoTrue REST API under `/auth/v1`.
#[derive(Debug, Clone)]
pub struct GoTrueClient {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl GoTrueClient {
    /// Creates a client for the auth API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            anon_key: anon_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn current_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError> {
        let resp = self
            .client
            .get(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let (status, body) = read_body(resp).await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(parse_error(status, &body));
        }

        parse_user(&body).map(Some)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let resp = self
            .client
            .post(self.endpoint("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let (status, body) = read_body(resp).await?;

        if !status.is_success() {
            return Err(parse_error(status, &body));
        }

        parse_session(&body)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let resp = self
            .client
            .post(self.endpoint("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let (status, body) = read_body(resp).await?;

        // An expired or unknown token has no session left to end.
        if status.is_success()
            || status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
            || status == StatusCode::NOT_FOUND
        {
            return Ok(());
        }

        Err(parse_error(status, &body))
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let resp = self
            .client
            .post(self.endpoint("recover"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;

        let (status, body) = read_body(resp).await?;

        if !status.is_success() {
            return Err(parse_error(status, &body));
        }

        Ok(())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let resp = self
            .client
            .post(self.endpoint("signup"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let (status, body) = read_body(resp).await?;

        if !status.is_success() {
            return Err(parse_error(status, &body));
        }

        parse_sign_up(&body)
    }

    async fn update_password(&self, access_token: &str, password: &str) -> Result<(), AuthError> {
        let resp = self
            .client
            .put(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "password": password }))
            .send()
            .await?;

        let (status, body) = read_body(resp).await?;

        if !status.is_success() {
            return Err(parse_error(status, &body));
        }

        Ok(())
    }
}

/// Reads a response body as JSON. Empty bodies become `Null` and
/// non-JSON bodies become a JSON string.
async fn read_body(resp: reqwest::Response) -> Result<(StatusCode, Value), AuthError> {
    let status = resp.status();
    let text = resp.text().await?;

    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };

    Ok((status, body))
}

/// Parses a token-grant response.
fn parse_session(body: &Value) -> Result<AuthSession, AuthError> {
    let access_token = body["access_token"]
        .as_str()
        .ok_or_else(|| AuthError::new(AuthErrorKind::Other, "Missing access_token in response"))?
        .to_string();

    let user = parse_user(&body["user"])?;

    Ok(AuthSession { access_token, user })
}

/// Parses a sign-up response: a session when the server auto-confirms,
/// otherwise the bare user awaiting confirmation.
fn parse_sign_up(body: &Value) -> Result<AuthUser, AuthError> {
    if body["user"].is_object() {
        parse_user(&body["user"])
    } else {
        parse_user(body)
    }
}

/// Parses a user object.
fn parse_user(body: &Value) -> Result<AuthUser, AuthError> {
    let id = body["id"]
        .as_str()
        .ok_or_else(|| AuthError::new(AuthErrorKind::Other, "Missing user id in response"))?
        .to_string();

    Ok(AuthUser {
        id,
        email: body["email"].as_str().map(String::from),
    })
}

/// Builds an [`AuthError`] from an error response.
///
/// Newer servers send `{"code", "error_code", "msg"}`; older ones send
/// `{"error", "error_description"}`.
fn parse_error(status: StatusCode, body: &Value) -> AuthError {
    let message = ["msg", "error_description", "message"]
        .iter()
        .find_map(|key| body[*key].as_str())
        .or_else(|| body["error"].as_str())
        .or_else(|| body.as_str())
        .map_or_else(
            || {
                status
                    .canonical_reason()
                    .unwrap_or("Authentication request failed")
                    .to_string()
            },
            String::from,
        );

    let code = body["error_code"].as_str().or_else(|| body["error"].as_str());
    let kind = classify(code, &message);

    log::debug!("Auth API returned {status} ({kind}): {message}");

    AuthError::new(kind, message)
}

/// Maps a provider error code and message onto an [`AuthErrorKind`].
fn classify(code: Option<&str>, message: &str) -> AuthErrorKind {
    match code {
        Some("invalid_credentials") => return AuthErrorKind::InvalidCredentials,
        Some("email_not_confirmed") => return AuthErrorKind::EmailNotConfirmed,
        Some("user_not_found") => return AuthErrorKind::UserNotFound,
        Some("user_already_exists" | "email_exists") => return AuthErrorKind::UserAlreadyExists,
        _ => {}
    }

    let lower = message.to_lowercase();
    if lower.contains("invalid login credentials") {
        AuthErrorKind::InvalidCredentials
    } else if lower.contains("user not confirmed") {
        AuthErrorKind::UserNotConfirmed
    } else if lower.contains("email not confirmed") {
        AuthErrorKind::EmailNotConfirmed
    } else if lower.contains("user not found") {
        AuthErrorKind::UserNotFound
    } else if lower.contains("invalid password") {
        AuthErrorKind::InvalidPassword
    } else if lower.contains("already registered") || lower.contains("user already exists") {
        AuthErrorKind::UserAlreadyExists
    } else {
        AuthErrorKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_grant() {
        let body = serde_json::json!({
            "access_token": "jwt-abc",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": { "id": "2f0c", "email": "a@example.com" }
        });
        let session = parse_session(&body).unwrap();
        assert_eq!(session.access_token, "jwt-abc");
        assert_eq!(session.user.id, "2f0c");
        assert_eq!(session.user.email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn token_grant_without_user_is_an_error() {
        let body = serde_json::json!({ "access_token": "jwt-abc" });
        assert!(parse_session(&body).is_err());
    }

    #[test]
    fn parses_both_sign_up_shapes() {
        let pending = serde_json::json!({
            "id": "9a1e",
            "email": "new@example.com",
            "confirmation_sent_at": "2024-05-01T21:30:00Z"
        });
        assert_eq!(parse_sign_up(&pending).unwrap().id, "9a1e");

        let confirmed = serde_json::json!({
            "access_token": "jwt-abc",
            "user": { "id": "9a1e", "email": "new@example.com" }
        });
        let user = parse_sign_up(&confirmed).unwrap();
        assert_eq!(user.id, "9a1e");
        assert_eq!(user.email.as_deref(), Some("new@example.com"));

        assert!(parse_sign_up(&serde_json::json!({})).is_err());
    }

    #[test]
    fn classifies_existing_account_on_sign_up() {
        let body = serde_json::json!({
            "code": 422,
            "error_code": "user_already_exists",
            "msg": "User already registered"
        });
        let err = parse_error(StatusCode::UNPROCESSABLE_ENTITY, &body);
        assert_eq!(err.kind, AuthErrorKind::UserAlreadyExists);
        assert_eq!(
            err.user_message(),
            "User already exists. Please use a different email."
        );
    }

    #[test]
    fn classifies_new_style_error_codes() {
        let body = serde_json::json!({
            "code": 400,
            "error_code": "invalid_credentials",
            "msg": "Invalid login credentials"
        });
        let err = parse_error(StatusCode::BAD_REQUEST, &body);
        assert_eq!(err.kind, AuthErrorKind::InvalidCredentials);
        assert_eq!(err.message, "Invalid login credentials");

        let body = serde_json::json!({
            "code": 400,
            "error_code": "email_not_confirmed",
            "msg": "Email not confirmed"
        });
        assert_eq!(
            parse_error(StatusCode::BAD_REQUEST, &body).kind,
            AuthErrorKind::EmailNotConfirmed
        );
    }

    #[test]
    fn classifies_legacy_error_bodies_by_message() {
        let body = serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        });
        let err = parse_error(StatusCode::BAD_REQUEST, &body);
        assert_eq!(err.kind, AuthErrorKind::InvalidCredentials);
        assert_eq!(err.message, "Invalid login credentials");
    }

    #[test]
    fn unknown_errors_keep_provider_message() {
        let body = serde_json::json!({ "msg": "Signups not allowed for this instance" });
        let err = parse_error(StatusCode::UNPROCESSABLE_ENTITY, &body);
        assert_eq!(err.kind, AuthErrorKind::Other);
        assert_eq!(err.user_message(), "Signups not allowed for this instance");
    }

    #[test]
    fn empty_error_body_uses_status_reason() {
        let err = parse_error(StatusCode::SERVICE_UNAVAILABLE, &Value::Null);
        assert_eq!(err.kind, AuthErrorKind::Other);
        assert_eq!(err.message, "Service Unavailable");
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let client =
            GoTrueClient::new("https://auth.example.com/", "anon", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.endpoint("token"),
            "https://auth.example.com/auth/v1/token"
        );
    }
}
