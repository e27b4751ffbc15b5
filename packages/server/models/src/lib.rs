#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crime watch server.
//!
//! Request bodies and response envelopes use camelCase field names. Rows
//! embedded in responses (`ApiCrimeReport`, `ApiVigilanteResponse`,
//! `ApiPerson`, `ApiUser`) keep their snake_case column names. Rows are
//! converted with `From` impls.

use chrono::{DateTime, NaiveDateTime, Utc};
use crime_watch_crime_models::{
    CrimeSeverity, ReportStatus, ResponseStatus, SosAlertType, UserType,
};
use crime_watch_database_models::{
    PersonName, ReportWithResponders, ResponseWithVigilante, UserRow, VigilanteResponseRow,
};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

// ---------------------------------------------------------------------------
// Crime reports
// ---------------------------------------------------------------------------

/// `POST /api/crime-reports` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeReportRequest {
    /// Submitting user.
    pub reporter_id: Option<String>,
    /// Free-form crime category.
    #[serde(default)]
    pub crime_type: String,
    /// Reported severity.
    pub severity: CrimeSeverity,
    /// What happened.
    #[serde(default)]
    pub description: String,
    /// Human-readable location.
    #[serde(default)]
    pub location_address: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// When it happened: RFC 3339, or a `datetime-local` value taken as UTC.
    pub incident_time: Option<String>,
    /// Still happening.
    #[serde(default)]
    pub is_ongoing: bool,
    /// Hide the reporter.
    #[serde(default)]
    pub is_anonymous: bool,
    /// Callback number.
    pub contact_number: Option<String>,
    /// Links to uploaded evidence.
    #[serde(default)]
    pub evidence_urls: Vec<String>,
}

/// `POST /api/crime-reports` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSubmitted {
    /// Confirmation text.
    pub message: String,
    /// Id of the stored report.
    pub report_id: String,
}

/// `GET /api/crime-reports` query parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportListParams {
    /// Only reports with this status.
    pub status: Option<ReportStatus>,
    /// Maximum number of reports.
    pub limit: Option<u32>,
}

/// A user's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiPerson {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl From<PersonName> for ApiPerson {
    fn from(name: PersonName) -> Self {
        Self {
            first_name: name.first_name,
            last_name: name.last_name,
        }
    }
}

/// A crime report as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCrimeReport {
    /// Report id.
    pub id: String,
    /// Reporter, absent for anonymous reports.
    pub reporter_id: Option<String>,
    /// Free-form crime category.
    pub crime_type: String,
    /// Severity name.
    pub severity: CrimeSeverity,
    /// Severity numeric value (1-4).
    pub severity_value: u8,
    /// What happened.
    pub description: String,
    /// Human-readable location.
    pub location_address: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// When it happened.
    pub incident_time: Option<DateTime<Utc>>,
    /// Still happening.
    pub is_ongoing: bool,
    /// Reporter asked to stay anonymous.
    pub is_anonymous: bool,
    /// Callback number.
    pub contact_number: Option<String>,
    /// Links to uploaded evidence.
    pub evidence_urls: Vec<String>,
    /// Lifecycle status.
    pub status: ReportStatus,
    /// When the report was filed.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
    /// Reporter's name.
    pub reporter: Option<ApiPerson>,
    /// Responses, oldest first.
    pub vigilante_responses: Vec<ApiVigilanteResponse>,
}

impl From<ReportWithResponders> for ApiCrimeReport {
    fn from(row: ReportWithResponders) -> Self {
        let report = row.report;
        Self {
            id: report.id,
            reporter_id: report.reporter_id,
            crime_type: report.crime_type,
            severity: report.severity,
            severity_value: report.severity.value(),
            description: report.description,
            location_address: report.location_address,
            latitude: report.latitude,
            longitude: report.longitude,
            incident_time: report.incident_time,
            is_ongoing: report.is_ongoing,
            is_anonymous: report.is_anonymous,
            contact_number: report.contact_number,
            evidence_urls: report.evidence_urls,
            status: report.status,
            created_at: report.created_at,
            updated_at: report.updated_at,
            reporter: row.reporter.map(ApiPerson::from),
            vigilante_responses: row
                .vigilante_responses
                .into_iter()
                .map(ApiVigilanteResponse::from)
                .collect(),
        }
    }
}

/// `GET /api/crime-reports` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportList {
    /// Reports, newest first.
    pub reports: Vec<ApiCrimeReport>,
}

/// `GET /api/crime-reports/{id}` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetail {
    /// The report.
    pub report: ApiCrimeReport,
}

// ---------------------------------------------------------------------------
// Vigilante responses
// ---------------------------------------------------------------------------

/// `POST /api/vigilante-response` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseUpdateRequest {
    /// Report being responded to.
    #[serde(default)]
    pub crime_report_id: String,
    /// Responding user.
    #[serde(default)]
    pub vigilante_id: String,
    /// New status.
    pub status: ResponseStatus,
    /// Replacement notes.
    pub notes: Option<String>,
}

/// A vigilante response as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiVigilanteResponse {
    /// Response id.
    pub id: String,
    /// Parent report.
    pub crime_report_id: String,
    /// Responding user.
    pub vigilante_id: String,
    /// Engagement status.
    pub status: ResponseStatus,
    /// When the responder accepted.
    pub response_time: Option<DateTime<Utc>>,
    /// When the responder arrived.
    pub arrival_time: Option<DateTime<Utc>>,
    /// When the responder completed.
    pub completion_time: Option<DateTime<Utc>>,
    /// Responder notes.
    pub notes: Option<String>,
    /// Reporter rating.
    pub rating: Option<i64>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
    /// Responder's name, when embedded in a report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vigilante: Option<ApiPerson>,
}

impl From<VigilanteResponseRow> for ApiVigilanteResponse {
    fn from(row: VigilanteResponseRow) -> Self {
        Self {
            id: row.id,
            crime_report_id: row.crime_report_id,
            vigilante_id: row.vigilante_id,
            status: row.status,
            response_time: row.response_time,
            arrival_time: row.arrival_time,
            completion_time: row.completion_time,
            notes: row.notes,
            rating: row.rating,
            created_at: row.created_at,
            updated_at: row.updated_at,
            vigilante: None,
        }
    }
}

impl From<ResponseWithVigilante> for ApiVigilanteResponse {
    fn from(row: ResponseWithVigilante) -> Self {
        Self {
            vigilante: row.vigilante.map(ApiPerson::from),
            ..Self::from(row.response)
        }
    }
}

/// `POST /api/vigilante-response` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseUpdated {
    /// Confirmation text.
    pub message: String,
    /// The updated response.
    pub response: ApiVigilanteResponse,
}

// ---------------------------------------------------------------------------
// SOS alerts
// ---------------------------------------------------------------------------

/// `POST /api/sos` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosRequest {
    /// User raising the alert.
    #[serde(default)]
    pub user_id: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Kind of emergency; `general` when omitted.
    pub alert_type: Option<SosAlertType>,
    /// Optional free text.
    pub message: Option<String>,
}

/// `POST /api/sos` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosCreated {
    /// Confirmation text.
    pub message: String,
    /// Id of the stored alert.
    pub alert_id: String,
    /// Active vigilantes and authorities with known coordinates.
    pub nearby_responders: u64,
}

// ---------------------------------------------------------------------------
// Accounts and sessions
// ---------------------------------------------------------------------------

/// `POST /api/auth/register` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Login e-mail.
    #[serde(default)]
    pub email: String,
    /// Plain-text password.
    #[serde(default)]
    pub password: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Account kind.
    pub user_type: UserType,
    /// Home address.
    pub address: Option<String>,
}

/// A user as returned by the API. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiUser {
    /// User id.
    pub id: String,
    /// Login e-mail.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Account kind.
    pub user_type: UserType,
    /// Home address.
    pub address: Option<String>,
    /// Last known latitude.
    pub latitude: Option<f64>,
    /// Last known longitude.
    pub longitude: Option<f64>,
    /// E-mail confirmed.
    pub is_verified: bool,
    /// Receives dispatches.
    pub is_active: bool,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for ApiUser {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            user_type: row.user_type,
            address: row.address,
            latitude: row.latitude,
            longitude: row.longitude,
            is_verified: row.is_verified,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `POST /api/auth/register` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registered {
    /// Confirmation text.
    pub message: String,
    /// The new account.
    pub user: ApiUser,
}

/// `POST /api/auth/login` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login e-mail.
    #[serde(default)]
    pub email: String,
    /// Password.
    #[serde(default)]
    pub password: String,
}

/// `POST /api/auth/login` body, for both success and failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    /// Whether the user is now signed in.
    pub success: bool,
    /// Message to show the user.
    pub message: String,
    /// Account kind, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    /// User id, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Bearer token for later calls, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// `GET /api/auth/session` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Whether the token resolved to a user with a profile.
    pub authenticated: bool,
    /// The signed-in user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ApiUser>,
    /// Where the client should navigate, if anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// `POST /api/auth/logout` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedOut {
    /// Confirmation text.
    pub message: String,
    /// Where the client should navigate.
    pub redirect: String,
}

/// `POST /api/auth/forgot-password` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    /// Account e-mail.
    #[serde(default)]
    pub email: String,
}

/// `POST /api/auth/forgot-password` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResult {
    /// Whether the reset e-mail was requested.
    pub success: bool,
    /// Message to show the user.
    pub message: String,
}

/// `POST /api/auth/reset-password` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// New password.
    #[serde(default)]
    pub password: String,
}

/// `POST /api/auth/reset-password` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordResult {
    /// Whether the password was changed.
    pub success: bool,
    /// Message to show the user.
    pub message: String,
}

/// Parses a client-supplied timestamp.
///
/// Accepts RFC 3339 (`2024-05-01T21:30:00+01:00`) and the zone-less
/// `datetime-local` form (`2024-05-01T21:30` or with seconds), which is
/// taken as UTC.
///
/// # Errors
///
/// Returns the parse error for the `datetime-local` attempt if neither
/// form matches.
pub fn parse_client_time(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone as _, Timelike as _};

    #[test]
    fn report_request_uses_camel_case_and_defaults() {
        let body = serde_json::json!({
            "reporterId": "U1",
            "crimeType": "Theft",
            "severity": "high",
            "description": "Phone stolen",
            "locationAddress": "Ikeja",
            "latitude": 6.5,
            "longitude": 3.4,
            "isAnonymous": true
        });
        let req: CrimeReportRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.reporter_id.as_deref(), Some("U1"));
        assert_eq!(req.severity, CrimeSeverity::High);
        assert!(req.is_anonymous);
        assert!(!req.is_ongoing);
        assert!(req.evidence_urls.is_empty());
    }

    #[test]
    fn unknown_severity_is_rejected() {
        let body = serde_json::json!({
            "crimeType": "Theft",
            "severity": "extreme",
            "description": "x",
            "locationAddress": "y",
            "latitude": 0.0,
            "longitude": 0.0
        });
        assert!(serde_json::from_value::<CrimeReportRequest>(body).is_err());
    }

    #[test]
    fn response_status_uses_snake_case() {
        let body = serde_json::json!({
            "crimeReportId": "R1",
            "vigilanteId": "V1",
            "status": "en_route"
        });
        let req: ResponseUpdateRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.status, ResponseStatus::EnRoute);
        assert!(req.notes.is_none());
    }

    #[test]
    fn login_failure_omits_optional_fields() {
        let json = serde_json::to_value(LoginResult {
            success: false,
            message: "User profile not found.".to_string(),
            user_type: None,
            user_id: None,
            access_token: None,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "message": "User profile not found." })
        );
    }

    #[test]
    fn embedded_vigilante_name_keeps_column_names() {
        let person = ApiPerson::from(PersonName {
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
        });
        let json = serde_json::to_value(person).unwrap();
        assert_eq!(json["first_name"], "Ada");
        assert_eq!(json["last_name"], "Obi");
        assert!(json.get("firstName").is_none());
    }

    #[test]
    fn client_time_accepts_rfc3339_and_datetime_local() {
        let zoned = parse_client_time("2024-05-01T21:30:00+01:00").unwrap();
        assert_eq!(zoned, Utc.with_ymd_and_hms(2024, 5, 1, 20, 30, 0).unwrap());

        let local = parse_client_time("2024-05-01T21:30").unwrap();
        assert_eq!(local.hour(), 21);
        assert_eq!(local.minute(), 30);

        assert!(parse_client_time("yesterday").is_err());
    }
}
