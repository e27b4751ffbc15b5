#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Database row types and insert/query parameter definitions.
//!
//! These types represent the shapes of data as stored in and retrieved from
//! the crime-watch store (`users`, `crime_reports`, `vigilante_responses`,
//! `sos_alerts`). Row types serialize with their column names. They are
//! distinct from the request/response bodies in
//! `crime_watch_server_models`.

use chrono::{DateTime, Utc};
use crime_watch_crime_models::{
    CrimeSeverity, ReportStatus, ResponseStatus, SosAlertStatus, SosAlertType, UserType,
};
use serde::{Deserialize, Serialize};

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinates {
    /// Creates a new point from latitude and longitude.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A user account row. The password hash is never read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    /// Primary key.
    pub id: String,
    /// Login e-mail, unique.
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
    /// Whether the e-mail address has been confirmed.
    pub is_verified: bool,
    /// Whether the account may receive dispatches.
    pub is_active: bool,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a new user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// Explicit id, e.g. the identity provider's user id. Generated when
    /// `None`.
    pub id: Option<String>,
    /// Login e-mail.
    pub email: String,
    /// Argon2 PHC string, if the account has a local password.
    pub password_hash: Option<String>,
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
    /// Known location, if any.
    pub location: Option<Coordinates>,
    /// Initial verification flag.
    pub is_verified: bool,
    /// Initial active flag.
    pub is_active: bool,
}

/// A responder candidate for notification fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Responder {
    /// User id.
    pub id: String,
    /// Account kind.
    pub user_type: UserType,
    /// Last known location (always present for candidates).
    pub location: Coordinates,
}

/// A crime report row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeReportRow {
    /// Primary key.
    pub id: String,
    /// Reporting user, `None` for anonymous reports.
    pub reporter_id: Option<String>,
    /// Free-form crime category.
    pub crime_type: String,
    /// Reported severity.
    pub severity: CrimeSeverity,
    /// What happened.
    pub description: String,
    /// Human-readable location.
    pub location_address: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// When the incident happened, if known.
    pub incident_time: Option<DateTime<Utc>>,
    /// Whether the incident is still happening.
    pub is_ongoing: bool,
    /// Whether the reporter asked to stay anonymous.
    pub is_anonymous: bool,
    /// Callback number.
    pub contact_number: Option<String>,
    /// Links to uploaded evidence.
    pub evidence_urls: Vec<String>,
    /// Lifecycle status.
    pub status: ReportStatus,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl CrimeReportRow {
    /// Returns the report location.
    #[must_use]
    pub const fn location(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Fields for inserting a new crime report. Status is always `reported`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCrimeReport {
    /// Reporting user, already cleared for anonymous reports.
    pub reporter_id: Option<String>,
    /// Free-form crime category.
    pub crime_type: String,
    /// Reported severity.
    pub severity: CrimeSeverity,
    /// What happened.
    pub description: String,
    /// Human-readable location.
    pub location_address: String,
    /// Where it happened.
    pub location: Coordinates,
    /// When it happened, if known.
    pub incident_time: Option<DateTime<Utc>>,
    /// Still happening.
    pub is_ongoing: bool,
    /// Reporter asked to stay anonymous.
    pub is_anonymous: bool,
    /// Callback number.
    pub contact_number: Option<String>,
    /// Links to uploaded evidence.
    pub evidence_urls: Vec<String>,
}

/// A vigilante response row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VigilanteResponseRow {
    /// Primary key.
    pub id: String,
    /// Parent report.
    pub crime_report_id: String,
    /// Responding user.
    pub vigilante_id: String,
    /// Engagement status.
    pub status: ResponseStatus,
    /// Stamped when the responder accepted.
    pub response_time: Option<DateTime<Utc>>,
    /// Stamped when the responder arrived.
    pub arrival_time: Option<DateTime<Utc>>,
    /// Stamped when the responder completed.
    pub completion_time: Option<DateTime<Utc>>,
    /// Responder notes.
    pub notes: Option<String>,
    /// Reporter rating of the response.
    pub rating: Option<i64>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// A responder's status change for one report.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseUpdate {
    /// Parent report.
    pub crime_report_id: String,
    /// Responding user.
    pub vigilante_id: String,
    /// New status.
    pub status: ResponseStatus,
    /// Replacement notes; existing notes are kept when `None`.
    pub notes: Option<String>,
}

/// An SOS alert row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SosAlertRow {
    /// Primary key.
    pub id: String,
    /// User who raised the alert.
    pub user_id: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Kind of emergency.
    pub alert_type: SosAlertType,
    /// Lifecycle status.
    pub status: SosAlertStatus,
    /// Optional free text.
    pub message: Option<String>,
    /// Responder who picked it up.
    pub responded_by: Option<String>,
    /// When it was picked up.
    pub response_time: Option<DateTime<Utc>>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// When it was resolved.
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Fields for inserting a new SOS alert. Status is always `active`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSosAlert {
    /// User raising the alert.
    pub user_id: String,
    /// Where the user is.
    pub location: Coordinates,
    /// Kind of emergency.
    pub alert_type: SosAlertType,
    /// Optional free text.
    pub message: Option<String>,
}

/// Parameters for listing crime reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportQuery {
    /// Only reports with this status.
    pub status: Option<ReportStatus>,
    /// Maximum number of reports to return.
    pub limit: u32,
}

impl Default for ReportQuery {
    fn default() -> Self {
        Self {
            status: None,
            limit: 10,
        }
    }
}

/// First and last name of a user, as embedded in report listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// A response row together with its responder's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseWithVigilante {
    /// The response row.
    #[serde(flatten)]
    pub response: VigilanteResponseRow,
    /// The responder's name, `None` if the user row is gone.
    pub vigilante: Option<PersonName>,
}

/// A report with its reporter's name and every response filed against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportWithResponders {
    /// The report row.
    #[serde(flatten)]
    pub report: CrimeReportRow,
    /// The reporter's name, `None` for anonymous reports.
    pub reporter: Option<PersonName>,
    /// Responses, oldest first.
    pub vigilante_responses: Vec<ResponseWithVigilante>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_query_defaults_to_ten_unfiltered() {
        let query = ReportQuery::default();
        assert_eq!(query.limit, 10);
        assert!(query.status.is_none());
    }

    #[test]
    fn response_with_vigilante_flattens_row_columns() {
        let now = Utc::now();
        let value = serde_json::to_value(ResponseWithVigilante {
            response: VigilanteResponseRow {
                id: "r1".to_string(),
                crime_report_id: "c1".to_string(),
                vigilante_id: "v1".to_string(),
                status: ResponseStatus::Notified,
                response_time: None,
                arrival_time: None,
                completion_time: None,
                notes: None,
                rating: None,
                created_at: now,
                updated_at: now,
            },
            vigilante: None,
        })
        .unwrap();
        assert_eq!(value["crime_report_id"], "c1");
        assert!(value["vigilante"].is_null());
    }
}
