//! Database query functions for users, reports, responses, and alerts.
//!
//! Every statement uses numbered `$n` placeholders in ascending order so
//! the same SQL runs on both `PostgreSQL` and `SQLite`.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use crime_watch_crime_models::{ReportStatus, UserType};
use crime_watch_database_models::{
    Coordinates, CrimeReportRow, NewCrimeReport, NewSosAlert, NewUser, PersonName, ReportQuery,
    ReportWithResponders, Responder, ResponseUpdate, ResponseWithVigilante, SosAlertRow, UserRow,
    VigilanteResponseRow,
};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue, Row};
use uuid::Uuid;

use crate::DbError;

const USER_COLUMNS: &[&str] = &[
    "id",
    "email",
    "first_name",
    "last_name",
    "phone",
    "user_type",
    "address",
    "latitude",
    "longitude",
    "is_verified",
    "is_active",
    "created_at",
    "updated_at",
];

const REPORT_COLUMNS: &[&str] = &[
    "id",
    "reporter_id",
    "crime_type",
    "severity",
    "description",
    "location_address",
    "latitude",
    "longitude",
    "incident_time",
    "is_ongoing",
    "is_anonymous",
    "contact_number",
    "evidence_urls",
    "status",
    "created_at",
    "updated_at",
];

const RESPONSE_COLUMNS: &[&str] = &[
    "id",
    "crime_report_id",
    "vigilante_id",
    "status",
    "response_time",
    "arrival_time",
    "completion_time",
    "notes",
    "rating",
    "created_at",
    "updated_at",
];

const SOS_COLUMNS: &[&str] = &[
    "id",
    "user_id",
    "latitude",
    "longitude",
    "alert_type",
    "status",
    "message",
    "responded_by",
    "response_time",
    "created_at",
    "resolved_at",
];

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Inserts a new user and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails (e.g. the e-mail is taken).
pub async fn insert_user(db: &dyn Database, user: &NewUser) -> Result<UserRow, DbError> {
    let id = user
        .id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let now = Utc::now();

    let sql = format!(
        "INSERT INTO users (id, email, password_hash, first_name, last_name, phone,
             user_type, address, latitude, longitude, is_verified, is_active,
             created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
         RETURNING {}",
        USER_COLUMNS.join(", ")
    );

    let rows = db
        .query_raw_params(
            &sql,
            &[
                text(&id),
                text(&user.email),
                opt_text(user.password_hash.as_deref()),
                text(&user.first_name),
                text(&user.last_name),
                opt_text(user.phone.as_deref()),
                text(user.user_type.as_ref()),
                opt_text(user.address.as_deref()),
                opt_real(user.location.map(|c| c.latitude)),
                opt_real(user.location.map(|c| c.longitude)),
                flag(user.is_verified),
                flag(user.is_active),
                timestamp(now),
                timestamp(now),
            ],
        )
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Failed to get user row from insert".to_string(),
    })?;

    user_from_row(row)
}

/// Looks up a user by id.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the row cannot be parsed.
pub async fn get_user(db: &dyn Database, id: &str) -> Result<Option<UserRow>, DbError> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS.join(", "));
    let rows = db.query_raw_params(&sql, &[text(id)]).await?;

    rows.first().map(user_from_row).transpose()
}

/// Returns every active user of one of the given `kinds` that has both
/// coordinates set, oldest account first.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be parsed.
pub async fn find_responders(
    db: &dyn Database,
    kinds: &[UserType],
) -> Result<Vec<Responder>, DbError> {
    if kinds.is_empty() {
        return Ok(Vec::new());
    }

    let (filter, params) = responder_filter(kinds);
    let sql = format!(
        "SELECT id, user_type, latitude, longitude FROM users
         WHERE {filter}
         ORDER BY created_at, id"
    );

    let rows = db.query_raw_params(&sql, &params).await?;

    let mut responders = Vec::with_capacity(rows.len());
    for row in &rows {
        responders.push(Responder {
            id: read_string(row, "id")?,
            user_type: read_enum(row, "user_type")?,
            location: Coordinates::new(read_f64(row, "latitude")?, read_f64(row, "longitude")?),
        });
    }

    Ok(responders)
}

/// Counts active users of one of the given `kinds` that have both
/// coordinates set.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn count_responders(db: &dyn Database, kinds: &[UserType]) -> Result<u64, DbError> {
    if kinds.is_empty() {
        return Ok(0);
    }

    let (filter, params) = responder_filter(kinds);
    let sql = format!("SELECT COUNT(*) AS responder_count FROM users WHERE {filter}");

    let rows = db.query_raw_params(&sql, &params).await?;
    let count = rows
        .first()
        .map(|row| read_i64(row, "responder_count"))
        .transpose()?
        .unwrap_or(0);

    u64::try_from(count).map_err(|e| DbError::Conversion {
        message: format!("Invalid responder count {count}: {e}"),
    })
}

/// Builds the shared `WHERE` clause for responder lookups.
fn responder_filter(kinds: &[UserType]) -> (String, Vec<DatabaseValue>) {
    let placeholders = (1..=kinds.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let filter = format!(
        "is_active = 1
           AND latitude IS NOT NULL
           AND longitude IS NOT NULL
           AND user_type IN ({placeholders})"
    );
    let params = kinds.iter().map(|k| text(k.as_ref())).collect();
    (filter, params)
}

// ---------------------------------------------------------------------------
// Crime reports
// ---------------------------------------------------------------------------

/// Inserts a new crime report with status `reported` and returns the
/// stored row.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn insert_crime_report(
    db: &dyn Database,
    report: &NewCrimeReport,
) -> Result<CrimeReportRow, DbError> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let evidence = serde_json::to_string(&report.evidence_urls)?;

    let sql = format!(
        "INSERT INTO crime_reports (id, reporter_id, crime_type, severity, description,
             location_address, latitude, longitude, incident_time, is_ongoing,
             is_anonymous, contact_number, evidence_urls, status, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
         RETURNING {}",
        REPORT_COLUMNS.join(", ")
    );

    let rows = db
        .query_raw_params(
            &sql,
            &[
                text(&id),
                opt_text(report.reporter_id.as_deref()),
                text(&report.crime_type),
                text(report.severity.as_ref()),
                text(&report.description),
                text(&report.location_address),
                DatabaseValue::Real64(report.location.latitude),
                DatabaseValue::Real64(report.location.longitude),
                opt_timestamp(report.incident_time),
                flag(report.is_ongoing),
                flag(report.is_anonymous),
                opt_text(report.contact_number.as_deref()),
                DatabaseValue::String(evidence),
                text(ReportStatus::Reported.as_ref()),
                timestamp(now),
                timestamp(now),
            ],
        )
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Failed to get crime report row from insert".to_string(),
    })?;

    report_from_row(row)
}

/// Looks up a crime report by id.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the row cannot be parsed.
pub async fn get_crime_report(
    db: &dyn Database,
    id: &str,
) -> Result<Option<CrimeReportRow>, DbError> {
    let sql = format!(
        "SELECT {} FROM crime_reports WHERE id = $1",
        REPORT_COLUMNS.join(", ")
    );
    let rows = db.query_raw_params(&sql, &[text(id)]).await?;

    rows.first().map(report_from_row).transpose()
}

/// Sets the status of a crime report. Returns the number of rows changed.
///
/// # Errors
///
/// Returns [`DbError`] if the update fails.
pub async fn update_report_status(
    db: &dyn Database,
    id: &str,
    status: ReportStatus,
    now: DateTime<Utc>,
) -> Result<u64, DbError> {
    let changed = db
        .exec_raw_params(
            "UPDATE crime_reports SET status = $1, updated_at = $2 WHERE id = $3",
            &[text(status.as_ref()), timestamp(now), text(id)],
        )
        .await?;

    Ok(changed)
}

/// Lists crime reports newest first, each with its reporter's name and
/// all of its responses.
///
/// # Errors
///
/// Returns [`DbError`] if any query fails or a row cannot be parsed.
pub async fn list_crime_reports(
    db: &dyn Database,
    query: &ReportQuery,
) -> Result<Vec<ReportWithResponders>, DbError> {
    let mut sql = format!(
        "SELECT {}, u.first_name AS reporter_first_name, u.last_name AS reporter_last_name
         FROM crime_reports r
         LEFT JOIN users u ON u.id = r.reporter_id",
        aliased_columns("r", REPORT_COLUMNS)
    );

    let mut params: Vec<DatabaseValue> = Vec::new();

    if let Some(status) = query.status {
        params.push(text(status.as_ref()));
        write!(sql, " WHERE r.status = ${}", params.len()).unwrap();
    }

    sql.push_str(" ORDER BY r.created_at DESC, r.id");

    params.push(DatabaseValue::Int64(i64::from(query.limit)));
    write!(sql, " LIMIT ${}", params.len()).unwrap();

    let rows = db.query_raw_params(&sql, &params).await?;
    attach_responses(db, &rows).await
}

/// Loads a single crime report with its reporter's name and responses.
///
/// # Errors
///
/// Returns [`DbError`] if any query fails or a row cannot be parsed.
pub async fn get_crime_report_with_responses(
    db: &dyn Database,
    id: &str,
) -> Result<Option<ReportWithResponders>, DbError> {
    let sql = format!(
        "SELECT {}, u.first_name AS reporter_first_name, u.last_name AS reporter_last_name
         FROM crime_reports r
         LEFT JOIN users u ON u.id = r.reporter_id
         WHERE r.id = $1",
        aliased_columns("r", REPORT_COLUMNS)
    );

    let rows = db.query_raw_params(&sql, &[text(id)]).await?;
    Ok(attach_responses(db, &rows).await?.into_iter().next())
}

/// Parses report rows (with reporter name columns) and attaches their
/// responses.
async fn attach_responses(
    db: &dyn Database,
    rows: &[Row],
) -> Result<Vec<ReportWithResponders>, DbError> {
    let mut reports = Vec::with_capacity(rows.len());
    for row in rows {
        let report = report_from_row(row)?;
        let reporter = person_name(row, "reporter_first_name", "reporter_last_name")?;
        reports.push((report, reporter));
    }

    let ids: Vec<String> = reports.iter().map(|(r, _)| r.id.clone()).collect();
    let mut responses = responses_for_reports(db, &ids).await?;

    Ok(reports
        .into_iter()
        .map(|(report, reporter)| {
            let vigilante_responses = responses.remove(&report.id).unwrap_or_default();
            ReportWithResponders {
                report,
                reporter,
                vigilante_responses,
            }
        })
        .collect())
}

/// Loads responses (with responder names) for a set of reports, grouped
/// by report id and ordered oldest first.
async fn responses_for_reports(
    db: &dyn Database,
    report_ids: &[String],
) -> Result<BTreeMap<String, Vec<ResponseWithVigilante>>, DbError> {
    let mut grouped: BTreeMap<String, Vec<ResponseWithVigilante>> = BTreeMap::new();
    if report_ids.is_empty() {
        return Ok(grouped);
    }

    let placeholders = (1..=report_ids.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {}, u.first_name AS vigilante_first_name, u.last_name AS vigilante_last_name
         FROM vigilante_responses v
         LEFT JOIN users u ON u.id = v.vigilante_id
         WHERE v.crime_report_id IN ({placeholders})
         ORDER BY v.created_at, v.id",
        aliased_columns("v", RESPONSE_COLUMNS)
    );
    let params: Vec<DatabaseValue> = report_ids.iter().map(|id| text(id)).collect();

    let rows = db.query_raw_params(&sql, &params).await?;
    for row in &rows {
        let response = response_from_row(row)?;
        let vigilante = person_name(row, "vigilante_first_name", "vigilante_last_name")?;
        grouped
            .entry(response.crime_report_id.clone())
            .or_default()
            .push(ResponseWithVigilante {
                response,
                vigilante,
            });
    }

    Ok(grouped)
}

// ---------------------------------------------------------------------------
// Vigilante responses
// ---------------------------------------------------------------------------

/// Inserts one `notified` response per responder for a report.
///
/// Pairs that already have a response are skipped, so the number
/// returned is the count of rows actually created.
///
/// # Errors
///
/// Returns [`DbError`] if any insert fails. Rows inserted before the
/// failure stay in place.
pub async fn insert_notified_responses(
    db: &dyn Database,
    crime_report_id: &str,
    vigilante_ids: &[String],
    now: DateTime<Utc>,
) -> Result<u64, DbError> {
    let mut inserted = 0u64;

    for vigilante_id in vigilante_ids {
        inserted += db
            .exec_raw_params(
                "INSERT INTO vigilante_responses
                     (id, crime_report_id, vigilante_id, status, created_at, updated_at)
                 VALUES ($1, $2, $3, 'notified', $4, $5)
                 ON CONFLICT (crime_report_id, vigilante_id) DO NOTHING",
                &[
                    text(&Uuid::new_v4().to_string()),
                    text(crime_report_id),
                    text(vigilante_id),
                    timestamp(now),
                    timestamp(now),
                ],
            )
            .await?;
    }

    Ok(inserted)
}

/// Applies a status change to the response identified by
/// `(crime_report_id, vigilante_id)` and returns the updated row, or
/// `None` if no such response exists.
///
/// Stamps the transition's timestamp column (if the status has one) with
/// `now`, refreshes `updated_at`, and replaces `notes` only when given.
///
/// # Errors
///
/// Returns [`DbError`] if the update fails or the row cannot be parsed.
pub async fn update_vigilante_response(
    db: &dyn Database,
    update: &ResponseUpdate,
    now: DateTime<Utc>,
) -> Result<Option<VigilanteResponseRow>, DbError> {
    let mut assignments = vec!["status = $1".to_string(), "updated_at = $2".to_string()];
    let mut params = vec![text(update.status.as_ref()), timestamp(now)];

    if let Some(column) = update.status.timestamp_field() {
        params.push(timestamp(now));
        assignments.push(format!("{} = ${}", column.as_ref(), params.len()));
    }

    if let Some(notes) = &update.notes {
        params.push(text(notes));
        assignments.push(format!("notes = ${}", params.len()));
    }

    params.push(text(&update.crime_report_id));
    let report_param = params.len();
    params.push(text(&update.vigilante_id));
    let vigilante_param = params.len();

    let sql = format!(
        "UPDATE vigilante_responses SET {}
         WHERE crime_report_id = ${report_param} AND vigilante_id = ${vigilante_param}
         RETURNING {}",
        assignments.join(", "),
        RESPONSE_COLUMNS.join(", ")
    );

    let rows = db.query_raw_params(&sql, &params).await?;
    rows.first().map(response_from_row).transpose()
}

/// Lists every response filed against a report, oldest first.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be parsed.
pub async fn list_vigilante_responses(
    db: &dyn Database,
    crime_report_id: &str,
) -> Result<Vec<VigilanteResponseRow>, DbError> {
    let sql = format!(
        "SELECT {} FROM vigilante_responses
         WHERE crime_report_id = $1
         ORDER BY created_at, id",
        RESPONSE_COLUMNS.join(", ")
    );
    let rows = db.query_raw_params(&sql, &[text(crime_report_id)]).await?;

    rows.iter().map(response_from_row).collect()
}

// ---------------------------------------------------------------------------
// SOS alerts
// ---------------------------------------------------------------------------

/// Inserts a new SOS alert with status `active` and returns the stored
/// row.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn insert_sos_alert(
    db: &dyn Database,
    alert: &NewSosAlert,
) -> Result<SosAlertRow, DbError> {
    let sql = format!(
        "INSERT INTO sos_alerts (id, user_id, latitude, longitude, alert_type, status,
             message, created_at)
         VALUES ($1, $2, $3, $4, $5, 'active', $6, $7)
         RETURNING {}",
        SOS_COLUMNS.join(", ")
    );

    let rows = db
        .query_raw_params(
            &sql,
            &[
                text(&Uuid::new_v4().to_string()),
                text(&alert.user_id),
                DatabaseValue::Real64(alert.location.latitude),
                DatabaseValue::Real64(alert.location.longitude),
                text(alert.alert_type.as_ref()),
                opt_text(alert.message.as_deref()),
                timestamp(Utc::now()),
            ],
        )
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Failed to get SOS alert row from insert".to_string(),
    })?;

    sos_from_row(row)
}

/// Looks up an SOS alert by id.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the row cannot be parsed.
pub async fn get_sos_alert(db: &dyn Database, id: &str) -> Result<Option<SosAlertRow>, DbError> {
    let sql = format!(
        "SELECT {} FROM sos_alerts WHERE id = $1",
        SOS_COLUMNS.join(", ")
    );
    let rows = db.query_raw_params(&sql, &[text(id)]).await?;

    rows.first().map(sos_from_row).transpose()
}

// ---------------------------------------------------------------------------
// Row conversion
// ---------------------------------------------------------------------------

fn user_from_row(row: &Row) -> Result<UserRow, DbError> {
    Ok(UserRow {
        id: read_string(row, "id")?,
        email: read_string(row, "email")?,
        first_name: read_string(row, "first_name")?,
        last_name: read_string(row, "last_name")?,
        phone: read_opt_string(row, "phone")?,
        user_type: read_enum(row, "user_type")?,
        address: read_opt_string(row, "address")?,
        latitude: read_opt_f64(row, "latitude")?,
        longitude: read_opt_f64(row, "longitude")?,
        is_verified: read_bool(row, "is_verified")?,
        is_active: read_bool(row, "is_active")?,
        created_at: read_timestamp(row, "created_at")?,
        updated_at: read_timestamp(row, "updated_at")?,
    })
}

fn report_from_row(row: &Row) -> Result<CrimeReportRow, DbError> {
    let evidence = read_opt_string(row, "evidence_urls")?;
    let evidence_urls = match evidence.as_deref() {
        Some(json) if !json.is_empty() => serde_json::from_str(json)?,
        _ => Vec::new(),
    };

    Ok(CrimeReportRow {
        id: read_string(row, "id")?,
        reporter_id: read_opt_string(row, "reporter_id")?,
        crime_type: read_string(row, "crime_type")?,
        severity: read_enum(row, "severity")?,
        description: read_string(row, "description")?,
        location_address: read_string(row, "location_address")?,
        latitude: read_f64(row, "latitude")?,
        longitude: read_f64(row, "longitude")?,
        incident_time: read_opt_timestamp(row, "incident_time")?,
        is_ongoing: read_bool(row, "is_ongoing")?,
        is_anonymous: read_bool(row, "is_anonymous")?,
        contact_number: read_opt_string(row, "contact_number")?,
        evidence_urls,
        status: read_enum(row, "status")?,
        created_at: read_timestamp(row, "created_at")?,
        updated_at: read_timestamp(row, "updated_at")?,
    })
}

fn response_from_row(row: &Row) -> Result<VigilanteResponseRow, DbError> {
    Ok(VigilanteResponseRow {
        id: read_string(row, "id")?,
        crime_report_id: read_string(row, "crime_report_id")?,
        vigilante_id: read_string(row, "vigilante_id")?,
        status: read_enum(row, "status")?,
        response_time: read_opt_timestamp(row, "response_time")?,
        arrival_time: read_opt_timestamp(row, "arrival_time")?,
        completion_time: read_opt_timestamp(row, "completion_time")?,
        notes: read_opt_string(row, "notes")?,
        rating: read_opt_i64(row, "rating")?,
        created_at: read_timestamp(row, "created_at")?,
        updated_at: read_timestamp(row, "updated_at")?,
    })
}

fn sos_from_row(row: &Row) -> Result<SosAlertRow, DbError> {
    Ok(SosAlertRow {
        id: read_string(row, "id")?,
        user_id: read_string(row, "user_id")?,
        latitude: read_f64(row, "latitude")?,
        longitude: read_f64(row, "longitude")?,
        alert_type: read_enum(row, "alert_type")?,
        status: read_enum(row, "status")?,
        message: read_opt_string(row, "message")?,
        responded_by: read_opt_string(row, "responded_by")?,
        response_time: read_opt_timestamp(row, "response_time")?,
        created_at: read_timestamp(row, "created_at")?,
        resolved_at: read_opt_timestamp(row, "resolved_at")?,
    })
}

/// Reads a joined name pair; `None` when the join found no user.
fn person_name(row: &Row, first: &str, last: &str) -> Result<Option<PersonName>, DbError> {
    let Some(first_name) = read_opt_string(row, first)? else {
        return Ok(None);
    };
    let last_name = read_opt_string(row, last)?.unwrap_or_default();

    Ok(Some(PersonName {
        first_name,
        last_name,
    }))
}

fn aliased_columns(alias: &str, columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("{alias}.{c} AS {c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn conversion(column: &str, error: &impl std::fmt::Display) -> DbError {
    DbError::Conversion {
        message: format!("Failed to read column {column}: {error}"),
    }
}

fn read_string(row: &Row, column: &str) -> Result<String, DbError> {
    let value: String = row.to_value(column).map_err(|e| conversion(column, &e))?;
    Ok(value)
}

fn read_opt_string(row: &Row, column: &str) -> Result<Option<String>, DbError> {
    let value: Option<String> = row.to_value(column).map_err(|e| conversion(column, &e))?;
    Ok(value)
}

fn read_i64(row: &Row, column: &str) -> Result<i64, DbError> {
    let value: i64 = row.to_value(column).map_err(|e| conversion(column, &e))?;
    Ok(value)
}

fn read_opt_i64(row: &Row, column: &str) -> Result<Option<i64>, DbError> {
    let value: Option<i64> = row.to_value(column).map_err(|e| conversion(column, &e))?;
    Ok(value)
}

fn read_f64(row: &Row, column: &str) -> Result<f64, DbError> {
    let value: f64 = row.to_value(column).map_err(|e| conversion(column, &e))?;
    Ok(value)
}

fn read_opt_f64(row: &Row, column: &str) -> Result<Option<f64>, DbError> {
    let value: Option<f64> = row.to_value(column).map_err(|e| conversion(column, &e))?;
    Ok(value)
}

/// Reads an integer flag column (1 = true, 0 = false).
fn read_bool(row: &Row, column: &str) -> Result<bool, DbError> {
    Ok(read_i64(row, column)? != 0)
}

fn read_timestamp(row: &Row, column: &str) -> Result<DateTime<Utc>, DbError> {
    parse_timestamp(&read_string(row, column)?).map_err(|e| conversion(column, &e))
}

fn read_opt_timestamp(row: &Row, column: &str) -> Result<Option<DateTime<Utc>>, DbError> {
    read_opt_string(row, column)?
        .map(|s| parse_timestamp(&s).map_err(|e| conversion(column, &e)))
        .transpose()
}

fn read_enum<T>(row: &Row, column: &str) -> Result<T, DbError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    read_string(row, column)?
        .parse()
        .map_err(|e| conversion(column, &e))
}

// ---------------------------------------------------------------------------
// Value helpers
// ---------------------------------------------------------------------------

/// Formats a timestamp the way every timestamp column stores it.
///
/// Fixed-width microsecond RFC 3339 in UTC, so text ordering matches
/// chronological ordering.
#[must_use]
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

fn text(value: &str) -> DatabaseValue {
    DatabaseValue::String(value.to_string())
}

fn opt_text(value: Option<&str>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, text)
}

fn opt_real(value: Option<f64>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, DatabaseValue::Real64)
}

fn flag(value: bool) -> DatabaseValue {
    DatabaseValue::Int64(i64::from(value))
}

fn timestamp(value: DateTime<Utc>) -> DatabaseValue {
    DatabaseValue::String(format_timestamp(value))
}

fn opt_timestamp(value: Option<DateTime<Utc>>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_sqlite;
    use crime_watch_crime_models::{CrimeSeverity, ResponseStatus, SosAlertType};

    async fn test_db() -> Box<dyn Database> {
        let path = std::env::temp_dir().join(format!("crime_watch_db_{}.db", Uuid::new_v4()));
        open_sqlite(&path).await.unwrap()
    }

    fn new_user(email: &str, user_type: UserType, location: Option<Coordinates>) -> NewUser {
        NewUser {
            id: None,
            email: email.to_string(),
            password_hash: None,
            first_name: "Ada".to_string(),
            last_name: email.split('@').next().unwrap_or_default().to_string(),
            phone: None,
            user_type,
            address: None,
            location,
            is_verified: false,
            is_active: true,
        }
    }

    fn new_report(reporter_id: Option<&str>, crime_type: &str) -> NewCrimeReport {
        NewCrimeReport {
            reporter_id: reporter_id.map(str::to_string),
            crime_type: crime_type.to_string(),
            severity: CrimeSeverity::High,
            description: "Phone snatched at the bus stop".to_string(),
            location_address: "12 Marina Rd".to_string(),
            location: Coordinates::new(6.5, 3.4),
            incident_time: None,
            is_ongoing: false,
            is_anonymous: reporter_id.is_none(),
            contact_number: None,
            evidence_urls: vec!["https://cdn.example/1.jpg".to_string()],
        }
    }

    #[tokio::test]
    async fn user_round_trip() {
        let db = test_db().await;
        let here = Coordinates::new(6.45, 3.39);
        let inserted = insert_user(
            db.as_ref(),
            &new_user("v1@example.com", UserType::Vigilante, Some(here)),
        )
        .await
        .unwrap();

        let loaded = get_user(db.as_ref(), &inserted.id).await.unwrap().unwrap();
        assert_eq!(loaded, inserted);
        assert_eq!(loaded.user_type, UserType::Vigilante);
        assert_eq!(loaded.latitude, Some(6.45));
        assert!(loaded.is_active);
        assert!(!loaded.is_verified);

        assert!(get_user(db.as_ref(), "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let db = test_db().await;
        let user = new_user("dup@example.com", UserType::Resident, None);
        insert_user(db.as_ref(), &user).await.unwrap();
        assert!(insert_user(db.as_ref(), &user).await.is_err());
    }

    #[tokio::test]
    async fn responders_require_active_type_and_coordinates() {
        let db = test_db().await;
        let here = Some(Coordinates::new(6.5, 3.4));

        let vigilante = insert_user(
            db.as_ref(),
            &new_user("v@example.com", UserType::Vigilante, here),
        )
        .await
        .unwrap();
        let authority = insert_user(
            db.as_ref(),
            &new_user("a@example.com", UserType::Authority, here),
        )
        .await
        .unwrap();
        insert_user(
            db.as_ref(),
            &new_user("r@example.com", UserType::Resident, here),
        )
        .await
        .unwrap();
        insert_user(
            db.as_ref(),
            &new_user("nowhere@example.com", UserType::Vigilante, None),
        )
        .await
        .unwrap();
        let mut inactive = new_user("off@example.com", UserType::Vigilante, here);
        inactive.is_active = false;
        insert_user(db.as_ref(), &inactive).await.unwrap();

        let found = find_responders(db.as_ref(), UserType::REPORT_RESPONDERS)
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![vigilante.id.clone()]);

        let count = count_responders(db.as_ref(), UserType::SOS_RESPONDERS)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let sos = find_responders(db.as_ref(), UserType::SOS_RESPONDERS)
            .await
            .unwrap();
        assert!(sos.iter().any(|r| r.id == authority.id));
        assert_eq!(count_responders(db.as_ref(), &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn report_round_trip_keeps_evidence() {
        let db = test_db().await;
        let stored = insert_crime_report(db.as_ref(), &new_report(Some("U1"), "Theft"))
            .await
            .unwrap();
        assert_eq!(stored.status, ReportStatus::Reported);
        assert_eq!(stored.evidence_urls, vec!["https://cdn.example/1.jpg"]);

        let loaded = get_crime_report(db.as_ref(), &stored.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(loaded.reporter_id.as_deref(), Some("U1"));
    }

    #[tokio::test]
    async fn notified_responses_are_unique_per_pair() {
        let db = test_db().await;
        let report = insert_crime_report(db.as_ref(), &new_report(None, "Burglary"))
            .await
            .unwrap();
        let ids = vec!["V1".to_string(), "V2".to_string()];

        let first = insert_notified_responses(db.as_ref(), &report.id, &ids, Utc::now())
            .await
            .unwrap();
        let second = insert_notified_responses(db.as_ref(), &report.id, &ids, Utc::now())
            .await
            .unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 0);

        let rows = list_vigilante_responses(db.as_ref(), &report.id)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.status == ResponseStatus::Notified));
    }

    #[tokio::test]
    async fn response_update_stamps_only_its_column() {
        let db = test_db().await;
        let report = insert_crime_report(db.as_ref(), &new_report(None, "Assault"))
            .await
            .unwrap();
        insert_notified_responses(db.as_ref(), &report.id, &["V1".to_string()], Utc::now())
            .await
            .unwrap();

        let accepted = update_vigilante_response(
            db.as_ref(),
            &ResponseUpdate {
                crime_report_id: report.id.clone(),
                vigilante_id: "V1".to_string(),
                status: ResponseStatus::Accepted,
                notes: Some("on my way".to_string()),
            },
            Utc::now(),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(accepted.status, ResponseStatus::Accepted);
        assert!(accepted.response_time.is_some());
        assert!(accepted.arrival_time.is_none());
        assert!(accepted.completion_time.is_none());

        let en_route = update_vigilante_response(
            db.as_ref(),
            &ResponseUpdate {
                crime_report_id: report.id.clone(),
                vigilante_id: "V1".to_string(),
                status: ResponseStatus::EnRoute,
                notes: None,
            },
            Utc::now(),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(en_route.response_time, accepted.response_time);
        assert!(en_route.arrival_time.is_none());
        assert_eq!(en_route.notes.as_deref(), Some("on my way"));
        assert!(en_route.updated_at >= accepted.updated_at);

        let stored = list_vigilante_responses(db.as_ref(), &report.id)
            .await
            .unwrap();
        assert_eq!(stored, vec![en_route]);
    }

    #[tokio::test]
    async fn response_update_without_row_returns_none() {
        let db = test_db().await;
        let updated = update_vigilante_response(
            db.as_ref(),
            &ResponseUpdate {
                crime_report_id: "R1".to_string(),
                vigilante_id: "V1".to_string(),
                status: ResponseStatus::Arrived,
                notes: None,
            },
            Utc::now(),
        )
        .await
        .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn listing_embeds_names_and_filters_by_status() {
        let db = test_db().await;
        let reporter = insert_user(
            db.as_ref(),
            &new_user("reporter@example.com", UserType::Resident, None),
        )
        .await
        .unwrap();
        let vigilante = insert_user(
            db.as_ref(),
            &new_user(
                "watch@example.com",
                UserType::Vigilante,
                Some(Coordinates::new(6.5, 3.4)),
            ),
        )
        .await
        .unwrap();

        let named = insert_crime_report(db.as_ref(), &new_report(Some(&reporter.id), "Theft"))
            .await
            .unwrap();
        let anonymous = insert_crime_report(db.as_ref(), &new_report(None, "Vandalism"))
            .await
            .unwrap();
        insert_notified_responses(
            db.as_ref(),
            &named.id,
            std::slice::from_ref(&vigilante.id),
            Utc::now(),
        )
        .await
        .unwrap();
        update_report_status(db.as_ref(), &named.id, ReportStatus::Resolved, Utc::now())
            .await
            .unwrap();

        let all = list_crime_reports(db.as_ref(), &ReportQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].report.id, anonymous.id);
        assert!(all[0].reporter.is_none());
        assert!(all[0].vigilante_responses.is_empty());

        let resolved = list_crime_reports(
            db.as_ref(),
            &ReportQuery {
                status: Some(ReportStatus::Resolved),
                limit: 10,
            },
        )
        .await
        .unwrap();
        assert_eq!(resolved.len(), 1);
        let listed = &resolved[0];
        assert_eq!(listed.report.id, named.id);
        assert_eq!(
            listed.reporter.as_ref().map(|n| n.last_name.as_str()),
            Some("reporter")
        );
        assert_eq!(listed.vigilante_responses.len(), 1);
        assert_eq!(
            listed.vigilante_responses[0]
                .vigilante
                .as_ref()
                .map(|n| n.last_name.as_str()),
            Some("watch")
        );

        let limited = list_crime_reports(
            db.as_ref(),
            &ReportQuery {
                status: None,
                limit: 1,
            },
        )
        .await
        .unwrap();
        assert_eq!(limited.len(), 1);

        let single = get_crime_report_with_responses(db.as_ref(), &named.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(single.vigilante_responses.len(), 1);
        assert!(
            get_crime_report_with_responses(db.as_ref(), "missing")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn sos_alert_starts_active() {
        let db = test_db().await;
        let alert = insert_sos_alert(
            db.as_ref(),
            &NewSosAlert {
                user_id: "U1".to_string(),
                location: Coordinates::new(6.5, 3.4),
                alert_type: SosAlertType::Medical,
                message: None,
            },
        )
        .await
        .unwrap();

        let loaded = get_sos_alert(db.as_ref(), &alert.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, crime_watch_crime_models::SosAlertStatus::Active);
        assert_eq!(loaded.alert_type, SosAlertType::Medical);
        assert!(loaded.responded_by.is_none());
    }

    #[test]
    fn timestamps_sort_as_text() {
        let earlier = DateTime::parse_from_rfc3339("2024-01-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = DateTime::parse_from_rfc3339("2024-01-01T10:00:00.5Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(format_timestamp(earlier) < format_timestamp(later));
        assert_eq!(
            parse_timestamp(&format_timestamp(later)).unwrap(),
            later
        );
    }
}
