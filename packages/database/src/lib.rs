#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Database connection, schema, and queries for crime watch.
//!
//! Uses `switchy_database` for all access so the same queries run against
//! `PostgreSQL` (production) and `SQLite` (local development and tests).
//! The schema is kept portable: ids are UUID strings, timestamps are
//! RFC 3339 text, and flags are stored as `0`/`1` integers.

pub mod db;
pub mod queries;

use switchy_database::Database;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Connection could not be established.
    #[error("Connection error: {0}")]
    Connection(String),

    /// An I/O operation failed (e.g., creating the database directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON column could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Creates all tables and indexes if they don't already exist.
///
/// # Errors
///
/// Returns [`DbError`] if any DDL statement fails.
pub async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            phone TEXT,
            user_type TEXT NOT NULL,
            address TEXT,
            latitude DOUBLE PRECISION,
            longitude DOUBLE PRECISION,
            is_verified BIGINT NOT NULL DEFAULT 0,
            is_active BIGINT NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS crime_reports (
            id TEXT PRIMARY KEY,
            reporter_id TEXT,
            crime_type TEXT NOT NULL,
            severity TEXT NOT NULL,
            description TEXT NOT NULL,
            location_address TEXT NOT NULL,
            latitude DOUBLE PRECISION NOT NULL,
            longitude DOUBLE PRECISION NOT NULL,
            incident_time TEXT,
            is_ongoing BIGINT NOT NULL DEFAULT 0,
            is_anonymous BIGINT NOT NULL DEFAULT 0,
            contact_number TEXT,
            evidence_urls TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'reported',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS vigilante_responses (
            id TEXT PRIMARY KEY,
            crime_report_id TEXT NOT NULL,
            vigilante_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'notified',
            response_time TEXT,
            arrival_time TEXT,
            completion_time TEXT,
            notes TEXT,
            rating BIGINT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS sos_alerts (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            latitude DOUBLE PRECISION NOT NULL,
            longitude DOUBLE PRECISION NOT NULL,
            alert_type TEXT NOT NULL DEFAULT 'general',
            status TEXT NOT NULL DEFAULT 'active',
            message TEXT,
            responded_by TEXT,
            response_time TEXT,
            created_at TEXT NOT NULL,
            resolved_at TEXT
        )",
    )
    .await?;

    // One response row per (report, responder) pair
    db.exec_raw(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_vigilante_responses_pair
         ON vigilante_responses (crime_report_id, vigilante_id)",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_users_dispatch
         ON users (user_type, is_active)",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_crime_reports_created
         ON crime_reports (created_at)",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_crime_reports_status
         ON crime_reports (status)",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_sos_alerts_user
         ON sos_alerts (user_id)",
    )
    .await?;

    log::info!("Database schema is up to date");
    Ok(())
}
