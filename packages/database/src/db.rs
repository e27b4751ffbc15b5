//! Database connection utilities.

use std::path::Path;

use switchy_database::Database;
use switchy_database_connection::{Credentials, init_sqlite_rusqlite};

use crate::{DbError, ensure_schema};

/// Opens a connection for `url` and makes sure the schema exists.
///
/// `postgres://` and `postgresql://` URLs connect to `PostgreSQL` with a
/// 120-second `statement_timeout` so stalled queries fail with an error
/// instead of hanging indefinitely. Anything else is treated as an
/// `SQLite` file path, with an optional `sqlite://` prefix.
///
/// # Errors
///
/// Returns [`DbError`] if the connection fails or the schema cannot be
/// created.
pub async fn connect(url: &str) -> Result<Box<dyn Database>, DbError> {
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        let db = connect_postgres(url).await?;
        ensure_schema(db.as_ref()).await?;
        return Ok(db);
    }

    let path = url.strip_prefix("sqlite://").unwrap_or(url);
    open_sqlite(Path::new(path)).await
}

/// Opens (or creates) an `SQLite` database at `path` and ensures all
/// tables exist.
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be created or the schema DDL
/// fails.
pub async fn open_sqlite(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Connection(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;

    Ok(db)
}

async fn connect_postgres(url: &str) -> Result<Box<dyn Database>, DbError> {
    // Strip query parameters (e.g., ?sslmode=require) that the Credentials
    // parser doesn't understand. TLS is handled by the native-tls connector.
    let url_base = url.split('?').next().unwrap_or(url);

    let creds = Credentials::from_url(url_base).map_err(|e| DbError::Connection(e.to_string()))?;
    let db = switchy_database_connection::init_postgres_raw_native_tls(creds)
        .await
        .map_err(|e| DbError::Connection(e.to_string()))?;

    db.exec_raw("SET statement_timeout = '120s'").await?;

    Ok(db)
}
