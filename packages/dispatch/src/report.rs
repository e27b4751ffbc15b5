//! Crime report submission and responder fan-out.

use chrono::{DateTime, Utc};
use crime_watch_crime_models::{CrimeSeverity, UserType};
use crime_watch_database::queries;
use crime_watch_database_models::{Coordinates, CrimeReportRow, NewCrimeReport};
use switchy_database::Database;

use crate::selector::ResponderSelector;
use crate::{DispatchError, require, require_location};

/// A crime report as submitted by a client.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportInput {
    /// Submitting user. Dropped when `is_anonymous` is set.
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
    /// Hide the reporter.
    pub is_anonymous: bool,
    /// Callback number.
    pub contact_number: Option<String>,
    /// Links to uploaded evidence.
    pub evidence_urls: Vec<String>,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSubmission {
    /// The stored report.
    pub report: CrimeReportRow,
    /// Number of responders notified, or `None` if the fan-out failed.
    pub notified: Option<u64>,
}

/// Validates and stores a report, then notifies responders.
///
/// The fan-out runs only after a successful insert. If it fails the
/// report stays stored and the failure is only logged.
///
/// # Errors
///
/// * [`DispatchError::Validation`] if a required field is blank or the
///   coordinates are out of range
/// * [`DispatchError::Database`] if the insert fails
pub async fn submit_report(
    db: &dyn Database,
    selector: &dyn ResponderSelector,
    input: ReportInput,
) -> Result<ReportSubmission, DispatchError> {
    require(&input.crime_type, "Crime type")?;
    require(&input.description, "Description")?;
    require(&input.location_address, "Location address")?;
    require_location(input.location)?;

    let reporter_id = if input.is_anonymous {
        None
    } else {
        input.reporter_id
    };

    let report = queries::insert_crime_report(
        db,
        &NewCrimeReport {
            reporter_id,
            crime_type: input.crime_type,
            severity: input.severity,
            description: input.description,
            location_address: input.location_address,
            location: input.location,
            incident_time: input.incident_time,
            is_ongoing: input.is_ongoing,
            is_anonymous: input.is_anonymous,
            contact_number: input.contact_number,
            evidence_urls: input.evidence_urls,
        },
    )
    .await?;

    log::info!(
        "Stored crime report {} ({}, {})",
        report.id,
        report.crime_type,
        report.severity
    );

    let notified = match fan_out(db, selector, &report).await {
        Ok(count) => Some(count),
        Err(e) => {
            log::error!("Failed to notify responders for report {}: {e}", report.id);
            None
        }
    };

    Ok(ReportSubmission { report, notified })
}

/// Creates a `notified` response for every responder the selector picks.
///
/// Returns the number of response rows created. An empty candidate set is
/// not an error.
///
/// # Errors
///
/// Returns [`DispatchError::Database`] if loading candidates or inserting
/// responses fails.
pub async fn fan_out(
    db: &dyn Database,
    selector: &dyn ResponderSelector,
    report: &CrimeReportRow,
) -> Result<u64, DispatchError> {
    let candidates = queries::find_responders(db, UserType::REPORT_RESPONDERS).await?;
    let candidate_count = candidates.len();
    let selected = selector.select(report.location(), candidates);

    if selected.is_empty() {
        log::info!(
            "No responders to notify for report {} ({candidate_count} candidate(s))",
            report.id
        );
        return Ok(0);
    }

    let ids: Vec<String> = selected.into_iter().map(|r| r.id).collect();
    let inserted = queries::insert_notified_responses(db, &report.id, &ids, Utc::now()).await?;

    log::info!(
        "Notified {inserted} of {candidate_count} responder(s) for report {}",
        report.id
    );

    Ok(inserted)
}
