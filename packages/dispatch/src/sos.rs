//! SOS alerts.

use crime_watch_crime_models::UserType;
use crime_watch_database::queries;
use crime_watch_database_models::{NewSosAlert, SosAlertRow};
use switchy_database::Database;

use crate::{DispatchError, require, require_location};

/// Result of raising an SOS alert.
#[derive(Debug, Clone, PartialEq)]
pub struct SosOutcome {
    /// The stored alert.
    pub alert: SosAlertRow,
    /// Active vigilantes and authorities with known coordinates.
    pub nearby_responders: u64,
}

/// Stores an `active` alert and counts responders who could take it.
///
/// The count is informational. If it fails the failure is logged and the
/// count is reported as zero.
///
/// # Errors
///
/// * [`DispatchError::Validation`] if the user id is blank or the
///   coordinates are out of range
/// * [`DispatchError::Database`] if the insert fails
pub async fn raise_sos(
    db: &dyn Database,
    alert: &NewSosAlert,
) -> Result<SosOutcome, DispatchError> {
    require(&alert.user_id, "User id")?;
    require_location(alert.location)?;

    let alert = queries::insert_sos_alert(db, alert).await?;

    log::warn!(
        "SOS alert {} ({}) raised by {}",
        alert.id,
        alert.alert_type,
        alert.user_id
    );

    let nearby_responders = match queries::count_responders(db, UserType::SOS_RESPONDERS).await {
        Ok(count) => count,
        Err(e) => {
            log::error!("Failed to count responders for SOS alert {}: {e}", alert.id);
            0
        }
    };

    Ok(SosOutcome {
        alert,
        nearby_responders,
    })
}
