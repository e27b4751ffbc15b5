//! Responder status updates and the report status cascade.

use chrono::Utc;
use crime_watch_database::queries;
use crime_watch_database_models::{ResponseUpdate, VigilanteResponseRow};
use switchy_database::Database;

use crate::DispatchError;

/// Applies a responder's status change and returns the updated row.
///
/// The matching timestamp column is stamped by the store layer. When the
/// new status is `arrived` or `completed` the parent report moves to
/// `investigating` or `resolved` in a separate statement. That cascade is
/// best-effort: a failure is logged and the response update stands.
///
/// # Errors
///
/// * [`DispatchError::ResponseNotFound`] if the pair has no response row
/// * [`DispatchError::Database`] if the update fails
pub async fn update_response(
    db: &dyn Database,
    update: &ResponseUpdate,
) -> Result<VigilanteResponseRow, DispatchError> {
    let now = Utc::now();

    let Some(updated) = queries::update_vigilante_response(db, update, now).await? else {
        return Err(DispatchError::ResponseNotFound {
            crime_report_id: update.crime_report_id.clone(),
            vigilante_id: update.vigilante_id.clone(),
        });
    };

    log::info!(
        "Responder {} marked report {} as {}",
        update.vigilante_id,
        update.crime_report_id,
        update.status
    );

    if let Some(report_status) = update.status.report_cascade() {
        match queries::update_report_status(db, &update.crime_report_id, report_status, now).await
        {
            Ok(0) => log::warn!(
                "Report {} not found while setting status {report_status}",
                update.crime_report_id
            ),
            Ok(_) => log::info!(
                "Report {} is now {report_status}",
                update.crime_report_id
            ),
            Err(e) => log::error!(
                "Failed to set report {} to {report_status}: {e}",
                update.crime_report_id
            ),
        }
    }

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportInput, submit_report};
    use crate::selector::BroadcastSelector;
    use crate::test_support::{add_user, test_db};
    use crime_watch_crime_models::{CrimeSeverity, ReportStatus, ResponseStatus, UserType};
    use crime_watch_database_models::Coordinates;

    async fn dispatched(db: &dyn Database) -> (String, String) {
        let vigilante = add_user(
            db,
            "vee",
            UserType::Vigilante,
            Some(Coordinates::new(6.5, 3.4)),
            true,
        )
        .await;
        let submission = submit_report(
            db,
            &BroadcastSelector,
            ReportInput {
                reporter_id: None,
                crime_type: "Robbery".to_string(),
                severity: CrimeSeverity::Critical,
                description: "Armed robbery in progress".to_string(),
                location_address: "Allen Avenue".to_string(),
                location: Coordinates::new(6.6, 3.35),
                incident_time: None,
                is_ongoing: true,
                is_anonymous: false,
                contact_number: None,
                evidence_urls: Vec::new(),
            },
        )
        .await
        .unwrap();
        (submission.report.id, vigilante.id)
    }

    fn update(report: &str, vigilante: &str, status: ResponseStatus) -> ResponseUpdate {
        ResponseUpdate {
            crime_report_id: report.to_string(),
            vigilante_id: vigilante.to_string(),
            status,
            notes: None,
        }
    }

    async fn report_status(db: &dyn Database, id: &str) -> ReportStatus {
        queries::get_crime_report(db, id)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn arrival_moves_report_to_investigating() {
        let db = test_db().await;
        let (report, vigilante) = dispatched(db.as_ref()).await;

        let row = update_response(
            db.as_ref(),
            &update(&report, &vigilante, ResponseStatus::Arrived),
        )
        .await
        .unwrap();

        assert!(row.arrival_time.is_some());
        assert!(row.response_time.is_none());
        assert!(row.completion_time.is_none());
        assert_eq!(
            report_status(db.as_ref(), &report).await,
            ReportStatus::Investigating
        );
    }

    #[tokio::test]
    async fn en_route_then_completed_resolves_report() {
        let db = test_db().await;
        let (report, vigilante) = dispatched(db.as_ref()).await;

        let en_route = update_response(
            db.as_ref(),
            &update(&report, &vigilante, ResponseStatus::EnRoute),
        )
        .await
        .unwrap();
        assert!(en_route.response_time.is_none());
        assert!(en_route.arrival_time.is_none());
        assert!(en_route.completion_time.is_none());
        assert_eq!(
            report_status(db.as_ref(), &report).await,
            ReportStatus::Reported
        );

        let mut completed = update(&report, &vigilante, ResponseStatus::Completed);
        completed.notes = Some("Suspect apprehended".to_string());
        let done = update_response(db.as_ref(), &completed).await.unwrap();

        assert_eq!(done.status, ResponseStatus::Completed);
        assert!(done.completion_time.is_some());
        assert_eq!(done.response_time, en_route.response_time);
        assert_eq!(done.arrival_time, en_route.arrival_time);
        assert_eq!(done.notes.as_deref(), Some("Suspect apprehended"));
        assert_eq!(
            report_status(db.as_ref(), &report).await,
            ReportStatus::Resolved
        );
    }

    #[tokio::test]
    async fn non_cascading_statuses_leave_report_alone() {
        let db = test_db().await;
        let (report, vigilante) = dispatched(db.as_ref()).await;

        for status in [
            ResponseStatus::Accepted,
            ResponseStatus::EnRoute,
            ResponseStatus::Declined,
            ResponseStatus::Notified,
        ] {
            update_response(db.as_ref(), &update(&report, &vigilante, status))
                .await
                .unwrap();
            assert_eq!(
                report_status(db.as_ref(), &report).await,
                ReportStatus::Reported
            );
        }
    }

    #[tokio::test]
    async fn accepted_stamps_response_time_only() {
        let db = test_db().await;
        let (report, vigilante) = dispatched(db.as_ref()).await;

        let row = update_response(
            db.as_ref(),
            &update(&report, &vigilante, ResponseStatus::Accepted),
        )
        .await
        .unwrap();
        assert!(row.response_time.is_some());
        assert!(row.arrival_time.is_none());
        assert!(row.completion_time.is_none());
    }

    #[tokio::test]
    async fn unknown_pair_is_not_found() {
        let db = test_db().await;
        let (report, _) = dispatched(db.as_ref()).await;

        let err = update_response(
            db.as_ref(),
            &update(&report, "stranger", ResponseStatus::Arrived),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DispatchError::ResponseNotFound { .. }));
        assert_eq!(
            report_status(db.as_ref(), &report).await,
            ReportStatus::Reported
        );
    }

    #[tokio::test]
    async fn failed_cascade_keeps_the_response_update() {
        let db = test_db().await;
        let (report, vigilante) = dispatched(db.as_ref()).await;
        db.exec_raw("DROP TABLE crime_reports").await.unwrap();

        let row = update_response(
            db.as_ref(),
            &update(&report, &vigilante, ResponseStatus::Completed),
        )
        .await
        .unwrap();
        assert_eq!(row.status, ResponseStatus::Completed);
        assert!(row.completion_time.is_some());

        let stored = queries::list_vigilante_responses(db.as_ref(), &report)
            .await
            .unwrap();
        assert_eq!(stored, vec![row]);
    }
}
