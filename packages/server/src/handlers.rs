//! HTTP handler functions for the crime watch API.

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use crime_watch_crime_models::SosAlertType;
use crime_watch_database::queries;
use crime_watch_database_models::{Coordinates, NewSosAlert, ReportQuery, ResponseUpdate};
use crime_watch_dispatch::account::Registration;
use crime_watch_dispatch::report::{self, ReportInput};
use crime_watch_dispatch::{response, sos};
use crime_watch_server_models::{
    ApiCrimeReport, ApiHealth, ApiUser, ApiVigilanteResponse, CrimeReportRequest,
    ForgotPasswordRequest, ForgotPasswordResult, LoggedOut, LoginRequest, LoginResult,
    Registered, RegisterRequest, ReportDetail, ReportList, ReportListParams, ReportSubmitted,
    ResetPasswordRequest, ResetPasswordResult, ResponseUpdateRequest, ResponseUpdated,
    SessionState, SosCreated, SosRequest, parse_client_time,
};
use crime_watch_session::{
    Navigation, RestoreOutcome, SessionContext, SessionError, request_password_reset, sign_up,
};

use crate::AppState;
use crate::error::ApiError;

const DEFAULT_REPORT_LIMIT: u32 = 10;
const MAX_REPORT_LIMIT: u32 = 100;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/crime-reports`
///
/// Stores a report and notifies responders.
pub async fn create_report(
    state: web::Data<AppState>,
    body: web::Json<CrimeReportRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();

    let incident_time = body
        .incident_time
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_client_time)
        .transpose()
        .map_err(|_| ApiError::BadRequest("Invalid incident time".to_string()))?;

    let submission = report::submit_report(
        state.db.as_ref(),
        state.selector.as_ref(),
        ReportInput {
            reporter_id: body.reporter_id,
            crime_type: body.crime_type,
            severity: body.severity,
            description: body.description,
            location_address: body.location_address,
            location: Coordinates::new(body.latitude, body.longitude),
            incident_time,
            is_ongoing: body.is_ongoing,
            is_anonymous: body.is_anonymous,
            contact_number: body.contact_number,
            evidence_urls: body.evidence_urls,
        },
    )
    .await
    .map_err(|e| ApiError::from_dispatch(e, "Failed to submit crime report"))?;

    Ok(HttpResponse::Ok().json(ReportSubmitted {
        message: "Crime report submitted successfully".to_string(),
        report_id: submission.report.id,
    }))
}

/// `GET /api/crime-reports`
///
/// Lists reports newest first with reporter and responder names.
pub async fn list_reports(
    state: web::Data<AppState>,
    params: web::Query<ReportListParams>,
) -> Result<HttpResponse, ApiError> {
    let query = ReportQuery {
        status: params.status,
        limit: params
            .limit
            .unwrap_or(DEFAULT_REPORT_LIMIT)
            .clamp(1, MAX_REPORT_LIMIT),
    };

    let rows = queries::list_crime_reports(state.db.as_ref(), &query)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch crime reports: {e}");
            ApiError::BadRequest("Failed to fetch crime reports".to_string())
        })?;

    Ok(HttpResponse::Ok().json(ReportList {
        reports: rows.into_iter().map(ApiCrimeReport::from).collect(),
    }))
}

/// `GET /api/crime-reports/{id}`
pub async fn get_report(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let row = queries::get_crime_report_with_responses(state.db.as_ref(), &id)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch crime report {id}: {e}");
            ApiError::BadRequest("Failed to fetch crime report".to_string())
        })?
        .ok_or_else(|| ApiError::NotFound("Crime report not found".to_string()))?;

    Ok(HttpResponse::Ok().json(ReportDetail {
        report: ApiCrimeReport::from(row),
    }))
}

/// `POST /api/vigilante-response`
///
/// Applies a responder's status change.
pub async fn update_response(
    state: web::Data<AppState>,
    body: web::Json<ResponseUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();

    let row = response::update_response(
        state.db.as_ref(),
        &ResponseUpdate {
            crime_report_id: body.crime_report_id,
            vigilante_id: body.vigilante_id,
            status: body.status,
            notes: body.notes,
        },
    )
    .await
    .map_err(|e| ApiError::from_dispatch(e, "Failed to update response"))?;

    Ok(HttpResponse::Ok().json(ResponseUpdated {
        message: "Response updated successfully".to_string(),
        response: ApiVigilanteResponse::from(row),
    }))
}

/// `POST /api/sos`
pub async fn create_sos(
    state: web::Data<AppState>,
    body: web::Json<SosRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();

    let outcome = sos::raise_sos(
        state.db.as_ref(),
        &NewSosAlert {
            user_id: body.user_id,
            location: Coordinates::new(body.latitude, body.longitude),
            alert_type: body.alert_type.unwrap_or(SosAlertType::General),
            message: body.message,
        },
    )
    .await
    .map_err(|e| ApiError::from_dispatch(e, "Failed to create SOS alert"))?;

    Ok(HttpResponse::Ok().json(SosCreated {
        message: "SOS alert created successfully".to_string(),
        alert_id: outcome.alert.id,
        nearby_responders: outcome.nearby_responders,
    }))
}

/// `POST /api/auth/register`
///
/// Signs the account up with the identity provider and stores the profile
/// under the provider's user id.
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();

    let user = sign_up(
        state.identity.as_ref(),
        state.db.as_ref(),
        Registration {
            id: None,
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            password: body.password,
            phone: body.phone,
            user_type: body.user_type,
            address: body.address,
        },
    )
    .await
    .map_err(|err| match err {
        SessionError::Auth(e) => ApiError::BadRequest(e.user_message()),
        SessionError::Dispatch(e) => ApiError::from_dispatch(e, "Failed to create account"),
        SessionError::Database(_) => session_failure(err),
    })?;

    Ok(HttpResponse::Ok().json(Registered {
        message: "Account created successfully".to_string(),
        user: ApiUser::from(user),
    }))
}

/// `POST /api/auth/login`
///
/// Rejected credentials answer 401 with the same body shape as success.
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let mut ctx = SessionContext::new();

    let outcome = ctx
        .login(
            state.identity.as_ref(),
            state.db.as_ref(),
            &body.email,
            &body.password,
        )
        .await
        .map_err(session_failure)?;

    let result = LoginResult {
        success: outcome.success,
        message: outcome.message,
        user_type: outcome.user_type,
        user_id: outcome.user_id,
        access_token: outcome.access_token,
    };

    if result.success {
        Ok(HttpResponse::Ok().json(result))
    } else {
        Ok(HttpResponse::Unauthorized().json(result))
    }
}

/// `GET /api/auth/session`
///
/// Restores the session for the request's bearer token.
pub async fn session(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let mut ctx = SessionContext::new();

    let outcome = ctx
        .restore(
            state.identity.as_ref(),
            state.db.as_ref(),
            bearer_token(&req),
        )
        .await
        .map_err(session_failure)?;

    let body = match outcome {
        RestoreOutcome::Restored => SessionState {
            authenticated: ctx.is_authenticated(),
            user: ctx.user().cloned().map(ApiUser::from),
            redirect: None,
        },
        RestoreOutcome::RedirectToLogin => SessionState {
            authenticated: false,
            user: None,
            redirect: Some(Navigation::Login.path().to_string()),
        },
        RestoreOutcome::Anonymous => SessionState {
            authenticated: false,
            user: None,
            redirect: None,
        },
    };

    Ok(HttpResponse::Ok().json(body))
}

/// `POST /api/auth/logout`
pub async fn logout(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let mut ctx =
        bearer_token(&req).map_or_else(SessionContext::new, SessionContext::from_access_token);

    let navigation = ctx
        .logout(state.identity.as_ref())
        .await
        .map_err(|_| ApiError::BadRequest("Failed to log out".to_string()))?;

    Ok(HttpResponse::Ok().json(LoggedOut {
        message: "Logged out successfully".to_string(),
        redirect: navigation.path().to_string(),
    }))
}

/// `POST /api/auth/forgot-password`
pub async fn forgot_password(
    state: web::Data<AppState>,
    body: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    let email = body.email.trim();
    if email.is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }

    let reset = request_password_reset(state.identity.as_ref(), email).await;
    let result = ForgotPasswordResult {
        success: reset.success,
        message: reset.message,
    };

    if result.success {
        Ok(HttpResponse::Ok().json(result))
    } else {
        Ok(HttpResponse::BadRequest().json(result))
    }
}

/// `POST /api/auth/reset-password`
///
/// Sets a new password for the bearer token's user.
pub async fn reset_password(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    if body.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }
    let Some(token) = bearer_token(&req) else {
        return Err(ApiError::Unauthorized("Auth session missing!".to_string()));
    };

    let update = SessionContext::from_access_token(token)
        .update_password(state.identity.as_ref(), &body.password)
        .await;
    let result = ResetPasswordResult {
        success: update.success,
        message: update.message,
    };

    if result.success {
        Ok(HttpResponse::Ok().json(result))
    } else {
        Ok(HttpResponse::BadRequest().json(result))
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn session_failure(err: SessionError) -> ApiError {
    log::error!("Session operation failed: {err}");
    ApiError::Internal
}
