use crate::db_types::Interview;
use crate::error::AppError;
use crate::pin::PinGenerator;
use crate::request::parse_request;
use crate::store::InterviewStore;
use crate::types::{AppState, ApplicantId, PinRequest, PinResponse};

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(issue_pin))
        .route("/health", get(|| async { "ok" }))
        .with_state(app_state)
}

/// Return the applicant's interview pin, creating the interview on first request.
pub async fn issue_pin(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PinResponse>, AppError> {
    let request = parse_request(&body)?;
    debug!(organization_id = request.organization_id, applicant_id = %request.applicant_id, "pin request");

    let pin = match app_state.store_timeout {
        Some(limit) => tokio::time::timeout(limit, resolve_pin(&app_state, &request))
            .await
            .map_err(|_| AppError::Timeout(limit))??,
        None => resolve_pin(&app_state, &request).await?,
    };

    Ok(Json(PinResponse { pin }))
}

async fn resolve_pin(app_state: &AppState, request: &PinRequest) -> Result<String, AppError> {
    let store = app_state.store.as_ref();
    let interview = store.get_interview(&request.applicant_id).await?;
    let organization = store.get_organization(request.organization_id).await?;

    // Existing interviews are matched by applicant alone, whatever organization was sent.
    if let Some(interview) = interview {
        debug!(interview_id = interview.id, "found existing interview");
        return Ok(interview.pin);
    }

    let organization =
        organization.ok_or(AppError::OrganizationNotFound(request.organization_id))?;
    let interview = create_interview(
        store,
        &app_state.pin_generator,
        organization.id,
        &request.applicant_id,
    )
    .await?;

    Ok(interview.pin)
}

/// Allocate a pin unique within the organization's scope and persist a new interview with it.
///
/// The read of existing pins and the insert are not atomic: two concurrent calls for the same
/// scope can pick the same pin.
pub async fn create_interview(
    store: &dyn InterviewStore,
    pin_generator: &PinGenerator,
    organization_id: i64,
    applicant_id: &ApplicantId,
) -> Result<Interview, AppError> {
    let existing_pins: HashSet<String> = store
        .scope_pins(organization_id)
        .await?
        .into_iter()
        .collect();
    let pin = pin_generator.generate(&existing_pins)?;
    let interview = store
        .insert_interview(organization_id, applicant_id, &pin)
        .await?;
    info!(
        interview_id = interview.id,
        organization_id,
        applicant_id = %applicant_id,
        "created interview"
    );

    Ok(interview)
}
