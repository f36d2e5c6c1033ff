use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::WithRejection;
use tracing::error;

use crate::application::ProposalService;
use crate::domain::{NewProposal, Proposal};
use crate::web::error::{ApiError, ErrorResponse};

#[derive(Clone)]
pub struct AppState {
    pub proposals: ProposalService,
}

impl AppState {
    pub fn new(proposals: ProposalService) -> Self {
        Self { proposals }
    }
}

pub async fn root() -> &'static str {
    "Hello World!"
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// Submit a new proposal.
#[utoipa::path(
    post,
    path = "/api/proposals",
    tag = "proposals",
    request_body = NewProposal,
    responses(
        (status = 201, description = "Proposal created", body = Proposal),
        (status = 400, description = "Malformed JSON body", body = ErrorResponse),
        (status = 415, description = "Body is not JSON", body = ErrorResponse),
        (status = 422, description = "Body has the wrong field types", body = ErrorResponse),
        (status = 429, description = "Too many requests from this client", body = String),
        (status = 500, description = "Store failure, including a missing name", body = String)
    )
)]
pub async fn create_proposal(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<NewProposal>, ApiError>,
) -> Result<(StatusCode, Json<Proposal>), ApiError> {
    let proposal = state
        .proposals
        .submit(payload)
        .await
        .inspect_err(|e| error!(error = %e, "Failed to create proposal"))?;

    Ok((StatusCode::CREATED, Json(proposal)))
}

/// List every stored proposal in ascending id order.
#[utoipa::path(
    get,
    path = "/api/proposals",
    tag = "proposals",
    responses(
        (status = 200, description = "All proposals, possibly empty", body = [Proposal]),
        (status = 429, description = "Too many requests from this client", body = String),
        (status = 500, description = "Store failure", body = String)
    )
)]
pub async fn list_proposals(
    State(state): State<AppState>,
) -> Result<Json<Vec<Proposal>>, ApiError> {
    let proposals = state
        .proposals
        .list()
        .await
        .inspect_err(|e| error!(error = %e, "Failed to list proposals"))?;

    Ok(Json(proposals))
}
